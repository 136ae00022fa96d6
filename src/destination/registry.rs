//! Destination registry.
//!
//! # Responsibilities
//! - Turn validated destination configs into immutable [`Destination`]s
//! - Compile every body template chain before traffic starts
//! - Provide ordered, lock-free read access for the dispatcher
//!
//! # Design Decisions
//! - Built exactly once; there is no mutation API
//! - Iteration order is destination name order, which keeps logs and
//!   dispatch behavior reproducible

use std::collections::BTreeMap;

use crate::config::{DestinationConfig, HeaderValues};
use crate::destination::credentials::BasicAuth;
use crate::template::{CompileError, RequestRenderer, TemplateChain, TemplateChainCompiler, TemplateSet};

/// One configured remote HTTP target.
#[derive(Debug, Clone)]
pub struct Destination {
    /// Unique name, used for diagnostics.
    pub name: String,
    pub method: String,
    pub url: String,
    /// Static headers appended to every outbound request.
    pub headers: HeaderValues,
    pub auth: Option<BasicAuth>,
    /// Compiled body templates (empty: no body).
    pub chain: TemplateChain,
}

/// Compiled, read-only set of destinations.
#[derive(Debug)]
pub struct DestinationRegistry {
    destinations: Vec<Destination>,
    templates: TemplateSet,
}

impl DestinationRegistry {
    /// Compile every destination; the first uncompilable template aborts.
    pub fn from_config(configs: &BTreeMap<String, DestinationConfig>) -> Result<Self, CompileError> {
        let mut compiler = TemplateChainCompiler::new();
        let mut destinations = Vec::with_capacity(configs.len());

        for (name, config) in configs {
            let chain = compiler.compile(name, config.templates())?;
            let auth = config
                .auth
                .as_ref()
                .and_then(|auth| auth.basic.as_ref())
                .map(BasicAuth::from);

            destinations.push(Destination {
                name: name.clone(),
                method: config.method.clone(),
                url: config.url.clone(),
                headers: config.headers.clone(),
                auth,
                chain,
            });
        }

        tracing::info!(destinations = destinations.len(), "Destination registry built");

        Ok(Self {
            destinations,
            templates: compiler.finish(),
        })
    }

    /// A registry with no destinations.
    pub fn empty() -> Self {
        Self {
            destinations: Vec::new(),
            templates: TemplateChainCompiler::new().finish(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Destination> {
        self.destinations
            .binary_search_by(|destination| destination.name.as_str().cmp(name))
            .ok()
            .map(|index| &self.destinations[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Destination> {
        self.destinations.iter()
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    /// Renderer bound to the registry's compiled templates.
    pub fn renderer(&self) -> RequestRenderer<'_> {
        self.templates.renderer()
    }
}
