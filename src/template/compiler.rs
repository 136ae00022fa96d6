//! Template chain compilation.
//!
//! # Responsibilities
//! - Own the single template environment shared by every destination
//! - Register helper functions and evaluation settings once
//! - Parse each destination's sources eagerly so syntax errors stop startup

use minijinja::{AutoEscape, Environment, UndefinedBehavior};

use crate::template::helpers;
use crate::template::renderer::RequestRenderer;

/// A template source failed to parse.
#[derive(Debug, thiserror::Error)]
#[error("destination {destination}: body template {index} does not compile: {source}")]
pub struct CompileError {
    pub destination: String,
    pub index: usize,
    #[source]
    pub source: minijinja::Error,
}

/// Ordered, compiled body templates of one destination.
///
/// Holds only the names of the compiled templates; the templates themselves
/// live in the [`TemplateSet`] that compiled them.
#[derive(Debug, Clone, Default)]
pub struct TemplateChain {
    destination: String,
    steps: Vec<String>,
}

impl TemplateChain {
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub(crate) fn steps(&self) -> &[String] {
        &self.steps
    }
}

/// Compiles template chains into one shared environment.
pub struct TemplateChainCompiler {
    env: Environment<'static>,
    compiled: usize,
}

impl TemplateChainCompiler {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        helpers::register(&mut env);
        Self { env, compiled: 0 }
    }

    /// Compile `sources` for `destination`, in declaration order.
    pub fn compile(&mut self, destination: &str, sources: &[String]) -> Result<TemplateChain, CompileError> {
        let mut steps = Vec::with_capacity(sources.len());

        for (index, text) in sources.iter().enumerate() {
            let name = format!("{}-body-{}", destination, index);
            self.env
                .add_template_owned(name.clone(), text.clone())
                .map_err(|source| CompileError {
                    destination: destination.to_string(),
                    index,
                    source,
                })?;
            steps.push(name);
        }
        self.compiled += steps.len();

        tracing::debug!(destination = %destination, templates = steps.len(), "Template chain compiled");

        Ok(TemplateChain {
            destination: destination.to_string(),
            steps,
        })
    }

    /// Freeze the environment; no more chains can be added.
    pub fn finish(self) -> TemplateSet {
        TemplateSet {
            env: self.env,
            compiled: self.compiled,
        }
    }
}

impl Default for TemplateChainCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable set of every compiled template.
pub struct TemplateSet {
    env: Environment<'static>,
    compiled: usize,
}

impl TemplateSet {
    pub fn renderer(&self) -> RequestRenderer<'_> {
        RequestRenderer::new(&self.env)
    }
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSet")
            .field("templates", &self.compiled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_in_order() {
        let mut compiler = TemplateChainCompiler::new();
        let chain = compiler
            .compile("d1", &["{{ body.msg }}".into(), "x{{ executedTemplates[0] }}".into()])
            .unwrap();

        assert_eq!(chain.destination(), "d1");
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.steps(), ["d1-body-0", "d1-body-1"]);
    }

    #[test]
    fn test_empty_chain() {
        let mut compiler = TemplateChainCompiler::new();
        let chain = compiler.compile("none", &[]).unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_syntax_error_reports_index() {
        let mut compiler = TemplateChainCompiler::new();
        let err = compiler
            .compile("broken", &["ok".into(), "fine".into(), "{{ body.msg".into()])
            .unwrap_err();

        assert_eq!(err.destination, "broken");
        assert_eq!(err.index, 2);
        assert!(err.to_string().contains("body template 2"));
    }
}
