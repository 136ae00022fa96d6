//! Body rendering.
//!
//! A chain is evaluated as a fold: step `i` sees the event plus the outputs
//! of steps `0..i` as `executedTemplates`, and its own output is appended
//! before step `i + 1` runs. The body is the last step's output.

use minijinja::Environment;

use crate::template::compiler::TemplateChain;
use crate::template::context::{EventContext, TemplateScope};

/// A template step failed to evaluate.
#[derive(Debug, thiserror::Error)]
#[error("destination {destination}: body template {index} failed: {source}")]
pub struct RenderError {
    pub destination: String,
    pub index: usize,
    #[source]
    pub source: minijinja::Error,
}

/// Every step output of one chain evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedChain {
    outputs: Vec<String>,
}

impl RenderedChain {
    /// Output of each step, in evaluation order.
    pub fn steps(&self) -> &[String] {
        &self.outputs
    }

    /// The request body, absent for an empty chain.
    pub fn body(&self) -> Option<&str> {
        self.outputs.last().map(String::as_str)
    }

    pub fn into_body(mut self) -> Option<String> {
        self.outputs.pop()
    }
}

/// Evaluates compiled chains against inbound events.
#[derive(Clone, Copy)]
pub struct RequestRenderer<'a> {
    env: &'a Environment<'static>,
}

impl<'a> RequestRenderer<'a> {
    pub(crate) fn new(env: &'a Environment<'static>) -> Self {
        Self { env }
    }

    pub fn render(&self, chain: &TemplateChain, event: &EventContext) -> Result<RenderedChain, RenderError> {
        let outputs = chain.steps().iter().enumerate().try_fold(
            Vec::with_capacity(chain.len()),
            |mut executed, (index, name)| {
                let output = self
                    .env
                    .get_template(name)
                    .and_then(|template| template.render(TemplateScope::new(event, &executed)))
                    .map_err(|source| RenderError {
                        destination: chain.destination().to_string(),
                        index,
                        source,
                    })?;
                executed.push(output);
                Ok::<_, RenderError>(executed)
            },
        )?;

        Ok(RenderedChain { outputs })
    }
}
