//! Body templating subsystem.
//!
//! # Data Flow
//! ```text
//! startup:  destination sources → compiler.rs → TemplateChain (names)
//!                                            → TemplateSet (shared environment)
//!
//! request:  EventContext (context.rs)
//!             → renderer.rs folds the chain step by step
//!             → RenderedChain (last output = outbound body)
//! ```
//!
//! # Design Decisions
//! - All templates compile into one environment, frozen before traffic starts
//! - Undefined variables are errors, never empty strings
//! - Helpers never touch the network or the disk

pub mod compiler;
pub mod context;
pub mod helpers;
pub mod renderer;

pub use compiler::{CompileError, TemplateChain, TemplateChainCompiler, TemplateSet};
pub use context::{EventContext, Multimap};
pub use renderer::{RenderError, RenderedChain, RequestRenderer};
