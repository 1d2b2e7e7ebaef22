//! Output nodes
//!
//! Nodes that display or export results.

mod text_output;

pub use text_output::TextOutputProcessor;
