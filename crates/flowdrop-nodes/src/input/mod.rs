//! Input nodes
//!
//! Nodes that start a flow from user input or the run's initial data.

mod manual_trigger;
mod text_input;

pub use manual_trigger::ManualTriggerProcessor;
pub use text_input::TextInputProcessor;
