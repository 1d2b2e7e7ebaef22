//! AI nodes

mod chat_model;

pub use chat_model::ChatModelProcessor;
