//! FlowDrop Nodes
//!
//! Built-in node processors for the FlowDrop engine.
//! Each processor implements one node type and is registered under its
//! type string by [`register_builtins`].
//!
//! # Categories
//!
//! - **Input**: Nodes that start a flow from user input
//! - **Output**: Nodes that display results
//! - **Processing**: Text and arithmetic transforms
//! - **Control**: Gateways that select downstream branches
//! - **HTTP**: Outbound requests, webhooks and page fetches
//! - **AI**: Chat model calls

pub mod ai;
pub mod config;
pub mod control;
pub mod http;
pub mod input;
pub mod output;
pub mod processing;
pub mod setup;

mod fields;

pub use ai::*;
pub use config::{ChatModelDefaults, HttpDefaults, NodesConfig};
pub use control::*;
pub use http::{HttpClient, HttpError, HttpRequest, HttpResponse, MockHttpClient, ReqwestHttpClient};
pub use input::*;
pub use output::*;
pub use processing::*;
pub use setup::{builtin_registry, register_builtins, register_builtins_with_client};
