//! Control flow nodes
//!
//! Gateways are ordinary processors whose output carries a
//! [`ControlSignal`](flowdrop_engine::ControlSignal). The orchestrator uses
//! it to decide which trigger edges are active; branch names are the
//! source handles of those edges (`"true"`, `"false"`, or a configured
//! gateway branch name).

mod boolean_gateway;
mod compare;
mod conditional;
mod gateway;
mod if_else;

pub use boolean_gateway::BooleanGatewayProcessor;
pub use compare::Operator;
pub use conditional::ConditionalProcessor;
pub use gateway::{BranchCondition, GatewayProcessor, MatchMode};
pub use if_else::IfElseProcessor;
