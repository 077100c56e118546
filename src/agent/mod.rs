//! The conversation loop between the provider and the utensil registry.

#[allow(clippy::module_inception)]
pub mod agent;

pub use agent::{Agent, AgentBuilder};
