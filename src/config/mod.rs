pub mod schema;

pub use schema::{
    resolve_config_path, AgentConfig, Config, ModelInfo, ObservabilityConfig, DEFAULT_MODEL,
};
