use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Model used when the config names none.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Fallback `max_tokens` for models absent from the catalog.
const FALLBACK_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path the config was loaded from. Computed, never serialized.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// API key. Env overrides win; see [`Config::apply_env_overrides`].
    pub api_key: Option<String>,

    /// Base URL override for the provider API.
    pub api_url: Option<String>,

    pub default_model: Option<String>,

    pub default_temperature: f64,

    pub agent: AgentConfig,

    pub observability: ObservabilityConfig,

    /// Model catalog keyed by model id. Filled with a stock catalog when the
    /// config file has no `[models]` tables.
    pub models: BTreeMap<String, ModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Hard cap on provider round-trips per task.
    pub max_turns: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_turns: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// "none" | "log"
    pub backend: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            backend: "none".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    pub display_name: String,
    pub max_tokens: u32,
    pub description: String,
}

fn stock_model_catalog() -> BTreeMap<String, ModelInfo> {
    BTreeMap::from([
        (
            "claude-sonnet-4-5-20250929".to_string(),
            ModelInfo {
                display_name: "Claude Sonnet 4.5".to_string(),
                max_tokens: 8192,
                description: "Most capable model, best for complex tasks".to_string(),
            },
        ),
        (
            "claude-haiku-4-5-20251001".to_string(),
            ModelInfo {
                display_name: "Claude Haiku 4.5".to_string(),
                max_tokens: 8192,
                description: "Faster and more cost-effective, good for simpler tasks"
                    .to_string(),
            },
        ),
    ])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            api_key: None,
            api_url: None,
            default_model: Some(DEFAULT_MODEL.to_string()),
            default_temperature: 0.7,
            agent: AgentConfig::default(),
            observability: ObservabilityConfig::default(),
            models: stock_model_catalog(),
        }
    }
}

fn default_config_dir() -> Result<PathBuf> {
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .context("Could not find home directory")?;
    Ok(home.join(".skillet"))
}

/// Resolve the config file location: `SKILLET_CONFIG_DIR` env, then
/// `./config.toml` if present, then `~/.skillet/config.toml`.
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SKILLET_CONFIG_DIR") {
        let dir = dir.trim();
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir).join("config.toml"));
        }
    }

    let local = PathBuf::from("config.toml");
    if local.exists() {
        return Ok(local);
    }

    Ok(default_config_dir()?.join("config.toml"))
}

impl Config {
    pub async fn load_or_init() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_or_init_at(&config_path).await
    }

    /// Load the file at `config_path`, or write a default one if it does not
    /// exist yet. Env overrides and validation run in both paths.
    pub async fn load_or_init_at(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .await
                .context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = config_path.to_path_buf();
            config.apply_env_overrides();
            config.validate()?;
            tracing::info!(
                path = %config.config_path.display(),
                initialized = false,
                "Config loaded"
            );
            Ok(config)
        } else {
            let mut config = Config::default();
            config.config_path = config_path.to_path_buf();
            config.save().await?;
            config.apply_env_overrides();
            config.validate()?;
            tracing::info!(
                path = %config.config_path.display(),
                initialized = true,
                "Config loaded"
            );
            Ok(config)
        }
    }

    pub async fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let parent_dir = self
            .config_path
            .parent()
            .context("Config path must have a parent directory")?;
        if !parent_dir.as_os_str().is_empty() {
            fs::create_dir_all(parent_dir).await.with_context(|| {
                format!(
                    "Failed to create config directory: {}",
                    parent_dir.display()
                )
            })?;
        }

        fs::write(&self.config_path, toml_str)
            .await
            .context("Failed to write config file")?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        // API key: SKILLET_API_KEY, ANTHROPIC_API_KEY, or API_KEY (generic)
        if let Ok(key) = std::env::var("SKILLET_API_KEY")
            .or_else(|_| std::env::var("ANTHROPIC_API_KEY"))
            .or_else(|_| std::env::var("API_KEY"))
        {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }

        // Model: SKILLET_MODEL
        if let Ok(model) = std::env::var("SKILLET_MODEL") {
            if !model.is_empty() {
                self.default_model = Some(model);
            }
        }
    }

    /// Validate values that would otherwise fail at arbitrary runtime points.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            anyhow::bail!(
                "default_temperature must be between 0.0 and 2.0 (got {})",
                self.default_temperature
            );
        }
        if self.agent.max_turns == 0 {
            anyhow::bail!("agent.max_turns must be greater than 0");
        }
        match self.observability.backend.as_str() {
            "none" | "log" => {}
            other => anyhow::bail!(
                "observability.backend must be \"none\" or \"log\" (got \"{other}\")"
            ),
        }
        Ok(())
    }

    /// Model to use: configured default, or the stock default.
    pub fn resolved_model(&self) -> String {
        self.default_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn model_info(&self, model: &str) -> Option<&ModelInfo> {
        self.models.get(model)
    }

    pub fn max_tokens_for(&self, model: &str) -> u32 {
        self.model_info(model)
            .map_or(FALLBACK_MAX_TOKENS, |info| info.max_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_sane() {
        let config = Config::default();
        assert_eq!(config.default_model.as_deref(), Some(DEFAULT_MODEL));
        assert!((config.default_temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.agent.max_turns, 20);
        assert_eq!(config.observability.backend, "none");
        assert!(config.models.contains_key(DEFAULT_MODEL));
        config.validate().unwrap();
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("default_model = \"claude-test\"\n").unwrap();
        assert_eq!(config.default_model.as_deref(), Some("claude-test"));
        assert_eq!(config.agent.max_turns, 20);
        assert!(
            !config.models.is_empty(),
            "missing [models] should fall back to the stock catalog"
        );
    }

    #[test]
    fn explicit_models_table_replaces_stock_catalog() {
        let config: Config = toml::from_str(
            r#"
[models.my-model]
display_name = "My Model"
max_tokens = 1024
description = "Local test model"
"#,
        )
        .unwrap();
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.max_tokens_for("my-model"), 1024);
    }

    #[test]
    fn max_tokens_falls_back_for_unknown_models() {
        let config = Config::default();
        assert_eq!(config.max_tokens_for(DEFAULT_MODEL), 8192);
        assert_eq!(config.max_tokens_for("claude-imaginary"), 4096);
    }

    #[test]
    fn resolved_model_prefers_configured_default() {
        let mut config = Config::default();
        config.default_model = Some("claude-custom".to_string());
        assert_eq!(config.resolved_model(), "claude-custom");

        config.default_model = None;
        assert_eq!(config.resolved_model(), DEFAULT_MODEL);
    }

    #[test]
    fn validate_rejects_out_of_range_temperature() {
        let mut config = Config::default();
        config.default_temperature = 2.5;
        assert!(config.validate().is_err());

        config.default_temperature = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_turns() {
        let mut config = Config::default();
        config.agent.max_turns = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_observability_backend() {
        let mut config = Config::default();
        config.observability.backend = "prometheus".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("observability.backend"));
    }

    #[tokio::test]
    async fn load_or_init_writes_default_file_on_first_run() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        let config = Config::load_or_init_at(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.config_path, path);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("default_temperature"));
        assert!(written.contains("[agent]"));
        assert!(written.contains("[models."));
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        let mut config = Config::default();
        config.config_path = path.clone();
        config.api_url = Some("https://api.example.com".to_string());
        config.agent.max_turns = 7;
        config.save().await.unwrap();

        let loaded = Config::load_or_init_at(&path).await.unwrap();
        assert_eq!(loaded.api_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(loaded.agent.max_turns, 7);
    }

    #[tokio::test]
    async fn malformed_config_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "default_temperature = \"warm\"\n").unwrap();

        let err = Config::load_or_init_at(&path).await.unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn env_model_override_wins() {
        std::env::set_var("SKILLET_MODEL", "claude-from-env");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.default_model.as_deref(), Some("claude-from-env"));
        std::env::remove_var("SKILLET_MODEL");
    }
}
