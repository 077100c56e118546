//! Provider subsystem for model inference backends.
//!
//! Each provider implements the [`Provider`] trait defined in [`traits`] and
//! is created through [`create_provider`] by its canonical string key. The
//! only backend currently wired in is `"anthropic"` (the Messages API with
//! SSE streaming); credential resolution falls back from the explicit config
//! value to `ANTHROPIC_API_KEY`, then `SKILLET_API_KEY`/`API_KEY`.

pub mod anthropic;
pub mod traits;

pub use anthropic::AnthropicProvider;
pub use traits::{
    ChatMessage, Provider, StreamChunk, StreamError, StreamOptions, StreamResult,
};

/// Resolve the API credential from the explicit config value, then the
/// environment.
fn resolve_credential(credential_override: Option<&str>) -> Option<String> {
    if let Some(raw_override) = credential_override {
        let trimmed = raw_override.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_owned());
        }
    }

    for env_var in ["ANTHROPIC_API_KEY", "SKILLET_API_KEY", "API_KEY"] {
        if let Ok(value) = std::env::var(env_var) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Whether a credential can be resolved, without exposing its value.
pub fn has_credential(credential_override: Option<&str>) -> bool {
    resolve_credential(credential_override).is_some()
}

/// Factory: create the right provider from config.
pub fn create_provider(
    name: &str,
    api_key: Option<&str>,
    api_url: Option<&str>,
) -> anyhow::Result<Box<dyn Provider>> {
    create_provider_with_max_tokens(name, api_key, api_url, None)
}

/// Factory variant that also sets the provider's response token budget,
/// used when the model catalog carries a per-model limit.
pub fn create_provider_with_max_tokens(
    name: &str,
    api_key: Option<&str>,
    api_url: Option<&str>,
    max_tokens: Option<u32>,
) -> anyhow::Result<Box<dyn Provider>> {
    let resolved_credential = resolve_credential(api_key);
    let key = resolved_credential.as_deref();
    match name {
        "anthropic" => {
            let mut provider = AnthropicProvider::with_base_url(key, api_url);
            if let Some(limit) = max_tokens {
                provider = provider.with_max_tokens(limit);
            }
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("Unknown provider: {other}. Supported: anthropic"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_anthropic_provider() {
        assert!(create_provider("anthropic", Some("provider-test-credential"), None).is_ok());
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let err = create_provider("carrier-pigeon", None, None).unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn factory_accepts_token_budget() {
        let provider = create_provider_with_max_tokens(
            "anthropic",
            Some("provider-test-credential"),
            None,
            Some(2048),
        );
        assert!(provider.is_ok());
    }

    #[test]
    fn explicit_credential_wins_over_environment() {
        std::env::set_var("ANTHROPIC_API_KEY", "env-credential");
        let resolved = resolve_credential(Some("explicit-credential"));
        assert_eq!(resolved.as_deref(), Some("explicit-credential"));
        std::env::remove_var("ANTHROPIC_API_KEY");
    }

    #[test]
    fn blank_override_falls_through() {
        assert_eq!(resolve_credential(Some("   ")), resolve_credential(None));
    }
}
