use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;

use crate::parser::ParamSet;

use super::traits::{ArgumentError, Utensil};

/// Checks that a configuration snippet or file parses cleanly.
///
/// Validates the formats this crate already parses natively: `json` and
/// `toml`. Exactly one of `code` and `file_path` must be given; for files the
/// language is inferred from the extension unless passed explicitly.
pub struct ValidateSyntaxUtensil {}

impl ValidateSyntaxUtensil {
    pub fn new() -> Self {
        Self {}
    }
}

fn infer_language(path: &str) -> Option<&'static str> {
    match Path::new(path).extension()?.to_str()? {
        "json" => Some("json"),
        "toml" => Some("toml"),
        _ => None,
    }
}

fn check(source: &str, language: &str) -> String {
    let outcome = match language {
        "json" => serde_json::from_str::<serde_json::Value>(source)
            .map(|_| ())
            .map_err(|e| e.to_string()),
        "toml" => toml::from_str::<toml::Value>(source)
            .map(|_| ())
            .map_err(|e| e.to_string()),
        other => {
            return format!("Error: unsupported language '{other}' (expected json or toml)");
        }
    };

    match outcome {
        Ok(()) => format!("✓ Syntax is valid ({language})"),
        Err(detail) => format!("✗ Syntax error ({language}): {detail}"),
    }
}

#[async_trait]
impl Utensil for ValidateSyntaxUtensil {
    fn name(&self) -> &str {
        "validate_syntax"
    }

    fn description(&self) -> &str {
        "Check that JSON or TOML source parses cleanly."
    }

    fn parameters(&self) -> &[&str] {
        &["code", "file_path", "language"]
    }

    async fn execute(&self, params: &ParamSet) -> Result<String, ArgumentError> {
        let code = params.get("code");
        let file_path = params.get("file_path");

        let (source, language) = match (code, file_path) {
            (Some(_), Some(_)) => {
                return Ok("Error: provide either 'code' or 'file_path', not both".to_string());
            }
            (None, None) => {
                return Ok("Error: must provide 'code' or 'file_path'".to_string());
            }
            (Some(code), None) => {
                let Some(language) = params.get("language") else {
                    return Ok(
                        "Error: must provide 'language' (json or toml) when validating a code snippet"
                            .to_string(),
                    );
                };
                (code.to_string(), language.to_string())
            }
            (None, Some(path)) => {
                let language = match params.get("language").or_else(|| infer_language(path)) {
                    Some(language) => language.to_string(),
                    None => {
                        return Ok(format!(
                            "Error: cannot infer language from '{path}'; pass language=json or language=toml"
                        ));
                    }
                };
                let source = match tokio::fs::read_to_string(path).await {
                    Ok(source) => source,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        return Ok(format!("Error: File not found at path '{path}'"));
                    }
                    Err(e) => return Ok(format!("Error reading file: {e}")),
                };
                (source, language)
            }
        };

        Ok(check(&source, &language))
    }
}
