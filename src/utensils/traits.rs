//! The utensil capability trait and its argument contract.

use async_trait::async_trait;
use thiserror::Error;

use crate::parser::ParamSet;

/// Parameter-shape violation raised by a utensil before it does any work.
///
/// Runtime failures (missing files, failing commands) are not errors at this
/// level: utensils report those as ordinary result strings so the model can
/// read them and adjust its next call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("missing required parameter '{0}'")]
    Missing(&'static str),
}

/// Looks up a parameter a utensil cannot run without.
pub fn required<'a>(params: &'a ParamSet, key: &'static str) -> Result<&'a str, ArgumentError> {
    params.get(key).ok_or(ArgumentError::Missing(key))
}

/// One capability the model can invoke through the utensil wire format.
#[async_trait]
pub trait Utensil: Send + Sync {
    /// Wire name, as written after `UTENSIL:`.
    fn name(&self) -> &str;

    /// One-line description shown in the system prompt.
    fn description(&self) -> &str;

    /// Parameter names in documentation order.
    fn parameters(&self) -> &[&str];

    /// Runs the utensil. `Err` means the parameters were unusable; every
    /// runtime outcome, success or failure, comes back as the `Ok` string.
    async fn execute(&self, params: &ParamSet) -> Result<String, ArgumentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_finds_present_key() {
        let mut params = ParamSet::new();
        params.insert("file_path", "a.txt");
        assert_eq!(required(&params, "file_path"), Ok("a.txt"));
    }

    #[test]
    fn required_reports_missing_key_by_name() {
        let params = ParamSet::new();
        let err = required(&params, "command").unwrap_err();
        assert_eq!(err.to_string(), "missing required parameter 'command'");
    }
}
