use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

use crate::parser::ParamSet;

use super::traits::{required, ArgumentError, Utensil};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs a shell command in the current working directory.
pub struct ShellUtensil {
    timeout: Duration,
}

impl ShellUtensil {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the kill timeout; the wire default is 30 seconds.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Utensil for ShellUtensil {
    fn name(&self) -> &str {
        "execute_command"
    }

    fn description(&self) -> &str {
        "Run a shell command and return its output."
    }

    fn parameters(&self) -> &[&str] {
        &["command"]
    }

    async fn execute(&self, params: &ParamSet) -> Result<String, ArgumentError> {
        let command = required(params, "command")?;

        // kill_on_drop so a timed-out child does not outlive the call.
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Ok(format!("Error executing command: {e}")),
            Err(_) => {
                return Ok(format!(
                    "Error: Command timed out after {} seconds",
                    self.timeout.as_secs()
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        let mut parts = Vec::new();
        if !stdout.is_empty() {
            parts.push(stdout.into_owned());
        }
        if !stderr.is_empty() {
            parts.push(format!("STDERR:\n{stderr}"));
        }
        if exit_code != 0 {
            parts.push(format!("Exit code: {exit_code}"));
        }

        Ok(if parts.is_empty() {
            "Command executed successfully with no output".to_string()
        } else {
            parts.join("\n")
        })
    }
}
