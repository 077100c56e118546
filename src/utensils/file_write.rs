use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;

use crate::parser::ParamSet;

use super::traits::{required, ArgumentError, Utensil};

/// Writes content to a file, creating parent directories as needed.
pub struct FileWriteUtensil {}

impl FileWriteUtensil {
    pub fn new() -> Self {
        Self {}
    }
}

fn write_error(file_path: &str, e: &std::io::Error) -> String {
    if e.kind() == ErrorKind::PermissionDenied {
        format!("Error: Permission denied writing to '{file_path}'")
    } else {
        format!("Error writing file: {e}")
    }
}

#[async_trait]
impl Utensil for FileWriteUtensil {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file (creates it if missing, overwrites if not)."
    }

    fn parameters(&self) -> &[&str] {
        &["file_path", "content"]
    }

    async fn execute(&self, params: &ParamSet) -> Result<String, ArgumentError> {
        let file_path = required(params, "file_path")?;
        let content = required(params, "content")?;

        if let Some(parent) = Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    return Ok(write_error(file_path, &e));
                }
            }
        }

        Ok(match tokio::fs::write(file_path, content).await {
            Ok(()) => format!("Successfully wrote to file '{file_path}'"),
            Err(e) => write_error(file_path, &e),
        })
    }
}
