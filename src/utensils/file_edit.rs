use async_trait::async_trait;
use std::io::ErrorKind;

use crate::parser::ParamSet;

use super::traits::{required, ArgumentError, Utensil};

/// Replaces the first occurrence of a text span in an existing file.
pub struct FileEditUtensil {}

impl FileEditUtensil {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Utensil for FileEditUtensil {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Replace the first occurrence of old_text with new_text in a file."
    }

    fn parameters(&self) -> &[&str] {
        &["file_path", "old_text", "new_text"]
    }

    async fn execute(&self, params: &ParamSet) -> Result<String, ArgumentError> {
        let file_path = required(params, "file_path")?;
        let old_text = required(params, "old_text")?;
        let new_text = required(params, "new_text")?;

        if old_text.is_empty() {
            return Ok("Error: old_text must not be empty".to_string());
        }

        let contents = match tokio::fs::read_to_string(file_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(format!("Error: File not found at path '{file_path}'"));
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Ok(format!("Error: Permission denied reading file at '{file_path}'"));
            }
            Err(e) => return Ok(format!("Error reading file: {e}")),
        };

        if !contents.contains(old_text) {
            return Ok(format!("Error: text to replace not found in '{file_path}'"));
        }

        let edited = contents.replacen(old_text, new_text, 1);
        Ok(match tokio::fs::write(file_path, edited).await {
            Ok(()) => format!("Successfully edited file '{file_path}'"),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                format!("Error: Permission denied writing to '{file_path}'")
            }
            Err(e) => format!("Error writing file: {e}"),
        })
    }
}
