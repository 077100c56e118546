use async_trait::async_trait;
use std::io::ErrorKind;

use crate::parser::ParamSet;

use super::traits::{required, ArgumentError, Utensil};

/// Reads a file and returns its contents.
pub struct FileReadUtensil {}

impl FileReadUtensil {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Utensil for FileReadUtensil {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read file contents."
    }

    fn parameters(&self) -> &[&str] {
        &["file_path"]
    }

    async fn execute(&self, params: &ParamSet) -> Result<String, ArgumentError> {
        let file_path = required(params, "file_path")?;

        Ok(match tokio::fs::read_to_string(file_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                format!("Error: File not found at path '{file_path}'")
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                format!("Error: Permission denied reading file at '{file_path}'")
            }
            Err(e) => format!("Error reading file: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_file_name() {
        let utensil = FileReadUtensil::new();
        assert_eq!(utensil.name(), "read_file");
        assert_eq!(utensil.parameters(), &["file_path"]);
    }

    #[tokio::test]
    async fn reads_existing_file() {
        let dir = std::env::temp_dir().join("skillet_test_read_file");
        let _ = tokio::fs::remove_dir_all(&dir).await;
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("notes.txt");
        tokio::fs::write(&path, "hello world\n").await.unwrap();

        let utensil = FileReadUtensil::new();
        let mut params = ParamSet::new();
        params.insert("file_path", path.to_string_lossy().to_string());

        let result = utensil.execute(&params).await.unwrap();
        assert_eq!(result, "hello world\n");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let utensil = FileReadUtensil::new();
        let mut params = ParamSet::new();
        params.insert("file_path", "/definitely/not/here.txt");

        let result = utensil.execute(&params).await.unwrap();
        assert_eq!(
            result,
            "Error: File not found at path '/definitely/not/here.txt'"
        );
    }

    #[tokio::test]
    async fn missing_param_is_an_argument_error() {
        let utensil = FileReadUtensil::new();
        let err = utensil.execute(&ParamSet::new()).await.unwrap_err();
        assert_eq!(err, ArgumentError::Missing("file_path"));
    }
}
