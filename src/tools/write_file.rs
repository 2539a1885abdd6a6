//! Write file tool

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

use crate::error::Result;
use crate::toolkit::{Tool, ToolResult};

pub struct WriteFileTool {
    allowed_dir: PathBuf,
}

impl WriteFileTool {
    pub fn new(allowed_dir: PathBuf) -> Self {
        WriteFileTool { allowed_dir }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to write (relative to workspace)"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write to the file"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let path = args
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| crate::Error::InvalidInput("Missing 'path' parameter".to_string()))?;
        let content = args
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| crate::Error::InvalidInput("Missing 'content' parameter".to_string()))?;

        let full_path = self.allowed_dir.join(path);
        let canonical_root = match tokio::fs::canonicalize(&self.allowed_dir).await {
            Ok(p) => p,
            Err(e) => return Ok(ToolResult::failure(format!("Failed to resolve workspace: {}", e))),
        };

        if let Some(parent) = full_path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return Ok(ToolResult::failure(format!("Failed to create directories: {}", e)));
            }
        }

        let canonical_parent = match tokio::fs::canonicalize(full_path.parent().unwrap_or(&full_path)).await {
            Ok(p) => p,
            Err(e) => return Ok(ToolResult::failure(format!("Failed to resolve path: {}", e))),
        };
        if !canonical_parent.starts_with(&canonical_root) {
            return Ok(ToolResult::failure("Access denied: path outside workspace"));
        }

        match tokio::fs::write(&full_path, content).await {
            Ok(()) => Ok(ToolResult::success(format!(
                "Successfully wrote {} bytes to {}",
                content.len(),
                path
            ))),
            Err(e) => Ok(ToolResult::failure(format!("Failed to write file: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_file_within_allowed_dir() {
        let dir = tempfile::tempdir().unwrap();
        let tool = WriteFileTool::new(dir.path().to_path_buf());
        let result = tool
            .execute(serde_json::json!({"path": "out.txt", "content": "hello"}))
            .await
            .unwrap();
        assert!(!result.is_error);
        let written = tokio::fs::read_to_string(dir.path().join("out.txt")).await.unwrap();
        assert_eq!(written, "hello");
    }

    #[tokio::test]
    async fn rejects_path_outside_allowed_dir() {
        let dir = tempfile::tempdir().unwrap();
        let tool = WriteFileTool::new(dir.path().to_path_buf());
        let result = tool
            .execute(serde_json::json!({"path": "../escape.txt", "content": "x"}))
            .await
            .unwrap();
        assert!(result.is_error);
    }
}
