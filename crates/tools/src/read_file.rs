//! File read tool: return the contents of a file.

use schemars::JsonSchema;
use serde::Deserialize;
use yaa_core::error::ToolError;
use yaa_core::tool::ToolDefinition;

pub const NAME: &str = "read_file";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileInput {
    /// The relative path of a file in the working directory.
    pub path: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        NAME,
        "Read the contents of a given relative file path. Use this when you want to see \
         what's inside a file. Do not use this with directory names.",
        read_file,
    )
}

async fn read_file(input: ReadFileInput) -> Result<String, ToolError> {
    let bytes = tokio::fs::read(&input.path)
        .await
        .map_err(|e| ToolError::failed(NAME, format!("{}: {e}", input.path)))?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use yaa_core::tool::ToolCall;

    fn call_with(arguments: serde_json::Value) -> ToolCall {
        ToolCall::with_arguments(NAME, arguments.as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello from disk").unwrap();

        let output = definition()
            .call(&call_with(json!({"path": path.to_str().unwrap()})))
            .await
            .unwrap();
        assert_eq!(output, "hello from disk");
    }

    #[tokio::test]
    async fn invalid_utf8_is_lossy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [b'o', b'k', 0xFF]).unwrap();

        let output = definition()
            .call(&call_with(json!({"path": path.to_str().unwrap()})))
            .await
            .unwrap();
        assert!(output.starts_with("ok"));
    }

    #[tokio::test]
    async fn missing_file_is_execution_error() {
        let err = definition()
            .call(&call_with(json!({"path": "/nonexistent/definitely/not/here.txt"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
        assert!(err.to_string().contains("here.txt"));
    }

    #[tokio::test]
    async fn missing_path_is_decode_error() {
        let err = definition().call(&ToolCall::new(NAME)).await.unwrap_err();
        match err {
            ToolError::Decode(decode) => assert_eq!(decode.field.as_deref(), Some("path")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn schema_requires_path() {
        let spec = definition().to_spec().unwrap();
        let parameters = spec.parameters.unwrap();
        assert_eq!(parameters["required"], json!(["path"]));
        assert_eq!(parameters["properties"]["path"]["type"], "string");
    }
}
