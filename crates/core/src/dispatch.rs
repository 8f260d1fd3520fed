//! Schema-bound dispatch adapter.
//!
//! Tool bodies are written against a typed input struct. The registry only
//! ever sees [`ToolHandler`]: "a function of a tool call returning text or
//! an error". [`with_decoded_input`] bridges the two by re-encoding the
//! call's argument map and decoding it into the handler's input type.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{DecodeError, ToolError};
use crate::tool::{Arguments, ToolCall};

/// The uniform calling convention every registered tool exposes.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, call: &ToolCall) -> Result<String, ToolError>;
}

/// A typed handler wrapped so it can be invoked with an untyped tool call.
pub struct Decoded<T, F> {
    handler: F,
    _input: PhantomData<fn() -> T>,
}

/// Wrap a typed handler `T -> text` into a [`ToolHandler`].
pub fn with_decoded_input<T, F, Fut>(handler: F) -> Decoded<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
{
    Decoded {
        handler,
        _input: PhantomData,
    }
}

#[async_trait]
impl<T, F, Fut> ToolHandler for Decoded<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
{
    async fn call(&self, call: &ToolCall) -> Result<String, ToolError> {
        let input: T = decode_call(call)?;
        (self.handler)(input).await
    }
}

/// Decode a tool call into `T`, rejecting arguments that were not an object.
pub fn decode_call<T: DeserializeOwned>(call: &ToolCall) -> Result<T, ToolError> {
    match &call.malformed_arguments {
        Some(raw) => Err(ToolError::Decode(DecodeError {
            field: None,
            message: not_an_object(raw),
        })),
        None => decode_arguments(&call.arguments),
    }
}

/// Decode a tool call's argument map into `T`.
///
/// The map is first encoded to canonical JSON, then decoded with the
/// offending field tracked, so a mismatch names the field it happened at.
pub fn decode_arguments<T: DeserializeOwned>(arguments: &Arguments) -> Result<T, ToolError> {
    let encoded =
        serde_json::to_vec(arguments).map_err(|e| ToolError::Serialization(e.to_string()))?;

    let mut deserializer = serde_json::Deserializer::from_slice(&encoded);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        let message = without_position(err.into_inner().to_string());
        let field = match named_field(&message) {
            Some(name) if path == "." => Some(name),
            Some(name) if path.rsplit('.').next() != Some(name.as_str()) => {
                Some(format!("{path}.{name}"))
            }
            None if path == "." => None,
            _ => Some(path),
        };
        ToolError::Decode(DecodeError { field, message })
    })
}

fn not_an_object(raw: &serde_json::Value) -> String {
    use serde_json::Value;

    let found = match raw {
        Value::String(text) => {
            return match serde_json::from_str::<Arguments>(text) {
                Err(e) => format!("not a JSON object ({})", without_position(e.to_string())),
                Ok(_) => "not a JSON object".to_string(),
            };
        }
        Value::Array(_) => "an array",
        Value::Number(_) => "a number",
        Value::Bool(_) => "a boolean",
        Value::Null => "null",
        Value::Object(_) => "an object",
    };
    format!("not a JSON object, got {found}")
}

/// Pull the name out of serde's "missing field `x`" / "unknown field `x`".
fn named_field(message: &str) -> Option<String> {
    if !message.starts_with("missing field") && !message.starts_with("unknown field") {
        return None;
    }
    let start = message.find('`')? + 1;
    let len = message[start..].find('`')?;
    Some(message[start..start + len].to_string())
}

/// Drop serde_json's " at line L column C": it points into the re-encoded
/// arguments, not anything the model wrote.
fn without_position(mut message: String) -> String {
    if let Some(idx) = message.rfind(" at line ") {
        if message[idx..].contains(" column ") {
            message.truncate(idx);
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct PathInput {
        path: String,
        #[serde(default)]
        recursive: bool,
    }

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct StrictInput {
        #[allow(dead_code)]
        url: String,
    }

    #[derive(Debug, Deserialize)]
    struct NoInput {}

    fn call(arguments: serde_json::Value) -> ToolCall {
        ToolCall::with_arguments("test", arguments.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn decodes_matching_payload() {
        let input: PathInput =
            decode_arguments(&call(json!({"path": "src", "recursive": true})).arguments).unwrap();
        assert_eq!(input.path, "src");
        assert!(input.recursive);
    }

    #[test]
    fn missing_required_field_names_it() {
        let err = decode_arguments::<PathInput>(&call(json!({"recursive": true})).arguments)
            .unwrap_err();
        match err {
            ToolError::Decode(e) => {
                assert_eq!(e.field.as_deref(), Some("path"));
                assert_eq!(e.message, "missing field `path`");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn wrong_type_names_field() {
        let err = decode_arguments::<PathInput>(&call(json!({"path": 42})).arguments).unwrap_err();
        match err {
            ToolError::Decode(e) => {
                assert_eq!(e.field.as_deref(), Some("path"));
                assert!(e.message.contains("invalid type"));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn no_coercion_of_strings_to_bools() {
        let err = decode_arguments::<PathInput>(
            &call(json!({"path": ".", "recursive": "true"})).arguments,
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Decode(ref e) if e.field.as_deref() == Some("recursive")));
    }

    #[test]
    fn unknown_field_rejected_when_shape_is_strict() {
        let err = decode_arguments::<StrictInput>(
            &call(json!({"url": "https://example.com", "extra": 1})).arguments,
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Decode(ref e) if e.field.as_deref() == Some("extra")));
    }

    #[test]
    fn empty_payload_decodes_into_empty_input() {
        assert!(decode_arguments::<NoInput>(&Arguments::new()).is_ok());
    }

    #[tokio::test]
    async fn adapter_invokes_typed_handler() {
        let handler = with_decoded_input(|input: PathInput| async move {
            Ok(format!("listing {}", input.path))
        });
        let out = handler.call(&call(json!({"path": "docs"}))).await.unwrap();
        assert_eq!(out, "listing docs");
    }

    #[tokio::test]
    async fn adapter_surfaces_decode_error_not_payload() {
        let handler = with_decoded_input(|_: PathInput| async { Ok("unreachable".to_string()) });
        let err = handler
            .call(&call(json!({"pth": "secret-payload"})))
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("path"));
        assert!(!text.contains("secret-payload"));
    }

    #[tokio::test]
    async fn adapter_passes_handler_errors_through() {
        let handler = with_decoded_input(|_: NoInput| async {
            Err(ToolError::failed("boom", "kaput"))
        });
        let err = handler.call(&call(json!({}))).await.unwrap_err();
        assert!(err.to_string().contains("kaput"));
    }

    #[derive(Debug, Deserialize)]
    struct Outer {
        #[allow(dead_code)]
        inner: Inner,
    }

    #[derive(Debug, Deserialize)]
    struct Inner {
        #[allow(dead_code)]
        depth: u32,
    }

    #[test]
    fn nested_missing_field_gets_full_path() {
        let err = decode_arguments::<Outer>(&call(json!({"inner": {}})).arguments).unwrap_err();
        match err {
            ToolError::Decode(e) => {
                assert_eq!(e.field.as_deref(), Some("inner.depth"));
                assert_eq!(e.message, "missing field `depth`");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn nested_wrong_type_names_path() {
        let err = decode_arguments::<Outer>(&call(json!({"inner": {"depth": "deep"}})).arguments)
            .unwrap_err();
        assert!(matches!(err, ToolError::Decode(ref e) if e.field.as_deref() == Some("inner.depth")));
    }

    #[tokio::test]
    async fn adapter_rejects_arguments_that_are_not_an_object() {
        let handler = with_decoded_input(|_: PathInput| async { Ok("unreachable".to_string()) });

        let truncated = ToolCall::from_raw("test", json!("{\"path\": \"a.txt\""));
        let err = handler.call(&truncated).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid arguments: not a JSON object (EOF while parsing an object)"
        );

        let array = ToolCall::from_raw("test", json!(["a.txt"]));
        let err = handler.call(&array).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid arguments: not a JSON object, got an array");
    }

    #[test]
    fn field_names_only_from_field_errors() {
        assert_eq!(named_field("missing field `url`").as_deref(), Some("url"));
        assert_eq!(named_field("unknown field `x`, expected `url`").as_deref(), Some("x"));
        assert_eq!(named_field("invalid type: integer `42`, expected a string"), None);
    }

    #[test]
    fn position_suffix_removed() {
        assert_eq!(
            without_position("missing field `depth` at line 1 column 11".into()),
            "missing field `depth`"
        );
        assert_eq!(without_position("expected value".into()), "expected value");
    }
}
