//! Ollama provider implementation.
//!
//! Talks to a local (or remote) Ollama server over its native
//! `/api/chat` endpoint. Responses arrive as NDJSON: one JSON object per
//! line, each carrying a content delta and/or tool calls, the last one
//! flagged `"done": true`. A non-streamed request gets the same shape in
//! a single object.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use yaa_config::AppConfig;
use yaa_core::error::ProviderError;
use yaa_core::message::Message;
use yaa_core::provider::{ChatRequest, ChunkReceiver, Provider, StreamChunk, ToolSpec};
use yaa_core::tool::ToolCall;

/// An Ollama `/api/chat` client.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a provider for the server at `base_url` (e.g. `http://127.0.0.1:11434`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        // No overall timeout: a streamed answer can legitimately take minutes.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a provider from application config.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        Self::new(&config.ollama_host)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert our Message types to Ollama API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
                tool_calls: m
                    .tool_calls
                    .iter()
                    .map(|tc| ApiToolCall {
                        function: ApiFunction {
                            name: tc.name.clone(),
                            arguments: tc.raw_arguments(),
                        },
                    })
                    .collect(),
            })
            .collect()
    }

    /// Convert tool specs to Ollama API format.
    fn to_api_tools(tools: &[ToolSpec]) -> Vec<ApiTool> {
        tools
            .iter()
            .map(|t| ApiTool {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    // Ollama wants an object schema even for argument-less tools
                    parameters: t.parameters.clone().unwrap_or_else(|| {
                        serde_json::json!({ "type": "object", "properties": {} })
                    }),
                },
            })
            .collect()
    }

    fn build_body(request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": request.stream,
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        if let Some(keep_alive) = request.keep_alive {
            body["keep_alive"] = serde_json::json!(format!("{}s", keep_alive.as_secs()));
        }

        body
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChunkReceiver, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = Self::build_body(&request);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            stream = request.stream,
            "Sending chat request"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model));
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Ollama returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_message(&error_body),
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        // Spawn task to read the NDJSON byte stream and parse chunks
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut decoder = NdjsonDecoder::default();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for item in decoder.push(&bytes) {
                    let failed = item.is_err();
                    if tx.send(item).await.is_err() || failed {
                        return; // receiver dropped, or the server reported an error
                    }
                }
            }

            // A single-shot response may end without a trailing newline
            for item in decoder.finish() {
                if tx.send(item).await.is_err() {
                    return;
                }
            }
        });

        Ok(rx)
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

/// Splits a byte stream into NDJSON lines and parses each into a chunk.
///
/// Lines are split on raw bytes so a multi-byte character straddling two
/// network reads is never mangled.
#[derive(Debug, Default)]
struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<StreamChunk, ProviderError>> {
        self.buffer.extend_from_slice(bytes);

        let mut items = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            if let Some(item) = parse_line(&line) {
                items.push(item);
            }
        }
        items
    }

    fn finish(&mut self) -> Vec<Result<StreamChunk, ProviderError>> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest).into_iter().collect()
    }
}

fn parse_line(line: &[u8]) -> Option<Result<StreamChunk, ProviderError>> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    let parsed: ApiResponseLine = match serde_json::from_slice(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(data = %String::from_utf8_lossy(line), error = %e, "Unparseable NDJSON line");
            return Some(Err(ProviderError::InvalidResponse(format!(
                "malformed response line: {e}"
            ))));
        }
    };

    if let Some(error) = parsed.error {
        return Some(Err(ProviderError::StreamInterrupted(error)));
    }

    let (content, tool_calls) = match parsed.message {
        Some(message) => {
            let tool_calls = message
                .tool_calls
                .into_iter()
                .map(|tc| ToolCall::from_raw(tc.function.name, tc.function.arguments))
                .collect();
            let content = Some(message.content).filter(|c| !c.is_empty());
            (content, tool_calls)
        }
        None => (None, Vec::new()),
    };

    Some(Ok(StreamChunk {
        content,
        tool_calls,
        done: parsed.done,
    }))
}

/// Ollama reports failures as `{"error": "..."}`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

// --- Ollama API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// One NDJSON line of a `/api/chat` response.
#[derive(Debug, Deserialize)]
struct ApiResponseLine {
    #[serde(default)]
    message: Option<ApiMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}
