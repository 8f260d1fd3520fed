//! Structured single-shot queries.
//!
//! Asks the model for a JSON answer matching a type's schema, outside the
//! conversation: the extra request is never recorded in history.

use std::time::Duration;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use yaa_core::message::Message;
use yaa_core::provider::{ChatRequest, Provider};
use yaa_core::schema::input_schema;

use crate::stream_processor::strip_reasoning;

/// Name shown for the model when it can't be asked for one.
pub const DEFAULT_AGENT_NAME: &str = "Agent";

const IDENTITY_REQUEST: &str =
    "Identify yourself, and also quickly generate an HTTP user-agent that includes your name.";

/// Send `history` plus `request` and decode the reply into `T`.
///
/// Reasoning up to the last end marker is discarded before decoding.
pub async fn query_structured<T>(
    provider: &dyn Provider,
    model: &str,
    history: &[Message],
    request: &str,
    keep_alive: Option<Duration>,
) -> yaa_core::Result<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = match input_schema::<T>() {
        Some(schema) => serde_json::to_string(&schema)?,
        None => "{}".to_string(),
    };

    let mut messages = history.to_vec();
    messages.push(Message::user(format!(
        "{request}. Output your response following the JSON schema {schema}"
    )));

    let mut rx = provider
        .chat(ChatRequest {
            model: model.to_string(),
            messages,
            tools: Vec::new(),
            keep_alive,
            stream: false,
        })
        .await?;

    let mut content = String::new();
    while let Some(chunk) = rx.recv().await {
        if let Some(text) = chunk?.content {
            content.push_str(&text);
        }
    }

    let answer = strip_reasoning(&content).trim();
    debug!(answer, "Structured query answered");
    Ok(serde_json::from_str(answer)?)
}

/// How the model introduces itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AgentIdentity {
    pub name: String,
    pub ua: String,
}

/// Ask the model for a name and a User-Agent, up to `attempts` times.
///
/// Returns `None` if no attempt produced both.
pub async fn probe_identity(
    provider: &dyn Provider,
    model: &str,
    history: &[Message],
    attempts: u32,
    keep_alive: Option<Duration>,
) -> Option<AgentIdentity> {
    for attempt in 1..=attempts {
        match query_structured::<AgentIdentity>(provider, model, history, IDENTITY_REQUEST, keep_alive)
            .await
        {
            Ok(identity) if !identity.name.is_empty() && !identity.ua.is_empty() => {
                debug!(name = %identity.name, ua = %identity.ua, "Identity set");
                return Some(identity);
            }
            Ok(identity) => debug!(attempt, ?identity, "Incomplete identity"),
            Err(e) => debug!(attempt, error = %e, "Identity request failed"),
        }
    }
    None
}
