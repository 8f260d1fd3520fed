//! # yaa core
//!
//! Domain types, traits, and error definitions for the yaa agent.
//! This crate knows nothing about HTTP or terminals; it defines the
//! domain model that all other crates implement against.
//!
//! - [`message`]: conversation messages and roles
//! - [`provider`]: the inference-service trait and its request/stream types
//! - [`tool`]: tool definitions, tool calls, and the registry
//! - [`schema`] / [`dispatch`]: typed tool inputs, described to the model
//!   and decoded from its calls

pub mod dispatch;
pub mod error;
pub mod message;
pub mod provider;
pub mod schema;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use dispatch::{ToolHandler, decode_arguments, decode_call, with_decoded_input};
pub use error::{DecodeError, Error, ProviderError, Result, ToolError};
pub use message::{Message, Role};
pub use provider::{ChatRequest, ChunkReceiver, Provider, StreamChunk, ToolSpec};
pub use schema::input_schema;
pub use tool::{Arguments, ToolCall, ToolDefinition, ToolRegistry};
