//! Inference service clients for yaa.
//!
//! All providers implement the `yaa_core::Provider` trait.

pub mod ollama;

pub use ollama::OllamaProvider;
