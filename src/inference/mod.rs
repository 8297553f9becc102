//! Inference Client — talks to a llama.cpp server over its HTTP API.
//!
//! This module handles all communication with the server:
//! - Liveness probe (`/health`) and model listing (`/v1/models`)
//! - Streaming and non-streaming chat completions
//! - Raw prompt completion (`/completion`)
//! - SSE stream decoding into displayable text fragments
//! - Client configuration loading

pub mod client;
pub mod config;
pub mod conversation;
pub mod errors;
pub mod streaming;
pub mod types;

// Re-exports for convenience
pub use client::{ChatReply, HealthStatus, LlamaClient};
pub use config::{ClientConfig, FileConfig};
pub use conversation::Conversation;
pub use errors::InferenceError;
pub use streaming::TokenStream;
pub use types::{ChatMessage, ModelDescriptor, Role, SamplingParams};
