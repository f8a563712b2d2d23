//! # Recipe LLM Gateway Client
//!
//! A resilient client for an OpenAI-compatible chat completions API
//! (OpenRouter by default), used by the recipe app for rewriting and
//! structured extraction.
//!
//! ## Features
//!
//! - Request validation before any network traffic
//! - Bounded concurrency (five in-flight calls by default)
//! - Retries with exponential backoff and jitter on network, 429 and 5xx failures
//! - Strict decoding of upstream responses
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gateway_client::{ChatRequest, GatewayClient, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gateway_client::GatewayError> {
//!     let client = GatewayClient::new(GatewayConfig::from_env()?)?;
//!
//!     let response = client
//!         .send(&ChatRequest::builder().user("Halve this recipe.").build())
//!         .await?;
//!
//!     println!("Response: {}", response.content().unwrap_or_default());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod client;
mod config;
mod request;
mod response;
mod transport;

pub use client::GatewayClient;
pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use request::{to_wire, WireChatRequest, WireJsonSchema, WireResponseFormat};
pub use response::from_wire;
pub use transport::{HttpTransport, Transport, TransportRequest};

// Re-export core types for convenience
pub use gateway_core::{
    ChatRequest, ChatRequestBuilder, ChatResponse, Choice, ErrorKind, FinishReason,
    FunctionDefinition, GatewayError, GatewayResult, JsonSchemaFormat, Message, MessageRole,
    ModelParameters, ResponseFormat, StopSequence, Tool, ToolCall, TransportFailure, Usage,
};
pub use gateway_resilience::ThrottleStats;
