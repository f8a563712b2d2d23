//! # Gateway Core
//!
//! Core types and error handling for the recipe LLM gateway client.
//!
//! This crate provides the foundational pieces used by the other crates:
//! - Request and response types
//! - The `GatewayError` taxonomy and failure classification
//! - Request validation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
pub mod error;
pub mod request;
pub mod response;
pub mod validation;

// Re-export commonly used types
pub use classify::{classify, is_retryable, TransportFailure};
pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use request::{
    ChatRequest, ChatRequestBuilder, FunctionDefinition, JsonSchemaFormat, Message, MessageRole,
    ModelParameters, ResponseFormat, StopSequence, Tool,
};
pub use response::{
    ChatResponse, Choice, FinishReason, FunctionCall, ResponseMessage, ResponseRole, ToolCall,
    Usage,
};
pub use validation::{validate, MAX_SCHEMA_CHARS};
