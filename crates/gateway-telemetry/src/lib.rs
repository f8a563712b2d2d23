//! # Gateway Telemetry
//!
//! Logging setup for the recipe LLM gateway client.
//!
//! The library crates only emit `tracing` events; binaries call
//! [`init_logging`] once at startup to decide where they go.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingConfig, TelemetryError};
