//! # Recipe LLM Gateway
//!
//! Sends one recipe rewrite request through the gateway client and prints
//! the model's answer.
//!
//! ## Usage
//!
//! ```bash
//! # Rewrite a recipe given on the command line
//! OPENROUTER_API_KEY=sk-or-... recipe-llm-gateway "Make this pancake recipe vegan: ..."
//!
//! # JSON logs, more detail from the client
//! LOG_FORMAT=json RUST_LOG=gateway_client=debug recipe-llm-gateway "Halve this recipe: ..."
//! ```

use gateway_client::{ChatRequest, GatewayClient, GatewayConfig};
use gateway_telemetry::{init_logging, LoggingConfig};
use std::env;
use tracing::{error, info, warn};

const SYSTEM_PROMPT: &str = "You are a helpful cooking assistant. Rewrite the recipe as asked, \
keeping the ingredient list and numbered steps clearly separated.";

/// Application entry point
#[tokio::main]
async fn main() {
    let json = env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if let Err(e) = init_logging(&LoggingConfig::new().with_level("info").with_json(json)) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting recipe LLM gateway"
    );

    if let Err(e) = run().await {
        error!(error = %e, "Request failed");
        std::process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let prompt = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if prompt.trim().is_empty() {
        return Err("usage: recipe-llm-gateway <instruction and recipe text>".into());
    }

    let config = GatewayConfig::from_env()?;
    info!(
        base_url = %config.base_url(),
        model = config.default_model(),
        "Configuration loaded"
    );

    let client = GatewayClient::new(config)?;

    let request = ChatRequest::builder()
        .system(SYSTEM_PROMPT)
        .user(prompt)
        .temperature(0.7)
        .build();

    let response = client.send(&request).await?;

    if response.is_truncated() {
        warn!(
            completion_tokens = response.usage.completion_tokens,
            "Response was cut off at the token limit"
        );
    }
    info!(
        id = %response.id,
        model = %response.model,
        total_tokens = response.usage.total_tokens,
        "Completion received"
    );

    println!("{}", response.content().unwrap_or_default());
    Ok(())
}
