//! Outbound wire format.
//!
//! Maps a caller-facing [`ChatRequest`] onto the flat OpenAI-compatible body
//! expected by the upstream. Sampling parameters are hoisted to the top level
//! and anything unset is left out of the JSON entirely.

use gateway_core::{
    ChatRequest, GatewayError, GatewayResult, Message, ResponseFormat, StopSequence, Tool,
};
use serde::Serialize;
use serde_json::Value;

/// Chat completion body as sent to the upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireChatRequest {
    /// Resolved model.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Response format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<WireResponseFormat>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Top-p sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Frequency penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Presence penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSequence>,
    /// Sampling seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Tool definitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Tool choice, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
}

/// Response format on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireResponseFormat {
    /// `text`, `json_object` or `json_schema`.
    #[serde(rename = "type")]
    pub format_type: &'static str,
    /// Schema block, present for `json_schema` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<WireJsonSchema>,
}

/// Schema block of a `json_schema` response format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireJsonSchema {
    /// Schema name.
    pub name: String,
    /// Whether the schema is enforced strictly.
    pub strict: bool,
    /// The schema itself.
    pub schema: Value,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl WireResponseFormat {
    fn from_format(format: &ResponseFormat) -> Self {
        let json_schema = match format {
            ResponseFormat::JsonSchema { json_schema } => Some(WireJsonSchema {
                name: json_schema.name.clone(),
                strict: json_schema.strict,
                schema: json_schema.schema.clone().unwrap_or(Value::Null),
                description: json_schema.description.clone(),
            }),
            ResponseFormat::Text | ResponseFormat::JsonObject => None,
        };
        Self {
            format_type: format.type_name(),
            json_schema,
        }
    }
}

/// Build the upstream body for a validated request.
///
/// The model is the request's own when set, otherwise `default_model`.
///
/// # Errors
/// Returns a validation error if neither names a model.
pub fn to_wire(request: &ChatRequest, default_model: &str) -> GatewayResult<WireChatRequest> {
    let model = request
        .resolve_model(Some(default_model))
        .ok_or_else(|| GatewayError::invalid_field("model", "model is required"))?
        .to_string();

    let parameters = request.parameters.clone().unwrap_or_default();

    Ok(WireChatRequest {
        model,
        messages: request.messages.clone(),
        response_format: request
            .response_format
            .as_ref()
            .map(WireResponseFormat::from_format),
        temperature: parameters.temperature,
        top_p: parameters.top_p,
        frequency_penalty: parameters.frequency_penalty,
        presence_penalty: parameters.presence_penalty,
        max_tokens: parameters.max_tokens,
        stop: parameters.stop,
        seed: parameters.seed,
        tools: request.tools.clone().filter(|t| !t.is_empty()),
        tool_choice: request.tool_choice.clone(),
    })
}
