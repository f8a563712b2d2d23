//! Inbound wire format.
//!
//! Turns the upstream's JSON body into a [`ChatResponse`]. The upstream is
//! untrusted: every shape problem becomes a [`GatewayError::ResponseFormat`].

use gateway_core::{
    ChatResponse, Choice, FinishReason, FunctionCall, GatewayError, GatewayResult,
    ResponseMessage, ResponseRole, ToolCall, Usage,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Chat completion body as returned by the upstream.
#[derive(Debug, Clone, Deserialize)]
struct WireChatResponse {
    id: String,
    model: String,
    created: i64,
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireChoice {
    #[serde(default)]
    index: u32,
    message: WireResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireResponseMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default)]
    tool_type: Option<String>,
    function: FunctionCall,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
    #[serde(default)]
    total_tokens: Option<u32>,
}

impl From<WireUsage> for Usage {
    fn from(usage: WireUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens.unwrap_or(0),
            completion_tokens: usage.completion_tokens.unwrap_or(0),
            total_tokens: usage.total_tokens.unwrap_or(0),
        }
    }
}

/// Provider error body, `{"error": {"message": ..., "type": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireErrorBody {
    pub(crate) error: WireErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireErrorDetail {
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(rename = "type", default)]
    pub(crate) error_type: Option<String>,
    #[serde(default)]
    pub(crate) code: Option<Value>,
}

/// Convert an upstream body into a [`ChatResponse`].
///
/// # Errors
/// Returns [`GatewayError::ResponseFormat`] if `choices` is missing or empty,
/// a choice carries an unknown role or finish reason, or the body does not
/// have the expected shape.
pub fn from_wire(body: Value) -> GatewayResult<ChatResponse> {
    match body.get("choices") {
        None | Some(Value::Null) => {
            return Err(GatewayError::response_format_with(
                "response is missing the choices field",
                body,
            ))
        }
        Some(Value::Array(choices)) if choices.is_empty() => {
            return Err(GatewayError::response_format_with(
                "choices array is empty",
                body,
            ))
        }
        Some(_) => {}
    }

    let wire: WireChatResponse = match serde_json::from_value(body.clone()) {
        Ok(wire) => wire,
        Err(e) => {
            return Err(GatewayError::response_format_with(
                format!("invalid chat completion body: {e}"),
                body,
            ))
        }
    };

    let choices = wire
        .choices
        .into_iter()
        .map(convert_choice)
        .collect::<GatewayResult<Vec<_>>>()?;

    Ok(ChatResponse {
        id: wire.id,
        model: wire.model,
        created: wire.created,
        choices,
        usage: wire.usage.map(Usage::from).unwrap_or_default(),
    })
}

fn convert_choice(choice: WireChoice) -> GatewayResult<Choice> {
    let index = choice.index;

    let role = match choice.message.role.as_str() {
        "assistant" => ResponseRole::Assistant,
        "tool" => ResponseRole::Tool,
        other => {
            return Err(GatewayError::response_format(format!(
                "choices[{index}].message.role '{other}' is not assistant or tool"
            )))
        }
    };

    let finish_reason = match choice.finish_reason.as_deref() {
        Some(reason) => FinishReason::from_wire(reason).ok_or_else(|| {
            warn!(choice = index, finish_reason = reason, "Rejecting unknown finish reason");
            GatewayError::response_format(format!(
                "choices[{index}].finish_reason '{reason}' is not recognised"
            ))
        })?,
        None => {
            warn!(choice = index, "Rejecting completion without a finish reason");
            return Err(GatewayError::response_format(format!(
                "choices[{index}].finish_reason is missing"
            )));
        }
    };

    let tool_calls = choice.message.tool_calls.map(|calls| {
        calls
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                tool_type: call.tool_type.unwrap_or_else(|| "function".to_string()),
                function: call.function,
            })
            .collect()
    });

    Ok(Choice {
        index,
        message: ResponseMessage {
            role,
            content: choice.message.content,
            tool_calls,
        },
        finish_reason,
    })
}
