//! Request validation.
//!
//! Runs before the client touches the throttle or the network. Rules are
//! checked in a fixed order and the first failure is returned.

use crate::error::{GatewayError, GatewayResult};
use crate::request::{ChatRequest, ModelParameters, ResponseFormat, Tool};
use serde_json::Value;
use std::ops::RangeInclusive;

/// Maximum serialized size of a JSON schema, in characters.
pub const MAX_SCHEMA_CHARS: usize = 50_000;

const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=2.0;
const TOP_P_RANGE: RangeInclusive<f64> = 0.0..=1.0;
const PENALTY_RANGE: RangeInclusive<f64> = -2.0..=2.0;

/// Validate a request.
///
/// # Errors
/// Returns [`GatewayError::Validation`] describing the first rule violated.
pub fn validate(request: &ChatRequest, default_model: Option<&str>) -> GatewayResult<()> {
    if request.messages.is_empty() {
        return Err(GatewayError::invalid_field(
            "messages",
            "messages must contain at least one message",
        ));
    }

    for (index, message) in request.messages.iter().enumerate() {
        if !message.role.is_supported() {
            return Err(GatewayError::invalid_field(
                format!("messages[{index}].role"),
                format!(
                    "messages[{index}].role '{}' is not supported; expected one of system, user, assistant, tool",
                    message.role
                ),
            ));
        }
    }

    if request.resolve_model(default_model).is_none() {
        return Err(GatewayError::invalid_field(
            "model",
            "model is required: set it on the request or configure a default model",
        ));
    }

    if let Some(parameters) = &request.parameters {
        validate_parameters(parameters)?;
    }

    if let Some(ResponseFormat::JsonSchema { json_schema }) = &request.response_format {
        validate_schema(json_schema.schema.as_ref())?;
    }

    if let Some(tools) = &request.tools {
        for (index, tool) in tools.iter().enumerate() {
            validate_tool(index, tool)?;
        }
    }

    Ok(())
}

fn check_range(
    field: &str,
    value: Option<f64>,
    range: &RangeInclusive<f64>,
) -> GatewayResult<()> {
    match value {
        // NaN fails `contains`, so it is rejected along with out-of-range values.
        Some(v) if !range.contains(&v) => Err(GatewayError::invalid_field(
            field,
            format!(
                "{field} must be between {} and {}, got {v}",
                range.start(),
                range.end()
            ),
        )),
        _ => Ok(()),
    }
}

fn validate_parameters(parameters: &ModelParameters) -> GatewayResult<()> {
    check_range("temperature", parameters.temperature, &TEMPERATURE_RANGE)?;
    check_range("top_p", parameters.top_p, &TOP_P_RANGE)?;
    check_range(
        "frequency_penalty",
        parameters.frequency_penalty,
        &PENALTY_RANGE,
    )?;
    check_range(
        "presence_penalty",
        parameters.presence_penalty,
        &PENALTY_RANGE,
    )?;

    if parameters.max_tokens == Some(0) {
        return Err(GatewayError::invalid_field(
            "max_tokens",
            "max_tokens must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_schema(schema: Option<&Value>) -> GatewayResult<()> {
    let Some(schema) = schema.filter(|s| !s.is_null()) else {
        return Err(GatewayError::invalid_field(
            "response_format.json_schema.schema",
            "JSON schema is required for the json_schema response format",
        ));
    };

    let has_shape = schema
        .as_object()
        .is_some_and(|obj| obj.contains_key("type") && obj.contains_key("properties"));
    if !has_shape {
        return Err(GatewayError::invalid_field(
            "response_format.json_schema.schema",
            "JSON schema must be an object with 'type' and 'properties'",
        ));
    }

    let serialized = serde_json::to_string(schema).map_err(|e| {
        GatewayError::invalid_field(
            "response_format.json_schema.schema",
            format!("JSON schema could not be serialized: {e}"),
        )
    })?;
    let size = serialized.chars().count();
    if size > MAX_SCHEMA_CHARS {
        return Err(GatewayError::invalid_field(
            "response_format.json_schema.schema",
            format!("JSON schema is too large: {size} characters exceeds the {MAX_SCHEMA_CHARS} limit"),
        ));
    }

    Ok(())
}

fn validate_tool(index: usize, tool: &Tool) -> GatewayResult<()> {
    if tool.tool_type != "function" {
        return Err(GatewayError::invalid_field(
            format!("tools[{index}].type"),
            format!(
                "tools[{index}].type must be 'function', got '{}'",
                tool.tool_type
            ),
        ));
    }
    if tool.function.name.trim().is_empty() {
        return Err(GatewayError::invalid_field(
            format!("tools[{index}].function.name"),
            format!("tools[{index}].function.name must not be empty"),
        ));
    }
    if tool.function.description.trim().is_empty() {
        return Err(GatewayError::invalid_field(
            format!("tools[{index}].function.description"),
            format!("tools[{index}].function.description must not be empty"),
        ));
    }
    Ok(())
}
