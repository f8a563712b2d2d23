//! Response types.

use serde::{Deserialize, Serialize};

/// Why generation stopped for a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop or stop sequence.
    Stop,
    /// Token limit reached.
    Length,
    /// The model requested tool calls.
    ToolCalls,
    /// Output was filtered by the provider.
    ContentFilter,
    /// The provider reported a generation error.
    Error,
}

impl FinishReason {
    /// Parse the provider spelling.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "stop" => Some(Self::Stop),
            "length" => Some(Self::Length),
            "tool_calls" => Some(Self::ToolCalls),
            "content_filter" => Some(Self::ContentFilter),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Provider spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ToolCalls => "tool_calls",
            Self::ContentFilter => "content_filter",
            Self::Error => "error",
        }
    }
}

/// Role of a generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseRole {
    /// Assistant output.
    Assistant,
    /// Tool output.
    Tool,
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function.
    pub name: String,
    /// Arguments as a JSON string.
    #[serde(default)]
    pub arguments: String,
}

/// A tool call made by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for the tool call.
    pub id: String,
    /// Type of tool (always "function" for now).
    #[serde(rename = "type", default = "default_tool_type")]
    pub tool_type: String,
    /// Function details.
    pub function: FunctionCall,
}

fn default_tool_type() -> String {
    "function".to_string()
}

/// A generated message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Role of the message.
    pub role: ResponseRole,
    /// Content; `None` when the provider sent `null` (e.g. pure tool calls).
    pub content: Option<String>,
    /// Tool calls made by the assistant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// A single completion choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice.
    pub index: u32,
    /// The generated message.
    pub message: ResponseMessage,
    /// Reason for completion.
    pub finish_reason: FinishReason,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,
    /// Number of tokens in the completion.
    pub completion_tokens: u32,
    /// Total number of tokens.
    pub total_tokens: u32,
}

/// Response from a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Unique identifier for this completion.
    pub id: String,
    /// Model that produced the completion.
    pub model: String,
    /// Unix timestamp (seconds) of when the completion was created.
    pub created: i64,
    /// Completion choices. Never empty.
    pub choices: Vec<Choice>,
    /// Token usage statistics.
    pub usage: Usage,
}

impl ChatResponse {
    /// Get the first choice.
    #[must_use]
    pub fn first_choice(&self) -> Option<&Choice> {
        self.choices.first()
    }

    /// Get the content of the first choice.
    ///
    /// `None` if the first choice carried `null` content.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.first_choice()
            .and_then(|c| c.message.content.as_deref())
    }

    /// Get the finish reason of the first choice.
    #[must_use]
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.first_choice().map(|c| c.finish_reason)
    }

    /// Check if the response was truncated due to length.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.finish_reason() == Some(FinishReason::Length)
    }
}
