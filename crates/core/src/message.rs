//! Chat messages and chunk concatenation
//!
//! Streamed model and tool output arrives as message "chunks". A chunk
//! carries the same shape as a complete message; `concat_messages` folds
//! an ordered chunk list back into one message.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    Tool,
    System,
}

/// Token accounting reported by the model provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Provider metadata attached to a response message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Why generation stopped (e.g. "stop", "tool_calls")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    /// Token usage for the request that produced this message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// A chat message (or one streamed chunk of a message)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,

    /// Message content
    pub content: String,

    /// Identifier of the tool call this message answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Name of the tool that produced this message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Provider metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_meta: Option<ResponseMeta>,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a tool response message for a given tool call
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_name: None,
            response_meta: None,
        }
    }

    /// Set the tool name
    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    /// Set the provider metadata
    pub fn with_response_meta(mut self, meta: ResponseMeta) -> Self {
        self.response_meta = Some(meta);
        self
    }
}

/// Concatenate an ordered list of message chunks into one message.
///
/// Content is appended in order. Non-content fields (`tool_call_id`,
/// `tool_name`, `response_meta`) take the first non-empty value
/// encountered. The role comes from the first chunk.
pub fn concat_messages(chunks: &[Message]) -> crate::Result<Message> {
    let first = chunks.first().ok_or(Error::EmptyChunks)?;

    let mut out = Message {
        role: first.role,
        content: String::with_capacity(chunks.iter().map(|c| c.content.len()).sum()),
        tool_call_id: None,
        tool_name: None,
        response_meta: None,
    };

    for chunk in chunks {
        out.content.push_str(&chunk.content);

        if out.tool_call_id.is_none() {
            out.tool_call_id = chunk.tool_call_id.clone();
        }
        if out.tool_name.is_none() {
            out.tool_name = chunk.tool_name.clone();
        }
        if out.response_meta.is_none() {
            out.response_meta = chunk.response_meta.clone();
        }
    }

    Ok(out)
}
