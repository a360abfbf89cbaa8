//! Agent events emitted during one run
//!
//! Events carrying a live sub-stream (`ChatModelAnswer`,
//! `ToolsAsChatModelStream`) hand the stream to the consumer without
//! draining it; all other events carry fully-materialized payloads.

use std::fmt;

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use flow_core::{Document, InterruptInfo, Message};

use crate::error::FlowError;

/// A live stream of message fragments
///
/// Pull-based: nothing is read from the underlying node stream until the
/// consumer polls.
pub type MessageStream = BoxStream<'static, Result<Message, FlowError>>;

/// Tag identifying the variant of an [`AgentEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ChatModelAnswer,
    ToolsAsChatModelStream,
    FuncCall,
    ToolsMessage,
    Suggest,
    Knowledge,
    Interrupt,
}

/// Events emitted by the pipeline during one agent run
pub enum AgentEvent {
    /// Streamed answer from the chat model
    ChatModelAnswer { stream: MessageStream },

    /// Streamed output of a return-directly tool, mirrored live as if
    /// it were model-generated text
    ToolsAsChatModelStream { stream: MessageStream },

    /// The assistant invoked a tool
    FuncCall { message: Message },

    /// Complete tool response message(s)
    ToolsMessage { messages: Vec<Message> },

    /// A follow-up suggestion for the user
    Suggest { message: Message },

    /// Knowledge retrieval results
    Knowledge { documents: Vec<Document> },

    /// The run paused awaiting external input
    Interrupt { info: InterruptInfo },
}

impl AgentEvent {
    /// The variant tag of this event
    pub fn event_type(&self) -> EventType {
        match self {
            Self::ChatModelAnswer { .. } => EventType::ChatModelAnswer,
            Self::ToolsAsChatModelStream { .. } => EventType::ToolsAsChatModelStream,
            Self::FuncCall { .. } => EventType::FuncCall,
            Self::ToolsMessage { .. } => EventType::ToolsMessage,
            Self::Suggest { .. } => EventType::Suggest,
            Self::Knowledge { .. } => EventType::Knowledge,
            Self::Interrupt { .. } => EventType::Interrupt,
        }
    }
}

impl fmt::Debug for AgentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChatModelAnswer { .. } => f.write_str("ChatModelAnswer { stream }"),
            Self::ToolsAsChatModelStream { .. } => {
                f.write_str("ToolsAsChatModelStream { stream }")
            }
            Self::FuncCall { message } => f.debug_struct("FuncCall").field("message", message).finish(),
            Self::ToolsMessage { messages } => f
                .debug_struct("ToolsMessage")
                .field("messages", messages)
                .finish(),
            Self::Suggest { message } => f.debug_struct("Suggest").field("message", message).finish(),
            Self::Knowledge { documents } => f
                .debug_struct("Knowledge")
                .field("documents", documents)
                .finish(),
            Self::Interrupt { info } => f.debug_struct("Interrupt").field("info", info).finish(),
        }
    }
}
