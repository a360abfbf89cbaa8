//! Core library for Agent Flow
//!
//! This crate contains the shared data model for agent runs, including:
//! - Chat messages and chunk concatenation
//! - Knowledge retrieval documents
//! - Interruption metadata for resumable runs

pub mod document;
pub mod error;
pub mod interrupt;
pub mod message;

pub use document::Document;
pub use error::Error;
pub use interrupt::{
    InterruptInfo, InterruptSignal, InterruptType, SubGraphInterrupt, ToolInterruptEvent,
    ToolRerunKind, ToolsRerunExtra,
};
pub use message::{concat_messages, Message, ResponseMeta, Role, TokenUsage};

pub type Result<T> = std::result::Result<T, Error>;
