//! Agent Flow - Event pipeline for graph-driven agent runs
//!
//! This crate sits between a directed-graph execution engine running one
//! conversational turn and the client-facing output channel. It
//! translates heterogeneous node lifecycle callbacks into one ordered,
//! typed event stream, detects mid-execution interruptions and packages
//! them into resumable snapshots, and reconciles streamed multi-call
//! tool output into discrete messages plus an optional live pass-through
//! stream for "return directly" tools.

mod callback;
mod channel;
mod concat;
mod error;
mod event;
mod interrupt;
mod reply;
mod run;

pub use callback::{
    node, CallbackData, ComponentKind, NodeCallbacks, NodeStream, RunInfo, StreamChunk,
};
pub use channel::{event_channel, EventSender, EventStream, EVENT_CHANNEL_CAPACITY};
pub use concat::{ToolOutputConcat, PASS_THROUGH_CAPACITY};
pub use error::{FlowError, Result};
pub use event::{AgentEvent, EventType, MessageStream};
pub use interrupt::{extract_interrupt, interrupt_type_for};
pub use reply::{reply_pipeline, ReplyHandler, DIRECT_REPLY_PLACEHOLDER};
pub use run::{new_execute_id, AgentRequest, ReturnDirectSet};
