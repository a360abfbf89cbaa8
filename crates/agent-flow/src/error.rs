//! Error types for the event pipeline
//!
//! There are only two classes of run outcome besides success: an
//! interruption (a recoverable pause, surfaced to the consumer as a
//! normal `Interrupt` event) and a true failure (terminates the event
//! stream after one error signal).

use flow_core::InterruptSignal;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors raised by graph execution or the pipeline itself
#[derive(Debug, Error)]
pub enum FlowError {
    /// Graph execution paused awaiting external input. Not a failure;
    /// the pipeline turns it into an `Interrupt` event.
    #[error("graph run interrupted")]
    Interrupted(InterruptSignal),

    /// A node genuinely failed
    #[error(transparent)]
    Node(#[from] anyhow::Error),

    /// A streamed payload did not match the node's expected chunk shape
    #[error("unexpected stream chunk from node {node}")]
    UnexpectedChunk { node: String },

    /// Core data-model error
    #[error("core error: {0}")]
    Core(#[from] flow_core::Error),
}

impl FlowError {
    /// Extract the interruption signal if this error represents a pause
    pub fn interrupt_signal(&self) -> Option<&InterruptSignal> {
        match self {
            Self::Interrupted(signal) => Some(signal),
            _ => None,
        }
    }

    /// Create a node failure from a plain message
    pub fn node_failed(message: impl Into<String>) -> Self {
        Self::Node(anyhow::anyhow!(message.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_signal_extraction() {
        let err = FlowError::Interrupted(InterruptSignal::default());
        assert!(err.interrupt_signal().is_some());

        let err = FlowError::node_failed("boom");
        assert!(err.interrupt_signal().is_none());
    }
}
