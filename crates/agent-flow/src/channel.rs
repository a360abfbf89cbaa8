//! Bounded event channel between the pipeline and the consumer
//!
//! Multi-producer (parallel graph branches clone the sender), single
//! consumer. The small capacity is intentional flow control: a slow
//! consumer blocks the sending callback, which blocks that branch of
//! the engine. A consumer that goes away entirely must not wedge the
//! engine, so sends into a closed channel are dropped instead of
//! propagated as failures.

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::error::FlowError;
use crate::event::AgentEvent;

/// Capacity of the event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 10;

/// Create a bounded event channel
pub fn event_channel() -> (EventSender, EventStream) {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    (EventSender { tx }, EventStream { rx })
}

/// Sending half of the event channel
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Result<AgentEvent, FlowError>>,
}

impl EventSender {
    /// Send an event, blocking while the channel is full.
    ///
    /// Returns `false` if the consumer is gone and the event was dropped.
    pub async fn send(&self, event: AgentEvent) -> bool {
        let event_type = event.event_type();
        if self.tx.send(Ok(event)).await.is_err() {
            debug!(?event_type, "consumer gone, dropping event");
            return false;
        }
        true
    }

    /// Send the terminal error signal for a true failure
    pub async fn send_error(&self, err: FlowError) {
        if self.tx.send(Err(err)).await.is_err() {
            debug!("consumer gone, dropping terminal error");
        }
    }
}

/// Receiving half of the event channel
pub struct EventStream {
    rx: mpsc::Receiver<Result<AgentEvent, FlowError>>,
}

impl EventStream {
    /// Receive the next event.
    ///
    /// `None` means the run finished and every sender was dropped. An
    /// `Err` item is the terminal error signal of a true failure.
    pub async fn recv(&mut self) -> Option<Result<AgentEvent, FlowError>> {
        self.rx.recv().await
    }

    /// Non-blocking receive, mainly for tests
    pub fn try_recv(&mut self) -> Option<Result<AgentEvent, FlowError>> {
        self.rx.try_recv().ok()
    }

    /// Adapt into a `futures::Stream` for SSE-style writers
    pub fn into_stream(self) -> ReceiverStream<Result<AgentEvent, FlowError>> {
        ReceiverStream::new(self.rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::Message;

    #[tokio::test]
    async fn test_send_and_recv() {
        let (tx, mut rx) = event_channel();

        assert!(
            tx.send(AgentEvent::FuncCall {
                message: Message::assistant("call"),
            })
            .await
        );

        match rx.recv().await {
            Some(Ok(AgentEvent::FuncCall { message })) => assert_eq!(message.content, "call"),
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_closed_consumer_drops_events() {
        let (tx, rx) = event_channel();
        drop(rx);

        let delivered = tx
            .send(AgentEvent::ToolsMessage { messages: vec![] })
            .await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_channel_closes_when_senders_drop() {
        let (tx, mut rx) = event_channel();
        drop(tx);
        assert!(rx.recv().await.is_none());
    }
}
