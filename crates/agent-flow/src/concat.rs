//! Concatenation of streamed tool-execution output
//!
//! A tool-execution node streams batches of per-call message chunks,
//! positionally indexed. This module folds them into one final message
//! per call, and mirrors chunks of "return directly" tools onto a live
//! pass-through stream that imitates model output.

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use flow_core::{concat_messages, Message};

use crate::callback::{node, NodeStream, StreamChunk};
use crate::channel::EventSender;
use crate::error::{FlowError, Result};
use crate::event::AgentEvent;
use crate::run::ReturnDirectSet;

/// Capacity of the lazily-opened pass-through pipe
pub const PASS_THROUGH_CAPACITY: usize = 5;

/// Folds one tool-execution node's streamed output into final per-call
/// messages, forwarding return-directly chunks live.
pub struct ToolOutputConcat {
    return_direct: ReturnDirectSet,
}

impl ToolOutputConcat {
    pub fn new(return_direct: ReturnDirectSet) -> Self {
        Self { return_direct }
    }

    /// Consume the source stream to completion and return the final
    /// messages in original call order.
    ///
    /// The `ToolsAsChatModelStream` event is sent on `events` the first
    /// time a chunk of a return-directly call is forwarded; the
    /// pass-through stream closes when this method returns. A read
    /// error from the source stops collection immediately and is
    /// mirrored onto the open pass-through before propagating.
    pub async fn collect(
        &self,
        mut source: NodeStream,
        events: &EventSender,
    ) -> Result<Vec<Message>> {
        let mut chunks_by_index: Vec<Vec<Message>> = Vec::new();
        // Pass-through membership per index. Decided once, from the
        // first non-empty chunk at that index, and sticky afterwards.
        let mut bound: Vec<Option<bool>> = Vec::new();
        let mut sized = false;
        let mut pass_through: Option<mpsc::Sender<Result<Message>>> = None;

        while let Some(item) = source.recv().await {
            let batch = match item {
                Ok(StreamChunk::ToolBatch(batch)) => batch,
                Ok(StreamChunk::Message(_)) => {
                    let err = FlowError::UnexpectedChunk {
                        node: node::AGENT_TOOLS.to_string(),
                    };
                    self.abort_pass_through(&mut pass_through, &err).await;
                    return Err(err);
                }
                Err(err) => {
                    self.abort_pass_through(&mut pass_through, &err).await;
                    return Err(err);
                }
            };

            if !sized {
                sized = true;
                chunks_by_index = batch.iter().map(|_| Vec::new()).collect();
                bound = vec![None; batch.len()];
            }
            // A later batch may report more calls than the first one.
            if batch.len() > chunks_by_index.len() {
                chunks_by_index.resize_with(batch.len(), Vec::new);
                bound.resize(batch.len(), None);
            }

            for (index, chunk) in batch.into_iter().enumerate() {
                let Some(msg) = chunk else {
                    continue;
                };

                if bound[index].is_none() {
                    let direct = msg
                        .tool_name
                        .as_deref()
                        .is_some_and(|name| self.return_direct.contains(name));
                    bound[index] = Some(direct);
                }

                if bound[index] == Some(true) {
                    if pass_through.is_none() {
                        let (tx, rx) = mpsc::channel(PASS_THROUGH_CAPACITY);
                        let stream = ReceiverStream::new(rx).boxed();
                        events
                            .send(AgentEvent::ToolsAsChatModelStream { stream })
                            .await;
                        pass_through = Some(tx);
                    }
                    if let Some(tx) = &pass_through {
                        if tx.send(Ok(msg.clone())).await.is_err() {
                            debug!(index, "pass-through consumer gone, chunk not mirrored");
                        }
                    }
                }

                chunks_by_index[index].push(msg);
            }
        }

        let mut final_messages = Vec::with_capacity(chunks_by_index.len());
        for chunks in &chunks_by_index {
            final_messages.push(concat_messages(chunks)?);
        }

        // Dropping the sender closes the pass-through stream.
        Ok(final_messages)
    }

    /// Mirror a source read error onto the open pass-through stream,
    /// then close it.
    async fn abort_pass_through(
        &self,
        pass_through: &mut Option<mpsc::Sender<Result<Message>>>,
        err: &FlowError,
    ) {
        if let Some(tx) = pass_through.take() {
            let mirrored = FlowError::node_failed(err.to_string());
            if tx.send(Err(mirrored)).await.is_err() {
                debug!("pass-through consumer gone, error not mirrored");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::event_channel;
    use crate::event::MessageStream;

    fn chunk(content: &str) -> Option<Message> {
        Some(Message::assistant(content))
    }

    fn tool_chunk(content: &str, call_id: &str, tool_name: &str) -> Option<Message> {
        Some(Message::tool(content, call_id).with_tool_name(tool_name))
    }

    async fn send_batches(
        tx: &mpsc::Sender<Result<StreamChunk>>,
        batches: Vec<Vec<Option<Message>>>,
    ) {
        for batch in batches {
            tx.send(Ok(StreamChunk::ToolBatch(batch))).await.unwrap();
        }
    }

    async fn drain_messages(mut stream: MessageStream) -> Vec<Result<Message>> {
        let mut out = Vec::new();
        while let Some(item) = stream.next().await {
            out.push(item);
        }
        out
    }

    #[tokio::test]
    async fn test_preserves_call_order() {
        let (tx, source) = NodeStream::channel(8);
        send_batches(
            &tx,
            vec![
                vec![chunk("a"), chunk("x"), chunk("1")],
                vec![chunk("b"), None, chunk("2")],
            ],
        )
        .await;
        drop(tx);

        let (events, _rx) = event_channel();
        let concat = ToolOutputConcat::new(ReturnDirectSet::default());
        let finals = concat.collect(source, &events).await.unwrap();

        assert_eq!(finals.len(), 3);
        assert_eq!(finals[0].content, "ab");
        assert_eq!(finals[1].content, "x");
        assert_eq!(finals[2].content, "12");
    }

    #[tokio::test]
    async fn test_concatenates_chunks() {
        let (tx, source) = NodeStream::channel(8);
        send_batches(&tx, vec![vec![chunk("Hello")], vec![chunk(" world")]]).await;
        drop(tx);

        let (events, _rx) = event_channel();
        let concat = ToolOutputConcat::new(ReturnDirectSet::default());
        let finals = concat.collect(source, &events).await.unwrap();

        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].content, "Hello world");
    }

    #[tokio::test]
    async fn test_return_direct_end_to_end() {
        // Two calls; call 1 ("search") is return-direct.
        let (tx, source) = NodeStream::channel(8);
        send_batches(
            &tx,
            vec![
                vec![
                    tool_chunk("A", "call-0", "calc"),
                    tool_chunk("1", "call-1", "search"),
                ],
                vec![tool_chunk("B", "call-0", "calc"), None],
                vec![None, tool_chunk("2", "call-1", "search")],
            ],
        )
        .await;
        drop(tx);

        let (events, mut rx) = event_channel();
        let concat = ToolOutputConcat::new(ReturnDirectSet::new(["search"]));
        let finals = concat.collect(source, &events).await.unwrap();

        assert_eq!(finals.len(), 2);
        assert_eq!(finals[0].content, "AB");
        assert_eq!(finals[1].content, "12");

        let stream = match rx.try_recv() {
            Some(Ok(AgentEvent::ToolsAsChatModelStream { stream })) => stream,
            other => panic!("expected pass-through event, got {other:?}"),
        };
        let mirrored = drain_messages(stream).await;
        let contents: Vec<String> = mirrored
            .into_iter()
            .map(|item| item.unwrap().content)
            .collect();
        assert_eq!(contents, vec!["1", "2"]);

        // Nothing else was emitted for the non-direct call.
        assert!(rx.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_binding_is_sticky() {
        // First chunk at index 0 is not return-direct; a later chunk at
        // the same index claims a direct tool name but must stay bound
        // to the original routing.
        let (tx, source) = NodeStream::channel(8);
        send_batches(
            &tx,
            vec![
                vec![tool_chunk("a", "call-0", "calc")],
                vec![tool_chunk("b", "call-0", "search")],
            ],
        )
        .await;
        drop(tx);

        let (events, mut rx) = event_channel();
        let concat = ToolOutputConcat::new(ReturnDirectSet::new(["search"]));
        let finals = concat.collect(source, &events).await.unwrap();

        assert_eq!(finals[0].content, "ab");
        assert!(rx.try_recv().is_none(), "no pass-through stream expected");
    }

    #[tokio::test]
    async fn test_source_error_stops_and_mirrors() {
        let (tx, source) = NodeStream::channel(8);
        send_batches(&tx, vec![vec![tool_chunk("1", "call-0", "search")]]).await;
        tx.send(Err(FlowError::node_failed("backend exploded")))
            .await
            .unwrap();
        // A batch after the error must never be consumed.
        send_batches(&tx, vec![vec![tool_chunk("2", "call-0", "search")]]).await;
        drop(tx);

        let (events, mut rx) = event_channel();
        let concat = ToolOutputConcat::new(ReturnDirectSet::new(["search"]));
        let err = concat.collect(source, &events).await.unwrap_err();
        assert!(matches!(err, FlowError::Node(_)));

        let stream = match rx.try_recv() {
            Some(Ok(AgentEvent::ToolsAsChatModelStream { stream })) => stream,
            other => panic!("expected pass-through event, got {other:?}"),
        };
        let mirrored = drain_messages(stream).await;
        assert_eq!(mirrored.len(), 2);
        assert_eq!(mirrored[0].as_ref().unwrap().content, "1");
        assert!(mirrored[1].is_err());
    }

    #[tokio::test]
    async fn test_later_batch_grows_call_count() {
        let (tx, source) = NodeStream::channel(8);
        send_batches(
            &tx,
            vec![vec![chunk("a")], vec![chunk("b"), chunk("late")]],
        )
        .await;
        drop(tx);

        let (events, _rx) = event_channel();
        let concat = ToolOutputConcat::new(ReturnDirectSet::default());
        let finals = concat.collect(source, &events).await.unwrap();

        assert_eq!(finals.len(), 2);
        assert_eq!(finals[0].content, "ab");
        assert_eq!(finals[1].content, "late");
    }
}
