//! Lifecycle-hook contract consumed from the graph execution engine
//!
//! The engine invokes one hook per node lifecycle event, identifying the
//! node by component kind and logical name. Payload shape depends on the
//! component, so non-streamed payloads arrive as [`CallbackData`] and
//! streamed output as a [`NodeStream`] of [`StreamChunk`]s.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use flow_core::{Document, Message};

use crate::error::FlowError;
use crate::event::MessageStream;

/// Logical node names used by the agent graph
pub mod node {
    /// The ReAct agent sub-graph
    pub const REACT_AGENT: &str = "react_agent";
    /// Tool-invocation node inside the ReAct agent
    pub const AGENT_TOOLS: &str = "agent_tool";
    /// Chat model inside the ReAct agent
    pub const REACT_CHAT_MODEL: &str = "re_act_chat_model";
    /// Plain chat model node (agent without tools)
    pub const LLM: &str = "llm";
    /// Knowledge retrieval node
    pub const KNOWLEDGE_RETRIEVER: &str = "knowledge_retriever";
    /// Pre-tool-retrieval node
    pub const TOOLS_PRE_RETRIEVER: &str = "tools_pre_retriever";
    /// Suggestion parser node
    pub const SUGGEST_PARSER: &str = "suggest_parser";
}

/// Kind of component a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Graph,
    ChatModel,
    ToolsNode,
    Retriever,
    Prompt,
    Lambda,
}

/// Identity of the node that fired a callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub component: ComponentKind,
    pub name: String,
}

impl RunInfo {
    pub fn new(component: ComponentKind, name: impl Into<String>) -> Self {
        Self {
            component,
            name: name.into(),
        }
    }
}

/// Non-streamed callback payload
#[derive(Debug, Clone)]
pub enum CallbackData {
    Message(Message),
    Messages(Vec<Message>),
    Documents(Vec<Document>),
}

/// One chunk of a node's streamed output
#[derive(Debug, Clone)]
pub enum StreamChunk {
    /// A chat-model message fragment
    Message(Message),

    /// One batch of per-call tool output chunks, positionally indexed.
    /// `None` means no chunk for that call in this batch.
    ToolBatch(Vec<Option<Message>>),
}

/// Streamed output of one node, delivered to `on_end_with_stream`.
///
/// The engine guarantees a single sequential reader. Receiving `None`
/// means end-of-stream; an `Err` item is a read error and the stream
/// must not be read further.
pub struct NodeStream {
    rx: mpsc::Receiver<Result<StreamChunk, FlowError>>,
}

impl NodeStream {
    /// Create a bounded node stream pipe
    pub fn channel(capacity: usize) -> (mpsc::Sender<Result<StreamChunk, FlowError>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }

    /// Receive the next chunk
    pub async fn recv(&mut self) -> Option<Result<StreamChunk, FlowError>> {
        self.rx.recv().await
    }

    /// Close the stream and consume whatever is left so the writing
    /// side never blocks on an abandoned pipe.
    pub async fn drain(mut self) {
        self.rx.close();
        while self.rx.recv().await.is_some() {}
    }

    /// Convert into a lazy stream of chat-model message fragments.
    ///
    /// Conversion happens per chunk as the consumer polls; nothing is
    /// read eagerly.
    pub fn into_message_stream(self, node: impl Into<String>) -> MessageStream {
        let node = node.into();
        ReceiverStream::new(self.rx)
            .map(move |item| match item {
                Ok(StreamChunk::Message(msg)) => Ok(msg),
                Ok(StreamChunk::ToolBatch(_)) => Err(FlowError::UnexpectedChunk {
                    node: node.clone(),
                }),
                Err(err) => Err(err),
            })
            .boxed()
    }
}

/// Lifecycle hooks invoked by the execution engine for each node.
///
/// Distinct branches of a parallel graph may invoke hooks concurrently,
/// so implementors hold no per-call mutable state behind `&self`.
#[async_trait]
pub trait NodeCallbacks: Send + Sync {
    /// A node started executing
    async fn on_start(&self, info: &RunInfo, input: CallbackData);

    /// A node finished with a materialized output
    async fn on_end(&self, info: &RunInfo, output: CallbackData);

    /// A node finished with streamed output
    async fn on_end_with_stream(&self, info: &RunInfo, output: NodeStream);

    /// A node (or the graph) reported an error
    async fn on_error(&self, info: &RunInfo, err: FlowError);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_node_stream_recv_and_eof() {
        let (tx, mut stream) = NodeStream::channel(4);
        tx.send(Ok(StreamChunk::Message(Message::assistant("hi"))))
            .await
            .unwrap();
        drop(tx);

        match stream.recv().await {
            Some(Ok(StreamChunk::Message(msg))) => assert_eq!(msg.content, "hi"),
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_drain_unblocks_writer() {
        let (tx, stream) = NodeStream::channel(1);
        tx.send(Ok(StreamChunk::Message(Message::assistant("a"))))
            .await
            .unwrap();

        stream.drain().await;

        // The pipe is closed; further writes fail instead of blocking.
        assert!(tx
            .send(Ok(StreamChunk::Message(Message::assistant("b"))))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_into_message_stream_converts_lazily() {
        let (tx, stream) = NodeStream::channel(4);
        tx.send(Ok(StreamChunk::Message(Message::assistant("one"))))
            .await
            .unwrap();
        tx.send(Ok(StreamChunk::ToolBatch(vec![]))).await.unwrap();
        drop(tx);

        let mut messages = stream.into_message_stream("llm");
        let first = messages.next().await.unwrap().unwrap();
        assert_eq!(first.content, "one");

        match messages.next().await {
            Some(Err(FlowError::UnexpectedChunk { node })) => assert_eq!(node, "llm"),
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(messages.next().await.is_none());
    }
}
