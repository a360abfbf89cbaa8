//! Translation of node lifecycle callbacks into agent events
//!
//! `ReplyHandler` is the pipeline's implementation of the engine's
//! lifecycle-hook contract. It classifies each callback by node
//! identity, delegates to the concatenator and interrupt extractor
//! where needed, and emits normalized events onto the event channel.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, error, info};

use flow_core::{InterruptSignal, Message, Role};

use crate::callback::{node, CallbackData, ComponentKind, NodeCallbacks, NodeStream, RunInfo};
use crate::channel::{event_channel, EventSender, EventStream};
use crate::concat::ToolOutputConcat;
use crate::error::FlowError;
use crate::event::AgentEvent;
use crate::interrupt::extract_interrupt;
use crate::run::ReturnDirectSet;

/// Placeholder content of the tool message emitted alongside an
/// interruption, signalling that the reply was delivered live.
pub const DIRECT_REPLY_PLACEHOLDER: &str = "directly streaming reply";

/// Create the reply pipeline for one run.
///
/// Returns the lifecycle handler to register with the engine and the
/// event stream for the downstream consumer. The channel closes when
/// the handler (and any sender clones) are dropped at end of run.
pub fn reply_pipeline(
    execute_id: impl Into<String>,
    return_direct: ReturnDirectSet,
) -> (ReplyHandler, EventStream) {
    let (events, stream) = event_channel();
    let handler = ReplyHandler {
        events,
        execute_id: execute_id.into(),
        concat: ToolOutputConcat::new(return_direct),
        failed: AtomicBool::new(false),
    };
    (handler, stream)
}

/// Lifecycle-hook implementation emitting [`AgentEvent`]s
pub struct ReplyHandler {
    events: EventSender,
    execute_id: String,
    concat: ToolOutputConcat,
    /// Latched after a true failure; later callbacks become no-ops so
    /// nothing follows the terminal error signal.
    failed: AtomicBool,
}

impl ReplyHandler {
    fn is_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    async fn fail(&self, err: FlowError) {
        self.failed.store(true, Ordering::SeqCst);
        self.events.send_error(err).await;
    }

    async fn handle_interrupt(&self, signal: &InterruptSignal) {
        let interrupt = extract_interrupt(&self.execute_id, signal);
        info!(
            execute_id = %self.execute_id,
            tool_call_id = %interrupt.tool_call_id,
            interrupt_type = ?interrupt.interrupt_type,
            "run interrupted, awaiting external input"
        );

        // Tell the client the actual reply was streamed live, then hand
        // over the resumable interruption metadata.
        let placeholder = Message::tool(DIRECT_REPLY_PLACEHOLDER, interrupt.tool_call_id.clone());
        self.events
            .send(AgentEvent::ToolsMessage {
                messages: vec![placeholder],
            })
            .await;
        self.events
            .send(AgentEvent::Interrupt { info: interrupt })
            .await;
    }
}

/// Parse a suggestion-parser output message into one message per
/// suggestion. The content is expected to be a JSON array of strings;
/// anything else yields no suggestions.
fn parse_suggestions(msg: &Message) -> Vec<Message> {
    if msg.content.is_empty() {
        return Vec::new();
    }

    let Ok(suggestions) = serde_json::from_str::<Vec<String>>(&msg.content) else {
        debug!("suggestion content is not a JSON string array, skipping");
        return Vec::new();
    };

    suggestions
        .into_iter()
        .map(|suggestion| Message {
            role: msg.role,
            content: suggestion,
            tool_call_id: None,
            tool_name: None,
            response_meta: msg.response_meta.clone(),
        })
        .collect()
}

#[async_trait]
impl NodeCallbacks for ReplyHandler {
    async fn on_start(&self, info: &RunInfo, input: CallbackData) {
        if self.is_failed() {
            return;
        }

        if info.component != ComponentKind::ToolsNode || info.name != node::AGENT_TOOLS {
            return;
        }

        match input {
            CallbackData::Message(message) => {
                self.events.send(AgentEvent::FuncCall { message }).await;
            }
            other => debug!(name = %info.name, payload = ?other, "unexpected tools node input"),
        }
    }

    async fn on_end(&self, info: &RunInfo, output: CallbackData) {
        if self.is_failed() {
            return;
        }

        match info.name.as_str() {
            node::KNOWLEDGE_RETRIEVER => {
                if let CallbackData::Documents(documents) = output {
                    if !documents.is_empty() {
                        self.events.send(AgentEvent::Knowledge { documents }).await;
                    }
                }
            }
            node::TOOLS_PRE_RETRIEVER => {
                // Pre-called tools arrive as alternating "assistant asks"
                // / "tool answers" messages; split preserving order.
                if let CallbackData::Messages(messages) = output {
                    for message in messages {
                        let event = if message.role == Role::Tool {
                            AgentEvent::ToolsMessage {
                                messages: vec![message],
                            }
                        } else {
                            AgentEvent::FuncCall { message }
                        };
                        self.events.send(event).await;
                    }
                }
            }
            node::SUGGEST_PARSER => {
                if let CallbackData::Message(message) = output {
                    for suggestion in parse_suggestions(&message) {
                        self.events
                            .send(AgentEvent::Suggest {
                                message: suggestion,
                            })
                            .await;
                    }
                }
            }
            _ => {}
        }
    }

    async fn on_end_with_stream(&self, info: &RunInfo, output: NodeStream) {
        if self.is_failed() {
            output.drain().await;
            return;
        }

        match info.component {
            ComponentKind::Graph | ComponentKind::ChatModel => {
                if info.name != node::REACT_CHAT_MODEL && info.name != node::LLM {
                    output.drain().await;
                    return;
                }

                // Hand the converted stream to the consumer undrained;
                // it pulls chunks at its own pace.
                let stream = output.into_message_stream(info.name.clone());
                self.events.send(AgentEvent::ChatModelAnswer { stream }).await;
            }
            ComponentKind::ToolsNode => {
                match self.concat.collect(output, &self.events).await {
                    Ok(messages) => {
                        self.events.send(AgentEvent::ToolsMessage { messages }).await;
                    }
                    Err(err) => {
                        error!(name = %info.name, error = %err, "tool output collection failed");
                        self.fail(err).await;
                    }
                }
            }
            _ => {
                output.drain().await;
            }
        }
    }

    async fn on_error(&self, info: &RunInfo, err: FlowError) {
        if self.is_failed() {
            return;
        }

        // Node errors re-fire at the graph level as they propagate;
        // only the graph-level callback is acted on.
        if info.component != ComponentKind::Graph {
            return;
        }

        if let Some(signal) = err.interrupt_signal() {
            // Interruptions are emitted once, at the outermost
            // propagation point, where the node name is empty.
            if !info.name.is_empty() {
                return;
            }
            self.handle_interrupt(signal).await;
        } else {
            error!(
                component = ?info.component,
                name = %info.name,
                error = %err,
                "node execution failed"
            );
            self.fail(err).await;
        }
    }
}
