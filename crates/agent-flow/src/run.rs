//! Per-run request and configuration types
//!
//! Everything that varies between runs is passed in explicitly; the
//! pipeline keeps no process-wide registries.

use std::collections::{HashMap, HashSet};

use flow_core::{InterruptInfo, Message};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate the execute id for one run
pub fn new_execute_id() -> String {
    Uuid::new_v4().to_string()
}

/// Tool names whose streamed output is additionally forwarded live as
/// if it were model-generated text. Immutable for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct ReturnDirectSet {
    names: HashSet<String>,
}

impl ReturnDirectSet {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.names.contains(tool_name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Request for one agent run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    /// Identifier of the requesting user
    pub user_id: String,

    /// The user's input message for this turn
    pub input: Message,

    /// Prior conversation turns
    #[serde(default)]
    pub history: Vec<Message>,

    /// A previously-emitted interruption, echoed verbatim to resume.
    /// The external checkpoint store reconciles it with persisted
    /// sub-graph state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_info: Option<InterruptInfo>,

    /// Per-run variable bindings for prompt assembly
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

impl AgentRequest {
    pub fn new(user_id: impl Into<String>, input: Message) -> Self {
        Self {
            user_id: user_id.into(),
            input,
            history: Vec::new(),
            resume_info: None,
            variables: HashMap::new(),
        }
    }

    /// Attach conversation history
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    /// Attach resumption info from a prior interruption
    pub fn with_resume_info(mut self, info: InterruptInfo) -> Self {
        self.resume_info = Some(info);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_direct_set() {
        let set = ReturnDirectSet::new(["search", "browse"]);
        assert!(set.contains("search"));
        assert!(!set.contains("calc"));
        assert!(!set.is_empty());
        assert!(ReturnDirectSet::default().is_empty());
    }

    #[test]
    fn test_execute_ids_unique() {
        assert_ne!(new_execute_id(), new_execute_id());
    }

    #[test]
    fn test_request_serde_roundtrip() {
        let req = AgentRequest::new("user-1", Message::user("hello"))
            .with_history(vec![Message::assistant("hi")]);
        let json = serde_json::to_string(&req).unwrap();
        let back: AgentRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user_id, "user-1");
        assert_eq!(back.history.len(), 1);
        assert!(back.resume_info.is_none());
    }
}
