//! Interruption metadata for resumable runs
//!
//! A run may pause mid-execution when a tool needs external input
//! (authorization, a user answer, etc.). The engine reports the pause as
//! an [`InterruptSignal`]; the pipeline condenses it into an
//! [`InterruptInfo`] that the caller echoes back verbatim on the next
//! request to resume. Reconciling it with persisted graph state is the
//! checkpoint store's job, not this crate's.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Category of an interruption, as surfaced to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptType {
    LocalPlugin,
    Question,
    RequireInfos,
    SceneChat,
    InputNode,
    WorkflowLocalPlugin,
    OauthPlugin,
    WorkflowLlm,
    /// Fallback for engine payload variants with no explicit mapping
    Generic,
}

/// Engine-level variant of a per-call rerun payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolRerunKind {
    Plugin,
    OauthPlugin,
    Question,
    RequireInfos,
    SceneChat,
    InputNode,
    WorkflowPlugin,
    WorkflowLlm,
    Unspecified,
}

/// Resumption payload for one paused tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInterruptEvent {
    /// Identifier of the paused tool call
    pub tool_call_id: String,

    /// Name of the paused tool
    pub tool_name: String,

    /// Engine-level payload variant
    pub kind: ToolRerunKind,

    /// Opaque resumption payload, echoed back on resume
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

/// Rerun state for one interrupted tool-execution node
///
/// Keyed by tool-call id. `BTreeMap` keeps iteration order deterministic
/// so "first paused call" is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsRerunExtra {
    pub rerun_extra: BTreeMap<String, ToolInterruptEvent>,
}

/// Interruption record for one sub-graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubGraphInterrupt {
    /// Rerun state per interrupted node, keyed by node name
    pub rerun_nodes: BTreeMap<String, ToolsRerunExtra>,
}

/// Raw interruption signal reported by the execution engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterruptSignal {
    /// Interruption records keyed by sub-graph node name
    pub sub_graphs: BTreeMap<String, SubGraphInterrupt>,
}

/// Condensed interruption metadata sent to the client
///
/// Created once per interruption and immutable thereafter. The caller
/// either discards it (run completed) or echoes it back unchanged,
/// optionally augmented with the user's resumption choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptInfo {
    /// Execute id of the interrupted run
    pub interrupt_id: String,

    /// Identifier of the single paused tool call
    pub tool_call_id: String,

    /// Category of the interruption
    pub interrupt_type: InterruptType,

    /// Resumption payloads keyed by tool-call id
    #[serde(default)]
    pub all_tool_interrupt_data: HashMap<String, ToolInterruptEvent>,
}

impl InterruptSignal {
    /// Build a signal with a single interrupted node under one sub-graph
    pub fn single(
        sub_graph: impl Into<String>,
        node: impl Into<String>,
        events: impl IntoIterator<Item = ToolInterruptEvent>,
    ) -> Self {
        let rerun_extra = events
            .into_iter()
            .map(|ev| (ev.tool_call_id.clone(), ev))
            .collect();

        let mut rerun_nodes = BTreeMap::new();
        rerun_nodes.insert(node.into(), ToolsRerunExtra { rerun_extra });

        let mut sub_graphs = BTreeMap::new();
        sub_graphs.insert(sub_graph.into(), SubGraphInterrupt { rerun_nodes });

        Self { sub_graphs }
    }
}
