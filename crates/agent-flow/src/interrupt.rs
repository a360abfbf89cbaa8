//! Extraction of client-facing interruption metadata
//!
//! The engine reports a pause as a nested [`InterruptSignal`]; this
//! module locates the relevant sub-graph record, identifies the paused
//! tool call, and partitions the per-call resumption payloads into an
//! [`InterruptInfo`].

use tracing::warn;

use flow_core::{InterruptInfo, InterruptSignal, InterruptType, ToolRerunKind};

use crate::callback::node;

/// Map an engine-level payload variant to the client-facing category.
///
/// Unmapped variants fall back to `Generic` rather than guessing.
pub fn interrupt_type_for(kind: ToolRerunKind) -> InterruptType {
    match kind {
        ToolRerunKind::Plugin => InterruptType::LocalPlugin,
        ToolRerunKind::OauthPlugin => InterruptType::OauthPlugin,
        ToolRerunKind::Question => InterruptType::Question,
        ToolRerunKind::RequireInfos => InterruptType::RequireInfos,
        ToolRerunKind::SceneChat => InterruptType::SceneChat,
        ToolRerunKind::InputNode => InterruptType::InputNode,
        ToolRerunKind::WorkflowPlugin => InterruptType::WorkflowLocalPlugin,
        ToolRerunKind::WorkflowLlm => InterruptType::WorkflowLlm,
        ToolRerunKind::Unspecified => InterruptType::Generic,
    }
}

/// Derive the resumable [`InterruptInfo`] for one interruption.
///
/// Exactly one paused call is expected per interruption; if the engine
/// reports more, the first in iteration order is chosen and the rest
/// only ride along in `all_tool_interrupt_data`.
pub fn extract_interrupt(execute_id: &str, signal: &InterruptSignal) -> InterruptInfo {
    let mut info = InterruptInfo {
        interrupt_id: execute_id.to_string(),
        tool_call_id: String::new(),
        interrupt_type: InterruptType::Generic,
        all_tool_interrupt_data: Default::default(),
    };

    let sub_graph = signal
        .sub_graphs
        .get(node::REACT_AGENT)
        .or_else(|| {
            let first = signal.sub_graphs.iter().next();
            if let Some((name, _)) = first {
                warn!(sub_graph = %name, "no {} record, using first sub-graph", node::REACT_AGENT);
            }
            first.map(|(_, sub)| sub)
        });

    let Some(sub_graph) = sub_graph else {
        warn!(execute_id, "interrupt signal carries no sub-graph records");
        return info;
    };

    let Some((_, extra)) = sub_graph.rerun_nodes.iter().next() else {
        warn!(execute_id, "interrupted sub-graph carries no rerun nodes");
        return info;
    };

    if extra.rerun_extra.len() > 1 {
        warn!(
            execute_id,
            paused_calls = extra.rerun_extra.len(),
            "multiple paused tool calls reported, keeping the first"
        );
    }

    for (call_id, event) in &extra.rerun_extra {
        if info.tool_call_id.is_empty() {
            info.tool_call_id = call_id.clone();
            info.interrupt_type = interrupt_type_for(event.kind);
        }
        info.all_tool_interrupt_data
            .insert(call_id.clone(), event.clone());
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::ToolInterruptEvent;

    fn event(call_id: &str, kind: ToolRerunKind) -> ToolInterruptEvent {
        ToolInterruptEvent {
            tool_call_id: call_id.to_string(),
            tool_name: "some_tool".to_string(),
            kind,
            data: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_mapping_table() {
        assert_eq!(
            interrupt_type_for(ToolRerunKind::Plugin),
            InterruptType::LocalPlugin
        );
        assert_eq!(
            interrupt_type_for(ToolRerunKind::OauthPlugin),
            InterruptType::OauthPlugin
        );
        assert_eq!(
            interrupt_type_for(ToolRerunKind::WorkflowPlugin),
            InterruptType::WorkflowLocalPlugin
        );
        assert_eq!(
            interrupt_type_for(ToolRerunKind::Unspecified),
            InterruptType::Generic
        );
    }

    #[test]
    fn test_extract_single_call() {
        let signal = InterruptSignal::single(
            node::REACT_AGENT,
            node::AGENT_TOOLS,
            [event("call-1", ToolRerunKind::Question)],
        );

        let info = extract_interrupt("exec-1", &signal);
        assert_eq!(info.interrupt_id, "exec-1");
        assert_eq!(info.tool_call_id, "call-1");
        assert_eq!(info.interrupt_type, InterruptType::Question);
        assert!(info.all_tool_interrupt_data.contains_key("call-1"));
    }

    #[test]
    fn test_extract_picks_first_of_many_deterministically() {
        let signal = InterruptSignal::single(
            node::REACT_AGENT,
            node::AGENT_TOOLS,
            [
                event("call-b", ToolRerunKind::OauthPlugin),
                event("call-a", ToolRerunKind::Question),
            ],
        );

        let info = extract_interrupt("exec-1", &signal);
        // BTreeMap iteration order: "call-a" sorts first.
        assert_eq!(info.tool_call_id, "call-a");
        assert_eq!(info.interrupt_type, InterruptType::Question);
        assert_eq!(info.all_tool_interrupt_data.len(), 2);
    }

    #[test]
    fn test_extract_falls_back_to_first_sub_graph() {
        let signal = InterruptSignal::single(
            "some_other_graph",
            node::AGENT_TOOLS,
            [event("call-1", ToolRerunKind::Plugin)],
        );

        let info = extract_interrupt("exec-1", &signal);
        assert_eq!(info.tool_call_id, "call-1");
        assert_eq!(info.interrupt_type, InterruptType::LocalPlugin);
    }

    #[test]
    fn test_extract_empty_signal() {
        let info = extract_interrupt("exec-1", &InterruptSignal::default());
        assert_eq!(info.interrupt_id, "exec-1");
        assert!(info.tool_call_id.is_empty());
        assert_eq!(info.interrupt_type, InterruptType::Generic);
        assert!(info.all_tool_interrupt_data.is_empty());
    }
}
