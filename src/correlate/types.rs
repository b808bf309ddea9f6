//! Instance-centric routing view types.

use crate::state::{AgentType, InstanceId, RoutingDecision};
use serde::Serialize;

/// One file attributed to an instance, with its routing decision when one
/// matched. A missing decision is a partial-information display state, not
/// an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAssignment {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<RoutingDecision>,
}

/// One agent instance's share of the routed files.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceAssignment {
    pub instance: InstanceId,
    /// Human label (e.g. "Group 1") when part of a multi-instance split.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Synthesized from decisions alone; no live instance exists yet.
    pub placeholder: bool,
    pub files: Vec<FileAssignment>,
}

impl InstanceAssignment {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// All instances of one base agent type, grouped for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSection {
    pub agent: AgentType,
    pub instances: Vec<InstanceAssignment>,
    pub total_files: usize,
}
