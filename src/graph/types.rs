//! Abstract graph types handed to the external renderer.
//!
//! No coordinates, no styling: nodes and edges carry identity plus the
//! advisory flags the layout engine turns into visuals.

use serde::Serialize;

/// What a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// A pipeline agent instance (or a placeholder for a not-yet-started stage)
    Agent,
    /// An intermediate file-group batch between orchestrator and domain agents
    FileGroup,
}

/// Display counters attached to a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeBadges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// One node of the derived process graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    /// Progressive reveal: hidden nodes exist but the renderer keeps them off
    /// screen until their upstream stage has progressed.
    pub visible: bool,
    /// Chosen/active highlight: working now, or has completed work.
    pub chosen: bool,
    pub label: String,
    pub badges: NodeBadges,
}

/// One edge of the derived process graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    /// Both endpoints are individually chosen.
    pub chosen: bool,
    /// The destination endpoint is currently processing.
    pub highlight_processing: bool,
}

/// The complete derived graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}
