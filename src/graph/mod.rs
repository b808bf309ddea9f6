//! Graph derivation module.
//!
//! Pure function from a [`PipelineSnapshot`] to the abstract process graph
//! the renderer lays out: agent nodes with progressive-reveal visibility,
//! synthesized file-group nodes, and edges routed along the deployment
//! topology. Deterministic for a given snapshot, so derivations are safe to
//! memoize by snapshot revision.

mod topology;
mod types;

pub use topology::Topology;
pub use types::{GraphEdge, GraphNode, NodeBadges, NodeKind, ProcessGraph};

use crate::state::{AgentState, AgentStatus, AgentType, FileGroup, PipelineSnapshot};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Per-stage endpoint summary used while routing edges.
struct Endpoint {
    id: String,
    visible: bool,
    chosen: bool,
    processing: bool,
}

/// A file group plus its derived activity flag.
struct GroupInfo {
    group: FileGroup,
    active: bool,
}

/// Derive the abstract process graph from a snapshot.
///
/// Visibility rules (progressive reveal):
/// - triage is always visible;
/// - the orchestrator appears once triage has progressed;
/// - domain agents and the knowledge-graph builder appear once the
///   orchestrator has progressed;
/// - an instance that has ever been non-idle stays visible on its own.
pub fn derive(snapshot: &PipelineSnapshot, topology: &Topology) -> ProcessGraph {
    let triage_done = snapshot.stage_progressed(AgentType::Triage);
    let orchestrator_done = snapshot.stage_progressed(AgentType::Orchestrator);
    let stage_visible = |base: AgentType| match base {
        AgentType::Triage => true,
        AgentType::Orchestrator => triage_done,
        _ => orchestrator_done,
    };

    let mut nodes = Vec::new();
    let mut endpoints: BTreeMap<AgentType, Vec<Endpoint>> = BTreeMap::new();

    for base in topology.stages() {
        let instances: Vec<&AgentState> = snapshot.instances_of(base).collect();
        let stage_endpoints = endpoints.entry(base).or_default();

        if instances.is_empty() {
            // Placeholder so edges stay well-formed before the stage starts.
            let visible = stage_visible(base);
            nodes.push(GraphNode {
                id: base.as_str().to_string(),
                kind: NodeKind::Agent,
                visible,
                chosen: false,
                label: base.display_name().to_string(),
                badges: NodeBadges::default(),
            });
            stage_endpoints.push(Endpoint {
                id: base.as_str().to_string(),
                visible,
                chosen: false,
                processing: false,
            });
            continue;
        }

        for state in instances {
            let visible = stage_visible(base) || state.has_progressed();
            let chosen = state.is_chosen();
            let processing = state.status == AgentStatus::Processing;
            nodes.push(GraphNode {
                id: state.id.as_str().to_string(),
                kind: NodeKind::Agent,
                visible,
                chosen,
                label: instance_label(state),
                badges: instance_badges(state),
            });
            stage_endpoints.push(Endpoint {
                id: state.id.as_str().to_string(),
                visible,
                chosen,
                processing,
            });
        }
    }

    let groups = collect_groups(snapshot);
    for info in &groups {
        nodes.push(GraphNode {
            id: info.group.group_id.clone(),
            kind: NodeKind::FileGroup,
            visible: true,
            chosen: info.active,
            label: info
                .group
                .shared_context
                .clone()
                .unwrap_or_else(|| info.group.group_id.clone()),
            badges: NodeBadges {
                files: Some(info.group.file_ids.len()),
                warnings: None,
                duration_ms: None,
            },
        });
    }

    let mut edges = Vec::new();
    // Orchestrator→group edges are emitted once per distinct group even when
    // several base edges route through it.
    let mut linked_groups: BTreeSet<&str> = BTreeSet::new();

    for (src, dst) in topology.edges() {
        let sources = &endpoints[src];
        let targets = &endpoints[dst];

        if *src == AgentType::Orchestrator {
            let through: Vec<&GroupInfo> = groups
                .iter()
                .filter(|info| info.group.target_agents.contains(dst))
                .collect();
            if !through.is_empty() {
                for info in through {
                    for source in sources.iter().filter(|e| e.visible) {
                        if linked_groups.insert(info.group.group_id.as_str()) {
                            edges.push(GraphEdge {
                                source: source.id.clone(),
                                target: info.group.group_id.clone(),
                                chosen: source.chosen && info.active,
                                highlight_processing: false,
                            });
                        }
                    }
                    for target in targets.iter().filter(|e| e.visible) {
                        edges.push(GraphEdge {
                            source: info.group.group_id.clone(),
                            target: target.id.clone(),
                            chosen: info.active && target.chosen,
                            highlight_processing: target.processing,
                        });
                    }
                }
                continue;
            }
        }

        for source in sources.iter().filter(|e| e.visible) {
            for target in targets.iter().filter(|e| e.visible) {
                edges.push(GraphEdge {
                    source: source.id.clone(),
                    target: target.id.clone(),
                    chosen: source.chosen && target.chosen,
                    highlight_processing: target.processing,
                });
            }
        }
    }

    ProcessGraph { nodes, edges }
}

/// File groups from the orchestrator's last result, with activity flags.
fn collect_groups(snapshot: &PipelineSnapshot) -> Vec<GroupInfo> {
    let mut groups = Vec::new();
    for state in snapshot.instances_of(AgentType::Orchestrator) {
        let Some(result) = &state.last_result else {
            continue;
        };
        for group in result.file_groups() {
            let active = group.target_agents.iter().any(|target| {
                snapshot.instances_of(*target).any(|a| {
                    matches!(a.status, AgentStatus::Processing | AgentStatus::Complete)
                })
            });
            groups.push(GroupInfo { group, active });
        }
    }
    groups
}

fn instance_label(state: &AgentState) -> String {
    match state.id.group_number() {
        Some(n) => format!("{} · Group {}", state.agent_type.display_name(), n),
        None => state.agent_type.display_name().to_string(),
    }
}

fn instance_badges(state: &AgentState) -> NodeBadges {
    let Some(result) = &state.last_result else {
        return NodeBadges::default();
    };
    NodeBadges {
        files: result.file_names.as_ref().map(Vec::len),
        warnings: result.warning_count(),
        duration_ms: result.duration_ms(),
    }
}

/// Revision-keyed memo for derived graphs.
///
/// The topology is fixed for a session, so the snapshot revision alone is a
/// sufficient cache key.
pub struct GraphCache {
    revision: Option<u64>,
    graph: Arc<ProcessGraph>,
}

impl GraphCache {
    pub fn new() -> Self {
        Self {
            revision: None,
            graph: Arc::new(ProcessGraph::default()),
        }
    }

    /// Return the cached graph for this revision, deriving it when stale.
    pub fn get_or_derive(
        &mut self,
        snapshot: &PipelineSnapshot,
        topology: &Topology,
    ) -> Arc<ProcessGraph> {
        if self.revision != Some(snapshot.revision) {
            self.graph = Arc::new(derive(snapshot, topology));
            self.revision = Some(snapshot.revision);
        }
        Arc::clone(&self.graph)
    }
}

impl Default for GraphCache {
    fn default() -> Self {
        Self::new()
    }
}
