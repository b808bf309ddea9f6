//! Deployment-defined pipeline topology.

use crate::state::AgentType;

/// Fixed adjacency list of base-agent connections.
///
/// The derivation walks these declared edges; it never invents connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    edges: Vec<(AgentType, AgentType)>,
}

impl Topology {
    /// Build a topology from explicit edges.
    pub fn new(edges: Vec<(AgentType, AgentType)>) -> Self {
        Self { edges }
    }

    /// The standard case pipeline: triage feeds the orchestrator, the
    /// orchestrator fans out to every configured domain agent, and every
    /// domain agent feeds the knowledge-graph builder.
    pub fn standard(domain_agents: &[AgentType]) -> Self {
        let mut edges = vec![(AgentType::Triage, AgentType::Orchestrator)];
        for agent in domain_agents {
            edges.push((AgentType::Orchestrator, *agent));
        }
        for agent in domain_agents {
            edges.push((*agent, AgentType::KnowledgeGraph));
        }
        Self { edges }
    }

    /// Declared base-agent edges, in declaration order.
    pub fn edges(&self) -> &[(AgentType, AgentType)] {
        &self.edges
    }

    /// Every base type appearing as an endpoint, deduplicated, sources
    /// before targets, in declaration order.
    pub fn stages(&self) -> Vec<AgentType> {
        let mut stages = Vec::new();
        for (src, dst) in &self.edges {
            if !stages.contains(src) {
                stages.push(*src);
            }
            if !stages.contains(dst) {
                stages.push(*dst);
            }
        }
        stages
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::standard(&[
            AgentType::Financial,
            AgentType::Legal,
            AgentType::Evidence,
            AgentType::Strategy,
        ])
    }
}
