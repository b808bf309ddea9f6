//! Validated event types.
//!
//! Each wire event kind is one variant of the closed [`Event`] sum type.
//! Instances of these types only exist after passing
//! [`crate::event::validate`]; downstream code never sees raw JSON.

use crate::state::{AgentResult, AgentStatus, InstanceId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A validated inbound event.
///
/// The first four variants drive state transitions; the rest are advisory
/// (forwarded to the UI, no snapshot mutation) except [`Event::StateSnapshot`],
/// which is the resynchronization primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An agent instance picked up a task.
    AgentStarted {
        agent: InstanceId,
        task_id: String,
        file_id: String,
        file_name: String,
    },
    /// An agent instance finished its current task.
    AgentComplete {
        agent: InstanceId,
        task_id: String,
        result: AgentResult,
    },
    /// An agent instance failed its current task.
    AgentError {
        agent: InstanceId,
        task_id: String,
        error: String,
    },
    /// The whole pipeline finished; carries aggregate counters only.
    ProcessingComplete {
        case_id: String,
        files_processed: u64,
        entities_created: u64,
        relationships_created: u64,
        duration_ms: Option<u64>,
        input_tokens: Option<u64>,
        output_tokens: Option<u64>,
    },
    /// Streaming reasoning trace from an agent.
    ThinkingUpdate { agent: InstanceId, thought: String },
    /// Full-state resync: replaces the named per-agent entries wholesale.
    StateSnapshot {
        agents: BTreeMap<InstanceId, ResyncEntry>,
    },
    /// An agent is waiting on a human approval.
    ConfirmationRequired {
        task_id: String,
        agent: InstanceId,
        action_description: String,
    },
    /// A pending approval was answered.
    ConfirmationResolved {
        task_id: String,
        agent: InstanceId,
        approved: bool,
    },
    /// An agent invoked a tool.
    ToolCalled {
        agent: InstanceId,
        tool_name: String,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    /// Wire discriminator for this event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::AgentStarted { .. } => "agent-started",
            Event::AgentComplete { .. } => "agent-complete",
            Event::AgentError { .. } => "agent-error",
            Event::ProcessingComplete { .. } => "processing-complete",
            Event::ThinkingUpdate { .. } => "thinking-update",
            Event::StateSnapshot { .. } => "state-snapshot",
            Event::ConfirmationRequired { .. } => "confirmation-required",
            Event::ConfirmationResolved { .. } => "confirmation-resolved",
            Event::ToolCalled { .. } => "tool-called",
        }
    }

    /// Advisory events are forwarded to observers but never mutate the
    /// snapshot.
    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            Event::ThinkingUpdate { .. }
                | Event::ConfirmationRequired { .. }
                | Event::ConfirmationResolved { .. }
                | Event::ToolCalled { .. }
        )
    }
}

/// One per-agent entry inside a [`Event::StateSnapshot`] resync.
#[derive(Debug, Clone, PartialEq)]
pub struct ResyncEntry {
    pub status: AgentStatus,
    /// Opaque upstream metadata; logged for diagnostics, not stored.
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}
