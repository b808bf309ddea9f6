//! Pure per-instance state transitions.
//!
//! `apply_event` is a total function from (snapshot, validated event) to an
//! optional successor snapshot. It never fails: events that reference an
//! unknown instance, or an instance with no task in flight, are stale
//! references from upstream reordering and become debug-logged no-ops.

use super::types::{AgentState, AgentStatus, PipelineSnapshot, Task, TaskStatus};
use crate::event::Event;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Apply one validated event to a snapshot.
///
/// Returns `None` when the event does not change per-agent state (no-ops,
/// advisory events, and `processing-complete`, whose counters live outside
/// the snapshot).
pub fn apply_event(
    snapshot: &PipelineSnapshot,
    event: &Event,
    now: DateTime<Utc>,
) -> Option<PipelineSnapshot> {
    match event {
        Event::AgentStarted {
            agent,
            task_id,
            file_id,
            file_name,
        } => {
            let mut next = snapshot.clone();
            let state = next
                .agents
                .entry(agent.clone())
                .or_insert_with(|| AgentState::new(agent.clone()));
            state.status = AgentStatus::Processing;
            state.current_task = Some(Task {
                task_id: task_id.clone(),
                file_id: file_id.clone(),
                file_name: file_name.clone(),
                started_at: now,
                completed_at: None,
                status: TaskStatus::Processing,
                error: None,
            });
            Some(bump(next))
        }

        Event::AgentComplete { agent, result, .. } => {
            let mut next = snapshot.clone();
            let Some(state) = next.agents.get_mut(agent) else {
                debug!(agent = %agent, "completion for unknown instance, ignoring");
                return None;
            };
            let Some(mut task) = state.current_task.take() else {
                debug!(agent = %agent, "completion with no task in flight, ignoring");
                return None;
            };
            task.status = TaskStatus::Complete;
            task.completed_at = Some(now);
            state.push_history(task);
            state.status = AgentStatus::Idle;
            state.last_result = Some(result.clone());
            Some(bump(next))
        }

        Event::AgentError { agent, error, .. } => {
            let mut next = snapshot.clone();
            let Some(state) = next.agents.get_mut(agent) else {
                debug!(agent = %agent, "error for unknown instance, ignoring");
                return None;
            };
            let Some(mut task) = state.current_task.take() else {
                debug!(agent = %agent, "error with no task in flight, ignoring");
                return None;
            };
            task.status = TaskStatus::Error;
            task.completed_at = Some(now);
            task.error = Some(error.clone());
            state.push_history(task);
            // Error is a distinct visible state; last_result is untouched.
            state.status = AgentStatus::Error;
            Some(bump(next))
        }

        Event::StateSnapshot { agents } => {
            if agents.is_empty() {
                return None;
            }
            let mut next = snapshot.clone();
            for (id, entry) in agents {
                if let Some(metadata) = &entry.metadata {
                    debug!(agent = %id, ?metadata, "resync metadata dropped");
                }
                let previous_task = next
                    .agents
                    .get(id)
                    .and_then(|state| state.current_task.clone());
                let mut state = AgentState::new(id.clone());
                // A resync can claim `processing` without carrying a task
                // payload. Keep the task we already had; with nothing to
                // carry over the entry degrades to idle so the
                // status/current_task invariant holds.
                match (entry.status, previous_task) {
                    (AgentStatus::Processing, Some(task)) => {
                        state.status = AgentStatus::Processing;
                        state.current_task = Some(task);
                    }
                    (AgentStatus::Processing, None) => {
                        debug!(agent = %id, "resync claims processing with no known task");
                        state.status = AgentStatus::Idle;
                    }
                    (status, _) => state.status = status,
                }
                next.agents.insert(id.clone(), state);
            }
            Some(bump(next))
        }

        // Aggregate counters are handled by the store, not the snapshot.
        Event::ProcessingComplete { .. } => None,

        // Advisory events never mutate per-agent state.
        Event::ThinkingUpdate { .. }
        | Event::ConfirmationRequired { .. }
        | Event::ConfirmationResolved { .. }
        | Event::ToolCalled { .. } => None,
    }
}

fn bump(mut snapshot: PipelineSnapshot) -> PipelineSnapshot {
    snapshot.revision += 1;
    snapshot
}
