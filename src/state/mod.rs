//! Pipeline state module.
//!
//! Holds the authoritative per-instance state for one tracking session and
//! applies validated events as state transitions. Every mutation publishes a
//! fresh immutable snapshot on a watch channel; derivation and correlation
//! read snapshots, never the store.

mod machine;
mod types;


pub use machine::apply_event;
pub use types::*;

use crate::event::Event;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Owns the snapshot and aggregate counters for one session.
///
/// Single-writer by contract: events are applied one at a time in arrival
/// order from one call site. Readers subscribe to the watch channel or take
/// `Arc` snapshots.
pub struct PipelineStore {
    snapshot: Arc<PipelineSnapshot>,
    totals: PipelineTotals,
    tx: watch::Sender<Arc<PipelineSnapshot>>,
}

impl PipelineStore {
    /// Create an empty store for a new session.
    pub fn new() -> Self {
        let snapshot = Arc::new(PipelineSnapshot::default());
        let (tx, _) = watch::channel(Arc::clone(&snapshot));
        Self {
            snapshot,
            totals: PipelineTotals::default(),
            tx,
        }
    }

    /// Apply one validated event.
    ///
    /// Never fails: stale references and advisory events are no-ops on the
    /// snapshot, and `processing-complete` only updates the aggregate
    /// counters.
    pub fn apply(&mut self, event: &Event) {
        if let Event::ProcessingComplete {
            case_id,
            files_processed,
            entities_created,
            relationships_created,
            duration_ms,
            input_tokens,
            output_tokens,
        } = event
        {
            self.totals = PipelineTotals {
                case_id: Some(case_id.clone()),
                files_processed: *files_processed,
                entities_created: *entities_created,
                relationships_created: *relationships_created,
                duration_ms: *duration_ms,
                input_tokens: *input_tokens,
                output_tokens: *output_tokens,
                completed_at: Some(Utc::now()),
            };
            info!(
                case_id = %case_id,
                files = files_processed,
                entities = entities_created,
                relationships = relationships_created,
                "pipeline complete"
            );
            return;
        }

        if let Some(next) = apply_event(&self.snapshot, event, Utc::now()) {
            self.snapshot = Arc::new(next);
            self.tx.send_replace(Arc::clone(&self.snapshot));
        }
    }

    /// The current immutable snapshot.
    pub fn snapshot(&self) -> Arc<PipelineSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Pipeline-level aggregate counters.
    pub fn totals(&self) -> &PipelineTotals {
        &self.totals
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PipelineSnapshot>> {
        self.tx.subscribe()
    }

    /// Clear all instances and counters for a fresh run.
    ///
    /// The revision keeps counting up so memoized derivations invalidate.
    pub fn reset(&mut self) {
        let next = PipelineSnapshot {
            agents: Default::default(),
            revision: self.snapshot.revision + 1,
        };
        self.snapshot = Arc::new(next);
        self.totals = PipelineTotals::default();
        self.tx.send_replace(Arc::clone(&self.snapshot));
    }
}

impl Default for PipelineStore {
    fn default() -> Self {
        Self::new()
    }
}
