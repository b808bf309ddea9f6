//! Session driver: one inbound stream, one store, one consumer.

use super::{ConnectionStatus, EventSource, ReconnectPolicy};
use crate::config::TrackerConfig;
use crate::event::{validate, Event};
use crate::state::{InstanceId, PipelineSnapshot, PipelineStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Advisory event forwarded to the UI without touching the snapshot.
#[derive(Debug, Clone)]
pub enum AdvisoryNotice {
    Thinking {
        agent: InstanceId,
        thought: String,
    },
    ConfirmationRequired {
        task_id: String,
        agent: InstanceId,
        action_description: String,
    },
    ConfirmationResolved {
        task_id: String,
        agent: InstanceId,
        approved: bool,
    },
    ToolCalled {
        agent: InstanceId,
        tool_name: String,
        timestamp: DateTime<Utc>,
    },
}

/// One tracking session: consumes a raw event stream, maintains the
/// pipeline snapshot, and publishes status/advisory signals.
///
/// Events are processed strictly one at a time in arrival order; the store
/// is never touched from two call sites. State is preserved across
/// reconnects so the display never regresses to empty.
pub struct TrackerSession {
    id: Uuid,
    store: PipelineStore,
    policy: ReconnectPolicy,
    status_tx: watch::Sender<ConnectionStatus>,
    advisory_tx: broadcast::Sender<AdvisoryNotice>,
}

impl TrackerSession {
    pub fn new(config: &TrackerConfig) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Connecting);
        let (advisory_tx, _) = broadcast::channel(64);
        Self {
            id: Uuid::new_v4(),
            store: PipelineStore::new(),
            policy: config.stream.reconnect_policy(),
            status_tx,
            advisory_tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current immutable snapshot.
    pub fn snapshot(&self) -> Arc<PipelineSnapshot> {
        self.store.snapshot()
    }

    pub fn store(&self) -> &PipelineStore {
        &self.store
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<Arc<PipelineSnapshot>> {
        self.store.subscribe()
    }

    /// Subscribe to connection status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// Subscribe to advisory notices (thinking traces, confirmations, tool
    /// calls).
    pub fn subscribe_advisories(&self) -> broadcast::Receiver<AdvisoryNotice> {
        self.advisory_tx.subscribe()
    }

    /// Drive the session until the stream ends, retries are exhausted, or
    /// the token is cancelled. State survives every exit path.
    pub async fn run<S: EventSource>(&mut self, source: &mut S, cancel: CancellationToken) {
        let session = self.id;
        info!(%session, "tracker session starting");

        loop {
            if !self.connect_with_retry(source, &cancel).await {
                return;
            }

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(%session, "session cancelled");
                        self.status_tx.send_replace(ConnectionStatus::Disconnected);
                        return;
                    }
                    next = source.next_event() => match next {
                        Ok(Some(raw)) => self.ingest(&raw),
                        Ok(None) => {
                            info!(%session, "stream ended");
                            self.status_tx.send_replace(ConnectionStatus::Disconnected);
                            return;
                        }
                        Err(error) => {
                            warn!(%session, %error, "stream dropped, reconnecting");
                            // Surface the drop immediately; the first connect
                            // attempt may block on the network for a while.
                            self.status_tx
                                .send_replace(ConnectionStatus::Reconnecting { attempt: 1 });
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Apply one raw payload: validate, drop-and-log on rejection, forward
    /// advisories, apply to the store.
    pub fn ingest(&mut self, raw: &serde_json::Value) {
        match validate(raw) {
            Ok(event) => {
                self.forward_advisory(&event);
                self.store.apply(&event);
            }
            Err(error) => {
                warn!(%error, "dropping malformed event");
            }
        }
    }

    fn forward_advisory(&self, event: &Event) {
        let notice = match event {
            Event::ThinkingUpdate { agent, thought } => AdvisoryNotice::Thinking {
                agent: agent.clone(),
                thought: thought.clone(),
            },
            Event::ConfirmationRequired {
                task_id,
                agent,
                action_description,
            } => AdvisoryNotice::ConfirmationRequired {
                task_id: task_id.clone(),
                agent: agent.clone(),
                action_description: action_description.clone(),
            },
            Event::ConfirmationResolved {
                task_id,
                agent,
                approved,
            } => AdvisoryNotice::ConfirmationResolved {
                task_id: task_id.clone(),
                agent: agent.clone(),
                approved: *approved,
            },
            Event::ToolCalled {
                agent,
                tool_name,
                timestamp,
            } => AdvisoryNotice::ToolCalled {
                agent: agent.clone(),
                tool_name: tool_name.clone(),
                timestamp: *timestamp,
            },
            _ => return,
        };
        // No subscribers is fine; advisories are best-effort.
        let _ = self.advisory_tx.send(notice);
    }

    /// Returns false when retries are exhausted or the session is cancelled.
    ///
    /// The published status names the connect attempt currently in progress;
    /// the read loop surfaces attempt 1 as soon as the stream drops.
    async fn connect_with_retry<S: EventSource>(
        &mut self,
        source: &mut S,
        cancel: &CancellationToken,
    ) -> bool {
        let mut attempt: u32 = 1;
        loop {
            match source.connect().await {
                Ok(()) => {
                    self.status_tx.send_replace(ConnectionStatus::Connected);
                    return true;
                }
                Err(error) => {
                    if attempt > self.policy.max_retries {
                        warn!(%error, attempt, "reconnect retries exhausted");
                        self.status_tx.send_replace(ConnectionStatus::Disconnected);
                        return false;
                    }
                    warn!(%error, attempt, "connect failed, backing off");
                    self.status_tx
                        .send_replace(ConnectionStatus::Reconnecting {
                            attempt: attempt + 1,
                        });
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            self.status_tx.send_replace(ConnectionStatus::Disconnected);
                            return false;
                        }
                        _ = tokio::time::sleep(self.policy.delay(attempt)) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }
}
