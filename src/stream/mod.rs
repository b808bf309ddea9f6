//! Stream connection module.
//!
//! The transport itself is an external collaborator: the crate only consumes
//! raw JSON payloads through the [`EventSource`] trait and surfaces a
//! connection-status signal. Reconnection uses capped retry with exponential
//! backoff; already-applied state survives every outage.

mod session;

pub use session::{AdvisoryNotice, TrackerSession};

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// The inbound event stream seam.
///
/// Implementations live in the host application (WebSocket, SSE, test
/// scripts); the tracker only pulls raw payloads one at a time.
#[async_trait]
pub trait EventSource: Send {
    /// Establish (or re-establish) the underlying connection.
    async fn connect(&mut self) -> Result<(), StreamError>;

    /// Next raw payload. `Ok(None)` means the stream ended cleanly.
    async fn next_event(&mut self) -> Result<Option<serde_json::Value>, StreamError>;
}

/// Connection lifecycle as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum ConnectionStatus {
    /// First connection attempt in progress
    Connecting,
    /// Stream established
    Connected,
    /// Lost the stream; retrying with backoff
    Reconnecting { attempt: u32 },
    /// Retries exhausted or stream ended; last snapshot stays displayed
    Disconnected,
}

/// Capped exponential backoff for reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl ReconnectPolicy {
    /// Delay before the given attempt (1-based): initial backoff doubled per
    /// attempt, capped at the maximum.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}
