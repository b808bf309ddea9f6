//! Command Center pipeline tracker.
//!
//! Consumes an untrusted, ordered stream of events describing a multi-stage
//! AI agent pipeline (triage → orchestrator → domain agents →
//! knowledge-graph builder), maintains authoritative per-instance state, and
//! derives an abstract process graph plus an instance-to-file routing
//! correlation for display.
//!
//! Data flow: [`stream`] → [`event`] (validation) → [`state`] (snapshot) →
//! {[`graph`], [`correlate`]} → external renderer.

pub mod config;
pub mod correlate;
pub mod event;
pub mod graph;
pub mod logging;
pub mod state;
pub mod stream;

pub use config::TrackerConfig;
pub use correlate::correlate;
pub use event::{validate, Event, ValidationError};
pub use graph::{derive, ProcessGraph, Topology};
pub use state::{AgentType, InstanceId, PipelineSnapshot, PipelineStore};
pub use stream::{ConnectionStatus, EventSource, TrackerSession};
