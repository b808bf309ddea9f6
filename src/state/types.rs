//! Core data model for the pipeline tracker.
//!
//! Everything here is owned, serializable state: agent identities, tasks,
//! results, routing decisions, and the snapshot map the rest of the crate
//! derives from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Maximum number of retained history entries per agent instance.
pub const HISTORY_LIMIT: usize = 5;

/// Pipeline stage type.
///
/// The set is closed per deployment: the enum lists every stage this build
/// understands, and [`crate::config::PipelineConfig`] selects which domain
/// agents are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    /// First stage: classifies incoming files
    Triage,
    /// Routes files to domain agents and groups them
    Orchestrator,
    /// Financial document analysis
    Financial,
    /// Legal document analysis
    Legal,
    /// Evidence review
    Evidence,
    /// Case strategy synthesis
    Strategy,
    /// Knowledge graph builder (terminal stage)
    KnowledgeGraph,
}

impl AgentType {
    /// Stable wire identifier for this agent type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Triage => "triage",
            AgentType::Orchestrator => "orchestrator",
            AgentType::Financial => "financial",
            AgentType::Legal => "legal",
            AgentType::Evidence => "evidence",
            AgentType::Strategy => "strategy",
            AgentType::KnowledgeGraph => "knowledge-graph",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentType::Triage => "Triage",
            AgentType::Orchestrator => "Orchestrator",
            AgentType::Financial => "Financial",
            AgentType::Legal => "Legal",
            AgentType::Evidence => "Evidence",
            AgentType::Strategy => "Strategy",
            AgentType::KnowledgeGraph => "Knowledge Graph",
        }
    }

    /// Whether this type is a domain analysis agent (may run as several
    /// parallel instances splitting a file set).
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            AgentType::Financial | AgentType::Legal | AgentType::Evidence | AgentType::Strategy
        )
    }
}

impl FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "triage" => Ok(AgentType::Triage),
            "orchestrator" => Ok(AgentType::Orchestrator),
            "financial" => Ok(AgentType::Financial),
            "legal" => Ok(AgentType::Legal),
            "evidence" => Ok(AgentType::Evidence),
            "strategy" => Ok(AgentType::Strategy),
            "knowledge-graph" => Ok(AgentType::KnowledgeGraph),
            _ => Err(format!("unknown agent type: {}", s)),
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed agent instance identifier.
///
/// Either a bare [`AgentType`] (singleton agent, e.g. `"triage"`) or a
/// compound id identifying one of several parallel instances of a domain
/// agent (`"financial_grp_1"`, `"legal_file_2"`). The wrapper keeps the
/// original wire string but guarantees the base type parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId {
    raw: String,
    base: AgentType,
}

impl InstanceId {
    /// Parse an instance id from its wire form.
    ///
    /// Returns `None` when the base segment is not a known [`AgentType`].
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(base) = s.parse::<AgentType>() {
            return Some(Self {
                raw: s.to_string(),
                base,
            });
        }
        for marker in ["_grp_", "_file_"] {
            if let Some(pos) = s.find(marker) {
                let base = s[..pos].parse::<AgentType>().ok()?;
                return Some(Self {
                    raw: s.to_string(),
                    base,
                });
            }
        }
        None
    }

    /// The singleton instance id for a base agent type.
    pub fn singleton(base: AgentType) -> Self {
        Self {
            raw: base.as_str().to_string(),
            base,
        }
    }

    /// The base agent type this instance belongs to.
    pub fn base(&self) -> AgentType {
        self.base
    }

    /// The original wire string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this is the bare singleton id for its base type.
    pub fn is_singleton(&self) -> bool {
        self.raw == self.base.as_str()
    }

    /// The trailing instance number for compound ids (`financial_grp_2` → 2).
    pub fn group_number(&self) -> Option<u32> {
        let suffix = self
            .raw
            .rsplit_once("_grp_")
            .or_else(|| self.raw.rsplit_once("_file_"))?
            .1;
        suffix.parse().ok()
    }
}

// Ordered by the raw string so BTreeMap iteration is stable across runs.
impl PartialOrd for InstanceId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InstanceId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for InstanceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for InstanceId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        InstanceId::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid instance id: {}", raw)))
    }
}

/// Terminal or in-flight status of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Processing,
    Complete,
    Error,
}

/// One unit of work assigned to an agent instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub file_id: String,
    pub file_name: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One typed output inside an [`AgentResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    #[serde(rename = "type")]
    pub output_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
    /// Confidence in [0, 1] when the agent reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Routing priority assigned by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("unknown priority: {}", s)),
        }
    }
}

/// The orchestrator's per-file assignment of a file to a target agent type.
///
/// Always expressed in terms of base [`AgentType`], never an instance id;
/// [`crate::correlate`] reunites decisions with the instances that actually
/// processed each file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub target_agent: AgentType,
    pub reason: String,
    /// Canonical unit is 0-100; the validator scales fractional inputs.
    pub domain_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Confidence in [0, 100] when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_confidence: Option<f64>,
}

/// A batch of files the orchestrator groups with shared context before
/// dispatching to one or more domain agents. Parsed out of the
/// orchestrator's result metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileGroup {
    pub group_id: String,
    pub file_ids: Vec<String>,
    pub target_agents: Vec<AgentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_context: Option<String>,
}

/// The payload an agent instance produced on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub task_id: String,
    pub agent_type: AgentType,
    pub outputs: Vec<AgentOutput>,
    /// Open key/value map: timing, token counts, warnings, thinking traces,
    /// file groups. Consumers probe for the keys they understand.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_decisions: Option<Vec<RoutingDecision>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_called: Option<Vec<String>>,
    /// Files this result covers; authoritative for instance correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_names: Option<Vec<String>>,
}

impl AgentResult {
    /// Parse `metadata.file_groups` into typed groups.
    ///
    /// Malformed entries are skipped rather than failing the whole list.
    pub fn file_groups(&self) -> Vec<FileGroup> {
        let Some(serde_json::Value::Array(entries)) = self.metadata.get("file_groups") else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
            .collect()
    }

    /// Number of warnings recorded in metadata, if any.
    pub fn warning_count(&self) -> Option<usize> {
        match self.metadata.get("warnings") {
            Some(serde_json::Value::Array(w)) => Some(w.len()),
            _ => None,
        }
    }

    /// Processing duration from metadata, if reported.
    pub fn duration_ms(&self) -> Option<u64> {
        self.metadata
            .get("duration_ms")
            .or_else(|| self.metadata.get("processing_time_ms"))
            .and_then(serde_json::Value::as_u64)
    }
}

/// Lifecycle status of an agent instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// No work assigned
    Idle,
    /// A task is in flight
    Processing,
    /// Finished its assigned work (reported via resync)
    Complete,
    /// Last task failed
    Error,
}

impl FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(AgentStatus::Idle),
            "processing" => Ok(AgentStatus::Processing),
            "complete" => Ok(AgentStatus::Complete),
            "error" => Ok(AgentStatus::Error),
            _ => Err(format!("unknown agent status: {}", s)),
        }
    }
}

/// Authoritative state for one agent instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    pub id: InstanceId,
    pub agent_type: AgentType,
    pub status: AgentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_task: Option<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_result: Option<AgentResult>,
    /// Newest-first, capped at [`HISTORY_LIMIT`].
    pub processing_history: Vec<Task>,
}

impl AgentState {
    /// Fresh idle state for an instance.
    pub fn new(id: InstanceId) -> Self {
        let agent_type = id.base();
        Self {
            id,
            agent_type,
            status: AgentStatus::Idle,
            current_task: None,
            last_result: None,
            processing_history: Vec::new(),
        }
    }

    /// Whether this instance has produced any non-idle signal this session.
    ///
    /// Used for progressive reveal: an errored instance counts as progressed
    /// so failures stay visible.
    pub fn has_progressed(&self) -> bool {
        self.last_result.is_some()
            || !self.processing_history.is_empty()
            || !matches!(self.status, AgentStatus::Idle)
    }

    /// Whether the instance is marked chosen/active in the derived graph:
    /// currently working, finished, or idle with completed work behind it.
    pub fn is_chosen(&self) -> bool {
        matches!(self.status, AgentStatus::Processing | AgentStatus::Complete)
            || (matches!(self.status, AgentStatus::Idle) && self.last_result.is_some())
    }

    /// Push a finished task to the front of the history, evicting the oldest
    /// entry beyond [`HISTORY_LIMIT`].
    pub fn push_history(&mut self, task: Task) {
        self.processing_history.insert(0, task);
        self.processing_history.truncate(HISTORY_LIMIT);
    }
}

/// The complete current state of all known agent instances.
///
/// Mutated only through [`crate::state::PipelineStore::apply`]; everything
/// downstream sees immutable `Arc` snapshots. `revision` increments on every
/// mutating apply and is a cheap memoization key for derivation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineSnapshot {
    pub agents: BTreeMap<InstanceId, AgentState>,
    pub revision: u64,
}

impl PipelineSnapshot {
    /// Look up one instance.
    pub fn agent(&self, id: &InstanceId) -> Option<&AgentState> {
        self.agents.get(id)
    }

    /// Whether any instance of the given base type has progressed.
    pub fn stage_progressed(&self, base: AgentType) -> bool {
        self.agents
            .values()
            .any(|a| a.agent_type == base && a.has_progressed())
    }

    /// All instances of one base type, in stable key order.
    pub fn instances_of(&self, base: AgentType) -> impl Iterator<Item = &AgentState> {
        self.agents.values().filter(move |a| a.agent_type == base)
    }
}

/// Pipeline-level aggregate counters.
///
/// A sibling concern to the snapshot: `processing-complete` events update
/// these without touching any per-agent state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTotals {
    pub case_id: Option<String>,
    pub files_processed: u64,
    pub entities_created: u64,
    pub relationships_created: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}
