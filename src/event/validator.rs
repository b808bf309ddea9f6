//! Strict validation of untrusted wire payloads.
//!
//! The stream is semi-trusted: payloads may be truncated, reordered by a
//! buggy upstream, or produced by a stale protocol version. Every event kind
//! has a closed required-field contract; anything that fails a check is
//! rejected whole. No partial event is ever returned and no state is touched
//! here.

use super::error::ValidationError;
use super::types::{Event, ResyncEntry};
use crate::state::{
    AgentOutput, AgentResult, AgentStatus, AgentType, InstanceId, Priority, RoutingDecision,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Validate one raw payload into a typed [`Event`].
///
/// Pure gate: returns the specific rejection reason on failure so callers
/// can log a useful diagnostic before dropping the payload.
pub fn validate(raw: &Value) -> Result<Event, ValidationError> {
    let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingType)?;

    match kind {
        "agent-started" => validate_agent_started(obj),
        "agent-complete" => validate_agent_complete(obj),
        "agent-error" => validate_agent_error(obj),
        "processing-complete" => validate_processing_complete(obj),
        "thinking-update" => validate_thinking_update(obj),
        "state-snapshot" => validate_state_snapshot(obj),
        "confirmation-required" => validate_confirmation_required(obj),
        "confirmation-resolved" => validate_confirmation_resolved(obj),
        "tool-called" => validate_tool_called(obj),
        other => Err(ValidationError::UnknownEventType(other.to_string())),
    }
}

fn validate_agent_started(obj: &Map<String, Value>) -> Result<Event, ValidationError> {
    Ok(Event::AgentStarted {
        agent: req_agent(obj)?,
        task_id: req_nonempty_str(obj, "taskId")?,
        file_id: req_nonempty_str(obj, "fileId")?,
        file_name: req_nonempty_str(obj, "fileName")?,
    })
}

fn validate_agent_complete(obj: &Map<String, Value>) -> Result<Event, ValidationError> {
    let result = obj
        .get("result")
        .ok_or_else(|| ValidationError::MissingField("result".into()))?;
    Ok(Event::AgentComplete {
        agent: req_agent(obj)?,
        task_id: req_nonempty_str(obj, "taskId")?,
        result: validate_result(result)?,
    })
}

fn validate_agent_error(obj: &Map<String, Value>) -> Result<Event, ValidationError> {
    Ok(Event::AgentError {
        agent: req_agent(obj)?,
        task_id: req_nonempty_str(obj, "taskId")?,
        error: req_nonempty_str(obj, "error")?,
    })
}

fn validate_processing_complete(obj: &Map<String, Value>) -> Result<Event, ValidationError> {
    Ok(Event::ProcessingComplete {
        case_id: req_str(obj, "caseId")?,
        files_processed: req_counter(obj, "filesProcessed")?,
        entities_created: req_counter(obj, "entitiesCreated")?,
        relationships_created: req_counter(obj, "relationshipsCreated")?,
        duration_ms: opt_counter(obj, "durationMs")?,
        input_tokens: opt_counter(obj, "inputTokens")?,
        output_tokens: opt_counter(obj, "outputTokens")?,
    })
}

fn validate_thinking_update(obj: &Map<String, Value>) -> Result<Event, ValidationError> {
    Ok(Event::ThinkingUpdate {
        agent: req_agent(obj)?,
        thought: req_str(obj, "thought")?,
    })
}

fn validate_state_snapshot(obj: &Map<String, Value>) -> Result<Event, ValidationError> {
    let agents = obj
        .get("agents")
        .ok_or_else(|| ValidationError::MissingField("agents".into()))?
        .as_object()
        .ok_or_else(|| ValidationError::invalid("agents", "expected an object"))?;

    let mut entries = BTreeMap::new();
    for (key, value) in agents {
        let id = InstanceId::parse(key).ok_or_else(|| {
            ValidationError::invalid("agents", format!("invalid instance id: {}", key))
        })?;
        let entry = value.as_object().ok_or_else(|| {
            ValidationError::invalid("agents", format!("entry '{}' is not an object", key))
        })?;
        let status: AgentStatus = req_str(entry, "status")?
            .parse()
            .map_err(|e: String| ValidationError::invalid("status", e))?;
        let metadata = match entry.get("metadata") {
            None | Some(Value::Null) => None,
            Some(Value::Object(m)) => Some(m.clone()),
            Some(_) => {
                return Err(ValidationError::invalid("metadata", "expected an object"));
            }
        };
        entries.insert(id, ResyncEntry { status, metadata });
    }
    Ok(Event::StateSnapshot { agents: entries })
}

fn validate_confirmation_required(obj: &Map<String, Value>) -> Result<Event, ValidationError> {
    Ok(Event::ConfirmationRequired {
        task_id: req_nonempty_str(obj, "taskId")?,
        agent: req_agent(obj)?,
        action_description: req_nonempty_str(obj, "actionDescription")?,
    })
}

fn validate_confirmation_resolved(obj: &Map<String, Value>) -> Result<Event, ValidationError> {
    let approved = obj
        .get("approved")
        .ok_or_else(|| ValidationError::MissingField("approved".into()))?
        .as_bool()
        .ok_or_else(|| ValidationError::invalid("approved", "expected a boolean"))?;
    Ok(Event::ConfirmationResolved {
        task_id: req_nonempty_str(obj, "taskId")?,
        agent: req_agent(obj)?,
        approved,
    })
}

fn validate_tool_called(obj: &Map<String, Value>) -> Result<Event, ValidationError> {
    let timestamp = match obj.get("timestamp") {
        None => return Err(ValidationError::MissingField("timestamp".into())),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ValidationError::invalid("timestamp", e.to_string()))?,
        // Numeric timestamps arrive as epoch milliseconds.
        Some(Value::Number(n)) => {
            let millis = n
                .as_i64()
                .ok_or_else(|| ValidationError::invalid("timestamp", "expected integer millis"))?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| ValidationError::invalid("timestamp", "out-of-range millis"))?
        }
        Some(_) => {
            return Err(ValidationError::invalid(
                "timestamp",
                "expected a string or number",
            ));
        }
    };
    Ok(Event::ToolCalled {
        agent: req_agent(obj)?,
        tool_name: req_nonempty_str(obj, "toolName")?,
        timestamp,
    })
}

/// Validate a well-formed [`AgentResult`] payload.
fn validate_result(raw: &Value) -> Result<AgentResult, ValidationError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::invalid("result", "expected an object"))?;

    let agent_type: AgentType = obj
        .get("agentType")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::MissingField("result.agentType".into()))?
        .parse()
        .map_err(|e: String| ValidationError::invalid("result.agentType", e))?;

    let outputs_raw = obj
        .get("outputs")
        .ok_or_else(|| ValidationError::MissingField("result.outputs".into()))?
        .as_array()
        .ok_or_else(|| ValidationError::invalid("result.outputs", "expected an array"))?;

    let mut outputs = Vec::with_capacity(outputs_raw.len());
    for (i, entry) in outputs_raw.iter().enumerate() {
        outputs.push(validate_output(entry, i)?);
    }

    let metadata = match obj.get("metadata") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(m)) => m.clone(),
        Some(_) => {
            return Err(ValidationError::invalid(
                "result.metadata",
                "expected an object",
            ));
        }
    };

    let routing_decisions = match obj.get("routingDecisions") {
        None | Some(Value::Null) => None,
        Some(Value::Array(entries)) => {
            let mut decisions = Vec::with_capacity(entries.len());
            for (i, entry) in entries.iter().enumerate() {
                decisions.push(validate_decision(entry, i)?);
            }
            Some(decisions)
        }
        Some(_) => {
            return Err(ValidationError::invalid(
                "result.routingDecisions",
                "expected an array",
            ));
        }
    };

    let tools_called = opt_string_list(obj, "toolsCalled")?;
    let file_names = opt_string_list(obj, "fileNames")?;

    Ok(AgentResult {
        task_id: obj
            .get("taskId")
            .and_then(Value::as_str)
            .ok_or_else(|| ValidationError::MissingField("result.taskId".into()))?
            .to_string(),
        agent_type,
        outputs,
        metadata,
        routing_decisions,
        tools_called,
        file_names,
    })
}

fn validate_output(raw: &Value, index: usize) -> Result<AgentOutput, ValidationError> {
    let field = format!("result.outputs[{}]", index);
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::invalid(field.clone(), "expected an object"))?;

    let output_type = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::invalid(field.clone(), "missing string 'type'"))?
        .to_string();

    let confidence = match obj.get("confidence") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let c = value.as_f64().ok_or_else(|| {
                ValidationError::invalid(field.clone(), "confidence must be a number")
            })?;
            if !(0.0..=1.0).contains(&c) {
                return Err(ValidationError::invalid(
                    field,
                    format!("confidence {} outside [0, 1]", c),
                ));
            }
            Some(c)
        }
    };

    Ok(AgentOutput {
        output_type,
        data: obj.get("data").cloned().unwrap_or(Value::Null),
        confidence,
    })
}

fn validate_decision(raw: &Value, index: usize) -> Result<RoutingDecision, ValidationError> {
    let field = format!("result.routingDecisions[{}]", index);
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::invalid(field.clone(), "expected an object"))?;

    let target_agent: AgentType = obj
        .get("targetAgent")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::invalid(field.clone(), "missing string 'targetAgent'"))?
        .parse()
        .map_err(|e: String| ValidationError::invalid(field.clone(), e))?;

    let reason = obj
        .get("reason")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::invalid(field.clone(), "missing string 'reason'"))?
        .to_string();

    let raw_score = obj
        .get("domainScore")
        .and_then(Value::as_f64)
        .ok_or_else(|| ValidationError::invalid(field.clone(), "missing numeric 'domainScore'"))?;
    let domain_score = normalize_domain_score(raw_score)
        .ok_or_else(|| ValidationError::invalid(field.clone(), "domainScore outside [0, 100]"))?;

    let priority = match obj.get("priority") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(
            s.parse::<Priority>()
                .map_err(|e| ValidationError::invalid(field.clone(), e))?,
        ),
        Some(_) => {
            return Err(ValidationError::invalid(field, "priority must be a string"));
        }
    };

    let routing_confidence = match obj.get("routingConfidence") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let c = value.as_f64().ok_or_else(|| {
                ValidationError::invalid(field.clone(), "routingConfidence must be a number")
            })?;
            if !(0.0..=100.0).contains(&c) {
                return Err(ValidationError::invalid(
                    field,
                    format!("routingConfidence {} outside [0, 100]", c),
                ));
            }
            Some(c)
        }
    };

    Ok(RoutingDecision {
        file_id: obj
            .get("fileId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        file_name: obj
            .get("fileName")
            .and_then(Value::as_str)
            .map(str::to_string),
        target_agent,
        reason,
        domain_score,
        priority,
        routing_confidence,
    })
}

/// Normalize a domain score to the canonical 0-100 unit.
///
/// Upstream emitters disagree on the unit: some send fractions in [0, 1],
/// others percentages in [0, 100]. Values at or below 1.0 are treated as
/// fractions and scaled; anything outside [0, 100] is rejected.
pub fn normalize_domain_score(raw: f64) -> Option<f64> {
    if !raw.is_finite() || !(0.0..=100.0).contains(&raw) {
        return None;
    }
    if raw <= 1.0 {
        Some(raw * 100.0)
    } else {
        Some(raw)
    }
}

fn req_agent(obj: &Map<String, Value>) -> Result<InstanceId, ValidationError> {
    let raw = req_nonempty_str(obj, "agentType")?;
    InstanceId::parse(&raw)
        .ok_or_else(|| ValidationError::invalid("agentType", format!("unknown agent: {}", raw)))
}

fn req_str(obj: &Map<String, Value>, field: &str) -> Result<String, ValidationError> {
    match obj.get(field) {
        None => Err(ValidationError::MissingField(field.to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::invalid(field, "expected a string")),
    }
}

fn req_nonempty_str(obj: &Map<String, Value>, field: &str) -> Result<String, ValidationError> {
    let s = req_str(obj, field)?;
    if s.is_empty() {
        return Err(ValidationError::invalid(field, "must be non-empty"));
    }
    Ok(s)
}

fn req_counter(obj: &Map<String, Value>, field: &str) -> Result<u64, ValidationError> {
    match obj.get(field) {
        None => Err(ValidationError::MissingField(field.to_string())),
        Some(value) => parse_counter(value, field),
    }
}

fn opt_counter(obj: &Map<String, Value>, field: &str) -> Result<Option<u64>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_counter(value, field).map(Some),
    }
}

fn parse_counter(value: &Value, field: &str) -> Result<u64, ValidationError> {
    let n = value
        .as_f64()
        .ok_or_else(|| ValidationError::invalid(field, "expected a number"))?;
    if !n.is_finite() || n < 0.0 {
        return Err(ValidationError::invalid(field, "must be non-negative"));
    }
    Ok(n as u64)
}

fn opt_string_list(
    obj: &Map<String, Value>,
    field: &str,
) -> Result<Option<Vec<String>>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(entries)) => {
            let mut out = Vec::with_capacity(entries.len());
            for entry in entries {
                let s = entry.as_str().ok_or_else(|| {
                    ValidationError::invalid(
                        format!("result.{}", field),
                        "every entry must be a string",
                    )
                })?;
                out.push(s.to_string());
            }
            Ok(Some(out))
        }
        Some(_) => Err(ValidationError::invalid(
            format!("result.{}", field),
            "expected an array",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_object_payloads() {
        assert_eq!(validate(&json!("hi")), Err(ValidationError::NotAnObject));
        assert_eq!(validate(&json!(42)), Err(ValidationError::NotAnObject));
    }

    #[test]
    fn rejects_unknown_event_type() {
        let err = validate(&json!({"type": "agent-paused"})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownEventType("agent-paused".into())
        );
    }

    #[test]
    fn accepts_minimal_agent_started() {
        let event = validate(&json!({
            "type": "agent-started",
            "agentType": "triage",
            "taskId": "t1",
            "fileId": "f1",
            "fileName": "report.pdf"
        }))
        .unwrap();
        match event {
            Event::AgentStarted { agent, task_id, .. } => {
                assert_eq!(agent.as_str(), "triage");
                assert_eq!(task_id, "t1");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn accepts_compound_instance_ids() {
        let event = validate(&json!({
            "type": "agent-started",
            "agentType": "financial_grp_2",
            "taskId": "t1",
            "fileId": "f1",
            "fileName": "ledger.xlsx"
        }))
        .unwrap();
        match event {
            Event::AgentStarted { agent, .. } => {
                assert_eq!(agent.base(), AgentType::Financial);
                assert_eq!(agent.group_number(), Some(2));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn rejects_empty_required_strings() {
        let err = validate(&json!({
            "type": "agent-started",
            "agentType": "triage",
            "taskId": "",
            "fileId": "f1",
            "fileName": "report.pdf"
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { .. }));
    }

    #[test]
    fn rejects_confidence_out_of_range() {
        let err = validate(&json!({
            "type": "agent-complete",
            "agentType": "triage",
            "taskId": "t1",
            "result": {
                "taskId": "t1",
                "agentType": "triage",
                "outputs": [{"type": "summary", "data": "ok", "confidence": 1.5}]
            }
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { .. }));
    }

    #[test]
    fn normalizes_fractional_domain_scores() {
        assert_eq!(normalize_domain_score(0.85), Some(85.0));
        assert_eq!(normalize_domain_score(85.0), Some(85.0));
        assert_eq!(normalize_domain_score(100.0), Some(100.0));
        assert_eq!(normalize_domain_score(-0.1), None);
        assert_eq!(normalize_domain_score(100.5), None);
        assert_eq!(normalize_domain_score(f64::NAN), None);
    }

    #[test]
    fn rejects_decision_with_bad_target() {
        let err = validate(&json!({
            "type": "agent-complete",
            "agentType": "orchestrator",
            "taskId": "t1",
            "result": {
                "taskId": "t1",
                "agentType": "orchestrator",
                "outputs": [],
                "routingDecisions": [{
                    "fileId": "f1",
                    "targetAgent": "astrology",
                    "reason": "stars",
                    "domainScore": 50
                }]
            }
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { .. }));
    }

    #[test]
    fn accepts_processing_complete_with_optional_counters() {
        let event = validate(&json!({
            "type": "processing-complete",
            "caseId": "case-9",
            "filesProcessed": 4,
            "entitiesCreated": 120,
            "relationshipsCreated": 310,
            "durationMs": 90000
        }))
        .unwrap();
        match event {
            Event::ProcessingComplete {
                files_processed,
                duration_ms,
                input_tokens,
                ..
            } => {
                assert_eq!(files_processed, 4);
                assert_eq!(duration_ms, Some(90000));
                assert_eq!(input_tokens, None);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn rejects_negative_counters() {
        let err = validate(&json!({
            "type": "processing-complete",
            "caseId": "case-9",
            "filesProcessed": -1,
            "entitiesCreated": 0,
            "relationshipsCreated": 0
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { .. }));
    }

    #[test]
    fn accepts_state_snapshot() {
        let event = validate(&json!({
            "type": "state-snapshot",
            "agents": {
                "triage": {"status": "complete"},
                "financial_grp_1": {"status": "processing", "metadata": {"note": "resumed"}}
            }
        }))
        .unwrap();
        match event {
            Event::StateSnapshot { agents } => {
                assert_eq!(agents.len(), 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn tool_called_accepts_epoch_millis() {
        let event = validate(&json!({
            "type": "tool-called",
            "agentType": "legal",
            "toolName": "contract_scan",
            "timestamp": 1724630400000i64
        }))
        .unwrap();
        assert!(matches!(event, Event::ToolCalled { .. }));
    }
}
