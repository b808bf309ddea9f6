//! Shared helpers for integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};

pub fn started(agent: &str, task: &str, file_id: &str, file_name: &str) -> Value {
    json!({
        "type": "agent-started",
        "agentType": agent,
        "taskId": task,
        "fileId": file_id,
        "fileName": file_name
    })
}

pub fn completed(agent: &str, task: &str) -> Value {
    completed_with_result(
        agent,
        task,
        json!({
            "taskId": task,
            "agentType": base_of(agent),
            "outputs": [{"type": "summary", "data": "ok"}]
        }),
    )
}

pub fn completed_with_result(agent: &str, task: &str, result: Value) -> Value {
    json!({
        "type": "agent-complete",
        "agentType": agent,
        "taskId": task,
        "result": result
    })
}

pub fn errored(agent: &str, task: &str, message: &str) -> Value {
    json!({
        "type": "agent-error",
        "agentType": agent,
        "taskId": task,
        "error": message
    })
}

/// Orchestrator completion carrying routing decisions and file groups.
pub fn orchestrator_completed(task: &str, decisions: Value, file_groups: Value) -> Value {
    completed_with_result(
        "orchestrator",
        task,
        json!({
            "taskId": task,
            "agentType": "orchestrator",
            "outputs": [{"type": "routing-plan", "data": "done"}],
            "metadata": {"file_groups": file_groups},
            "routingDecisions": decisions
        }),
    )
}

pub fn decision(file: &str, target: &str, score: f64) -> Value {
    json!({
        "fileId": format!("id-{}", file),
        "fileName": file,
        "targetAgent": target,
        "reason": "domain match",
        "domainScore": score
    })
}

fn base_of(agent: &str) -> &str {
    agent
        .split_once("_grp_")
        .or_else(|| agent.split_once("_file_"))
        .map(|(base, _)| base)
        .unwrap_or(agent)
}
