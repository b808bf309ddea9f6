//! Instance correlation module.
//!
//! Routing decisions are expressed per base agent type; domain agents run as
//! parallel instances each handling a subset of files. This module
//! reconstructs "which file went to which instance" for the routing-detail
//! display. Pure and infallible: absent or malformed optional data degrades
//! to empty display states.

mod types;

pub use types::{AgentSection, FileAssignment, InstanceAssignment};

use crate::state::{AgentType, InstanceId, PipelineSnapshot, RoutingDecision};
use std::collections::{BTreeMap, BTreeSet};

/// Group routing decisions into instance-centric sections.
///
/// - An instance's `last_result.file_names` is the authoritative list of
///   files it processed; each is matched to a decision by
///   case-insensitive file name (fileId fallback). Unmatched files are
///   listed with no decision.
/// - Instances still in flight (no file names yet) tentatively receive the
///   undistributed decisions targeting their base type.
/// - A base type with decisions but no live instance gets a synthesized
///   placeholder so routing information shows pre-instantiation.
/// - Sections are sorted busiest-first; instances in a multi-way split get
///   "Group N" labels.
pub fn correlate(decisions: &[RoutingDecision], snapshot: &PipelineSnapshot) -> Vec<AgentSection> {
    // Last-write-wins keying is a known tolerance for duplicate decisions.
    let mut by_key: BTreeMap<(AgentType, String), RoutingDecision> = BTreeMap::new();
    for decision in decisions {
        by_key.insert(
            (decision.target_agent, decision_key(decision)),
            decision.clone(),
        );
    }
    let targets: BTreeSet<AgentType> = decisions.iter().map(|d| d.target_agent).collect();
    let mut undistributed: BTreeSet<(AgentType, String)> = by_key.keys().cloned().collect();

    // Authoritative pass: files each live instance actually processed.
    let mut sections: BTreeMap<AgentType, Vec<InstanceAssignment>> = BTreeMap::new();
    for (id, state) in &snapshot.agents {
        let base = state.agent_type;
        if !base.is_domain() && !targets.contains(&base) {
            continue;
        }
        let files = state
            .last_result
            .as_ref()
            .and_then(|r| r.file_names.clone())
            .unwrap_or_default();

        let mut assignment = InstanceAssignment {
            instance: id.clone(),
            label: None,
            placeholder: false,
            files: Vec::with_capacity(files.len()),
        };
        for file in files {
            let key = (base, file.to_lowercase());
            let decision = by_key.get(&key).cloned();
            if decision.is_some() {
                undistributed.remove(&key);
            }
            assignment.files.push(FileAssignment {
                file_name: file,
                decision,
            });
        }
        sections.entry(base).or_default().push(assignment);
    }

    // Distribute what no instance has claimed yet.
    let leftover_bases: BTreeSet<AgentType> = undistributed.iter().map(|(base, _)| *base).collect();
    for base in leftover_bases {
        let keys: Vec<(AgentType, String)> = undistributed
            .iter()
            .filter(|(b, _)| *b == base)
            .cloned()
            .collect();
        let files: Vec<FileAssignment> = keys
            .iter()
            .filter_map(|key| by_key.get(key))
            .map(|decision| FileAssignment {
                file_name: decision
                    .file_name
                    .clone()
                    .unwrap_or_else(|| decision.file_id.clone()),
                decision: Some(decision.clone()),
            })
            .collect();
        for key in keys {
            undistributed.remove(&key);
        }

        match sections.get_mut(&base) {
            Some(assignments) => {
                // Tentative attribution: the first in-flight instance shows
                // the pending decisions instead of a blank card. Once files
                // appear in some instance's result, the authoritative pass
                // above takes precedence on the next call.
                if let Some(pending) = assignments.iter_mut().find(|a| a.files.is_empty()) {
                    pending.files = files;
                } else if let Some(first) = assignments.first_mut() {
                    first.files.extend(files);
                }
            }
            None => {
                sections.insert(
                    base,
                    vec![InstanceAssignment {
                        instance: InstanceId::singleton(base),
                        label: None,
                        placeholder: true,
                        files,
                    }],
                );
            }
        }
    }

    let mut out: Vec<AgentSection> = sections
        .into_iter()
        .map(|(agent, mut instances)| {
            if instances.len() > 1 {
                for (i, assignment) in instances.iter_mut().enumerate() {
                    let n = assignment
                        .instance
                        .group_number()
                        .unwrap_or((i + 1) as u32);
                    assignment.label = Some(format!("Group {}", n));
                }
            }
            let total_files = instances.iter().map(InstanceAssignment::file_count).sum();
            AgentSection {
                agent,
                instances,
                total_files,
            }
        })
        .collect();

    // Busiest agent first; name tie-break keeps output deterministic.
    out.sort_by(|a, b| {
        b.total_files
            .cmp(&a.total_files)
            .then_with(|| a.agent.as_str().cmp(b.agent.as_str()))
    });
    out
}

fn decision_key(decision: &RoutingDecision) -> String {
    decision
        .file_name
        .as_deref()
        .unwrap_or(&decision.file_id)
        .to_lowercase()
}
