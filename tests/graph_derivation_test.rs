//! Graph derivation: progressive reveal, file-group routing, determinism.

mod common;

use command_center::event::validate;
use command_center::graph::{derive, NodeKind, Topology};
use command_center::state::PipelineStore;
use serde_json::{json, Value};

fn store_after(payloads: &[Value]) -> PipelineStore {
    let mut store = PipelineStore::new();
    for payload in payloads {
        store.apply(&validate(payload).unwrap());
    }
    store
}

fn visible_ids(graph: &command_center::graph::ProcessGraph) -> Vec<&str> {
    graph
        .nodes
        .iter()
        .filter(|n| n.visible)
        .map(|n| n.id.as_str())
        .collect()
}

#[test]
fn progressive_reveal_follows_pipeline_stages() {
    let topology = Topology::default();

    // Nothing has happened: only triage shows.
    let store = store_after(&[]);
    assert_eq!(visible_ids(&derive(&store.snapshot(), &topology)), ["triage"]);

    // Triage processing: still only triage (orchestrator waits for progress...
    // processing counts as progress, so the orchestrator appears).
    let store = store_after(&[common::started("triage", "t1", "f1", "a.pdf")]);
    let graph = derive(&store.snapshot(), &topology);
    assert!(visible_ids(&graph).contains(&"orchestrator"));
    assert!(!visible_ids(&graph).contains(&"legal"));

    // Orchestrator completed: domain agents and knowledge graph appear.
    let store = store_after(&[
        common::started("triage", "t1", "f1", "a.pdf"),
        common::completed("triage", "t1"),
        common::started("orchestrator", "t2", "f1", "a.pdf"),
        common::completed("orchestrator", "t2"),
    ]);
    let graph = derive(&store.snapshot(), &topology);
    let visible = visible_ids(&graph);
    for id in ["triage", "orchestrator", "financial", "legal", "evidence", "strategy", "knowledge-graph"] {
        assert!(visible.contains(&id), "{} should be visible", id);
    }
}

#[test]
fn errored_instance_stays_visible() {
    let topology = Topology::default();
    // A domain agent that errors before the orchestrator "officially"
    // progressed is still revealed: errors must be visible.
    let store = store_after(&[
        common::started("legal", "t1", "f1", "a.pdf"),
        common::errored("legal", "t1", "boom"),
    ]);
    let graph = derive(&store.snapshot(), &topology);
    assert!(visible_ids(&graph).contains(&"legal"));
}

#[test]
fn chosen_marks_active_and_previously_completed() {
    let topology = Topology::default();
    let store = store_after(&[
        common::started("triage", "t1", "f1", "a.pdf"),
        common::completed("triage", "t1"),
        common::started("orchestrator", "t2", "f1", "a.pdf"),
    ]);
    let graph = derive(&store.snapshot(), &topology);

    let triage = graph.nodes.iter().find(|n| n.id == "triage").unwrap();
    let orchestrator = graph.nodes.iter().find(|n| n.id == "orchestrator").unwrap();
    let legal = graph.nodes.iter().find(|n| n.id == "legal").unwrap();
    assert!(triage.chosen, "idle with a result is chosen");
    assert!(orchestrator.chosen, "processing is chosen");
    assert!(!legal.chosen, "untouched placeholder is not chosen");

    let edge = graph
        .edges
        .iter()
        .find(|e| e.source == "triage" && e.target == "orchestrator")
        .unwrap();
    assert!(edge.chosen);
    assert!(edge.highlight_processing, "destination is processing");
}

#[test]
fn file_groups_split_orchestrator_edges() {
    let topology = Topology::default();
    let store = store_after(&[
        common::started("triage", "t1", "f1", "a.pdf"),
        common::completed("triage", "t1"),
        common::started("orchestrator", "t2", "f1", "a.pdf"),
        common::orchestrator_completed(
            "t2",
            json!([]),
            json!([{
                "group_id": "g1",
                "file_ids": ["f1", "f2"],
                "target_agents": ["financial"],
                "shared_context": "Q3 statements"
            }]),
        ),
        common::started("financial", "t3", "f1", "a.pdf"),
    ]);
    let graph = derive(&store.snapshot(), &topology);

    let group = graph.nodes.iter().find(|n| n.id == "g1").unwrap();
    assert_eq!(group.kind, NodeKind::FileGroup);
    assert!(group.chosen, "a target is processing, so the group is active");
    assert_eq!(group.badges.files, Some(2));

    let into_group = graph
        .edges
        .iter()
        .find(|e| e.source == "orchestrator" && e.target == "g1")
        .unwrap();
    assert!(into_group.chosen);

    let out_of_group = graph
        .edges
        .iter()
        .find(|e| e.source == "g1" && e.target == "financial")
        .unwrap();
    assert!(out_of_group.highlight_processing);

    // The direct edge is replaced by the two-hop route.
    assert!(!graph
        .edges
        .iter()
        .any(|e| e.source == "orchestrator" && e.target == "financial"));

    // Edges to agents no group targets stay direct.
    assert!(graph
        .edges
        .iter()
        .any(|e| e.source == "orchestrator" && e.target == "legal"));
}

#[test]
fn multi_target_groups_are_linked_once_from_orchestrator() {
    let topology = Topology::default();
    let store = store_after(&[
        common::started("triage", "t1", "f1", "a.pdf"),
        common::completed("triage", "t1"),
        common::started("orchestrator", "t2", "f1", "a.pdf"),
        common::orchestrator_completed(
            "t2",
            json!([]),
            json!([{
                "group_id": "g1",
                "file_ids": ["f1"],
                "target_agents": ["financial", "legal"]
            }]),
        ),
    ]);
    let graph = derive(&store.snapshot(), &topology);

    let into_group = graph
        .edges
        .iter()
        .filter(|e| e.source == "orchestrator" && e.target == "g1")
        .count();
    assert_eq!(into_group, 1, "one orchestrator edge per distinct group");

    let out_of_group: Vec<&str> = graph
        .edges
        .iter()
        .filter(|e| e.source == "g1")
        .map(|e| e.target.as_str())
        .collect();
    assert_eq!(out_of_group, vec!["financial", "legal"]);
}

#[test]
fn parallel_instances_get_their_own_nodes_and_edges() {
    let topology = Topology::default();
    let store = store_after(&[
        common::started("triage", "t1", "f1", "a.pdf"),
        common::completed("triage", "t1"),
        common::started("orchestrator", "t2", "f1", "a.pdf"),
        common::completed("orchestrator", "t2"),
        common::started("financial_grp_1", "t3", "f1", "a.xlsx"),
        common::started("financial_grp_2", "t4", "f2", "b.xlsx"),
    ]);
    let graph = derive(&store.snapshot(), &topology);

    let labels: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|n| n.id.starts_with("financial_grp_"))
        .map(|n| n.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Financial · Group 1", "Financial · Group 2"]);

    for id in ["financial_grp_1", "financial_grp_2"] {
        assert!(
            graph
                .edges
                .iter()
                .any(|e| e.source == "orchestrator" && e.target == id),
            "missing fan-out edge to {}",
            id
        );
        assert!(
            graph
                .edges
                .iter()
                .any(|e| e.source == id && e.target == "knowledge-graph"),
            "missing fan-in edge from {}",
            id
        );
    }
}

#[test]
fn derivation_is_deterministic() {
    let topology = Topology::default();
    let store = store_after(&[
        common::started("triage", "t1", "f1", "a.pdf"),
        common::completed("triage", "t1"),
        common::started("orchestrator", "t2", "f1", "a.pdf"),
        common::orchestrator_completed(
            "t2",
            json!([common::decision("a.pdf", "financial", 90.0)]),
            json!([{"group_id": "g1", "file_ids": ["f1"], "target_agents": ["financial"]}]),
        ),
        common::started("financial_grp_1", "t3", "f1", "a.pdf"),
    ]);

    let snapshot = store.snapshot();
    let first = derive(&snapshot, &topology);
    let second = derive(&snapshot, &topology);
    assert_eq!(first, second);
}

#[test]
fn visibility_is_monotonic_across_a_session() {
    let topology = Topology::default();
    let script = [
        common::started("triage", "t1", "f1", "a.pdf"),
        common::completed("triage", "t1"),
        common::started("orchestrator", "t2", "f1", "a.pdf"),
        common::completed("orchestrator", "t2"),
        common::started("legal", "t3", "f1", "a.pdf"),
        common::errored("legal", "t3", "boom"),
        common::started("legal", "t4", "f2", "b.pdf"),
        common::completed("legal", "t4"),
    ];

    let mut store = PipelineStore::new();
    let mut seen: std::collections::BTreeSet<String> = Default::default();
    for payload in &script {
        store.apply(&validate(payload).unwrap());
        let graph = derive(&store.snapshot(), &topology);
        let now: std::collections::BTreeSet<String> = graph
            .nodes
            .iter()
            .filter(|n| n.visible)
            .map(|n| n.id.clone())
            .collect();
        assert!(
            seen.is_subset(&now),
            "visibility regressed: {:?} -> {:?}",
            seen,
            now
        );
        seen = now;
    }
}

#[test]
fn badges_surface_result_counters() {
    let topology = Topology::default();
    let store = store_after(&[
        common::started("legal", "t1", "f1", "a.pdf"),
        common::completed_with_result(
            "legal",
            "t1",
            json!({
                "taskId": "t1",
                "agentType": "legal",
                "outputs": [{"type": "analysis", "data": "ok"}],
                "metadata": {"warnings": ["missing signature page"], "duration_ms": 4200},
                "fileNames": ["a.pdf", "b.pdf"]
            }),
        ),
    ]);
    let graph = derive(&store.snapshot(), &topology);

    let legal = graph.nodes.iter().find(|n| n.id == "legal").unwrap();
    assert_eq!(legal.badges.files, Some(2));
    assert_eq!(legal.badges.warnings, Some(1));
    assert_eq!(legal.badges.duration_ms, Some(4200));
}
