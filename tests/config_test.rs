//! Configuration loading from files and environment.

use command_center::config::{LogFormat, TrackerConfig};
use command_center::graph::Topology;
use command_center::state::AgentType;
use std::io::Write;

#[test]
fn loads_full_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[pipeline]
domain_agents = ["financial", "legal"]

[stream]
max_retries = 3
initial_backoff_ms = 250
max_backoff_ms = 5000

[logging]
level = "debug"
format = "json"
"#
    )
    .unwrap();

    let config = TrackerConfig::load(Some(file.path())).unwrap();
    config.validate().unwrap();

    assert_eq!(
        config.pipeline.domain_agents,
        vec![AgentType::Financial, AgentType::Legal]
    );
    assert_eq!(config.stream.max_retries, 3);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn config_drives_the_topology() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[pipeline]
domain_agents = ["evidence"]
"#
    )
    .unwrap();

    let config = TrackerConfig::load(Some(file.path())).unwrap();
    let topology = Topology::standard(&config.pipeline.domain_agents);
    assert_eq!(
        topology.edges(),
        &[
            (AgentType::Triage, AgentType::Orchestrator),
            (AgentType::Orchestrator, AgentType::Evidence),
            (AgentType::Evidence, AgentType::KnowledgeGraph),
        ]
    );
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "pipeline = 42").unwrap();

    let err = TrackerConfig::load(Some(file.path())).unwrap_err();
    assert!(matches!(
        err,
        command_center::config::ConfigError::Parse(_)
    ));
}

#[test]
fn reconnect_policy_comes_from_stream_config() {
    let config: TrackerConfig = toml::from_str(
        r#"
[stream]
max_retries = 2
initial_backoff_ms = 100
max_backoff_ms = 300
"#,
    )
    .unwrap();
    let policy = config.stream.reconnect_policy();
    assert_eq!(policy.max_retries, 2);
    assert_eq!(policy.delay(1), std::time::Duration::from_millis(100));
    assert_eq!(policy.delay(3), std::time::Duration::from_millis(300));
}
