//! Pipeline topology configuration

use crate::state::AgentType;
use serde::{Deserialize, Serialize};

/// Which domain agents this deployment runs.
///
/// The agent-type set is closed at compile time; this selects the active
/// subset and thereby the fan-out edges of the derived graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub domain_agents: Vec<AgentType>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            domain_agents: vec![
                AgentType::Financial,
                AgentType::Legal,
                AgentType::Evidence,
                AgentType::Strategy,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_domain_agents() {
        let config = PipelineConfig::default();
        assert_eq!(config.domain_agents.len(), 4);
        assert!(config.domain_agents.iter().all(AgentType::is_domain));
    }

    #[test]
    fn parses_from_toml() {
        let config: PipelineConfig =
            toml::from_str(r#"domain_agents = ["financial", "legal"]"#).unwrap();
        assert_eq!(
            config.domain_agents,
            vec![AgentType::Financial, AgentType::Legal]
        );
    }
}
