//! Agent Tool Visibility
//!
//! Read-only mapping from an agent name to the tool names it may see,
//! loaded from a JSON object such as `{"researcher": ["search_wiki"]}`.

use super::backend::ToolDescriptor;
use crate::error::{ConfigError, ConfigResult};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentToolMap {
    agents: HashMap<String, Vec<String>>,
}

impl AgentToolMap {
    pub fn new(agents: HashMap<String, Vec<String>>) -> Self {
        Self { agents }
    }

    /// Load the mapping; a missing file yields an empty mapping
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Agent tools file not found, exposing full catalog");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::from_json(&contents)?;
        tracing::info!(path = %path.display(), agents = map.agents.len(), "Loaded agent tools");
        Ok(map)
    }

    pub fn from_json(contents: &str) -> ConfigResult<Self> {
        let agents: HashMap<String, Vec<String>> = serde_json::from_str(contents)
            .map_err(|e| ConfigError::ParseError(format!("agent tools: {e}")))?;
        Ok(Self { agents })
    }

    /// Tool names configured for an agent, if any
    pub fn tools_for(&self, agent: &str) -> Option<&[String]> {
        self.agents
            .get(agent)
            .map(Vec::as_slice)
            .filter(|tools| !tools.is_empty())
    }

    /// Restrict a catalog to the agent's tools, keeping catalog order.
    ///
    /// Agents without a (non-empty) entry see the whole catalog. Names
    /// not present in the catalog are ignored.
    pub fn filter(&self, agent: &str, catalog: &[ToolDescriptor]) -> Vec<ToolDescriptor> {
        match self.tools_for(agent) {
            Some(names) => {
                let visible: HashSet<&str> = names.iter().map(String::as_str).collect();
                catalog
                    .iter()
                    .filter(|tool| visible.contains(tool.name.as_str()))
                    .cloned()
                    .collect()
            }
            None => catalog.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
