// Loading flow definitions from TOML or JSON

use crate::graph::FlowGraph;
use crate::types::FlowDefinition;
use anyhow::{Context, Result};
use std::path::Path;

/// On-disk format of a flow definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Toml,
    Json,
}

impl DefinitionFormat {
    /// Pick a format from a file extension, defaulting to TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

impl FlowDefinition {
    /// Parse a definition from text in the given format
    pub fn parse(content: &str, format: DefinitionFormat) -> Result<Self> {
        match format {
            DefinitionFormat::Toml => {
                toml::from_str(content).context("Failed to parse TOML flow definition")
            }
            DefinitionFormat::Json => {
                serde_json::from_str(content).context("Failed to parse JSON flow definition")
            }
        }
    }

    /// Load a definition from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read flow definition {}", path.display()))?;
        let definition = Self::parse(&content, DefinitionFormat::from_path(path))
            .with_context(|| format!("Invalid flow definition {}", path.display()))?;

        tracing::info!(
            "Loaded flow definition {}: {} steps, {} listeners, {} routers",
            path.display(),
            definition.steps.len(),
            definition.listeners.len(),
            definition.routers.len()
        );

        Ok(definition)
    }

    /// Validate and index this definition
    pub fn build(&self) -> Result<FlowGraph> {
        FlowGraph::from_definition(self).context("Invalid flow graph")
    }
}
