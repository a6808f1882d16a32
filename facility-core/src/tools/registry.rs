//! Tool registry for registration, lookup and listing

use super::tool::{BoxedTool, Tool};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Tool with this name already exists
    DuplicateTool(String),
    /// Tool not found
    NotFound(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicateTool(name) => {
                write!(f, "Tool '{}' is already registered", name)
            }
            RegistryError::NotFound(name) => {
                write!(f, "Tool '{}' not found", name)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Summary of a tool for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub returns: String,
    pub tags: Vec<String>,
}

impl From<&dyn Tool> for ToolSummary {
    fn from(tool: &dyn Tool) -> Self {
        let metadata = tool.metadata();
        Self {
            name: metadata.name.clone(),
            description: metadata.description.clone(),
            returns: metadata.returns.clone(),
            tags: metadata.tags.clone(),
        }
    }
}

/// Name-keyed collection of tools
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, BoxedTool>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, rejecting duplicate names
    pub fn register(&mut self, tool: BoxedTool) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Register several tools, stopping at the first duplicate name
    pub fn register_all(&mut self, tools: Vec<BoxedTool>) -> Result<(), RegistryError> {
        for tool in tools {
            self.register(tool)?;
        }
        Ok(())
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<BoxedTool> {
        self.tools.get(name).cloned()
    }

    /// Look up a tool by name, failing if absent
    pub fn require(&self, name: &str) -> Result<BoxedTool, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Summaries of all tools, sorted by name
    pub fn list(&self) -> Vec<ToolSummary> {
        self.tools
            .values()
            .map(|tool| ToolSummary::from(tool.as_ref()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod registry_tests {
    use super::*;
    use crate::tools::{PropertySearchTool, ZoningAnalysisTool, stage_registry};
    use std::sync::Arc;

    #[test]
    fn test_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(PropertySearchTool::new()))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get(PropertySearchTool::NAME).is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(ZoningAnalysisTool::new()))
            .unwrap();
        let err = registry
            .register(Arc::new(ZoningAnalysisTool::new()))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateTool(ZoningAnalysisTool::NAME.to_string())
        );
    }

    #[test]
    fn test_register_all_stops_at_duplicate() {
        let mut registry = ToolRegistry::new();
        let err = registry
            .register_all(vec![
                Arc::new(PropertySearchTool::new()),
                Arc::new(PropertySearchTool::new()),
                Arc::new(ZoningAnalysisTool::new()),
            ])
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::DuplicateTool(PropertySearchTool::NAME.to_string())
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_require_missing() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        let err = registry.require("Zoning Analysis").err().unwrap();
        assert_eq!(err.to_string(), "Tool 'Zoning Analysis' not found");
    }

    #[test]
    fn test_stage_registry_lists_sorted() {
        let names: Vec<String> = stage_registry()
            .unwrap()
            .list()
            .into_iter()
            .map(|summary| summary.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "Community Assessment",
                "Facility Planning",
                "Property Search",
                "Zoning Analysis"
            ]
        );
    }
}
