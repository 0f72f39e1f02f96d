// SPDX-License-Identifier: MIT

//! Pipeline loader - YAML file loading and parsing
//!
//! Pipelines are either loaded from a file or taken from the set built into
//! the binary.

use std::fs;
use std::path::Path;

use super::error::DispatchError;
use super::graph::GraphDefinition;

const FIELD_SERVICE: &str = include_str!("../../pipelines/field_service.yaml");
const FIELD_SERVICE_NARRATED: &str = include_str!("../../pipelines/field_service_narrated.yaml");

/// Built-in pipelines as (name, YAML source)
const BUILTIN: &[(&str, &str)] = &[
    ("field_service", FIELD_SERVICE),
    ("field_service_narrated", FIELD_SERVICE_NARRATED),
];

/// Loads pipeline definitions from YAML
pub struct PipelineLoader;

impl PipelineLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a pipeline definition from a YAML file
    pub fn load_pipeline<P: AsRef<Path>>(&self, path: P) -> Result<GraphDefinition, DispatchError> {
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    /// Parse a pipeline definition from a YAML string
    pub fn parse_yaml(content: &str) -> Result<GraphDefinition, DispatchError> {
        let def: GraphDefinition = serde_yaml::from_str(content)?;
        Ok(def)
    }

    /// YAML source of a built-in pipeline
    pub fn builtin(name: &str) -> Option<&'static str> {
        BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, source)| *source)
    }

    pub fn builtin_names() -> Vec<&'static str> {
        BUILTIN.iter().map(|(name, _)| *name).collect()
    }

    /// Resolve a built-in name first, then fall back to a file path
    pub fn resolve(&self, name_or_path: &str) -> Result<GraphDefinition, DispatchError> {
        if let Some(source) = Self::builtin(name_or_path) {
            log::debug!("Using built-in pipeline '{}'", name_or_path);
            return Self::parse_yaml(source);
        }

        let path = Path::new(name_or_path);
        if path.exists() {
            return self.load_pipeline(path);
        }

        Err(DispatchError::config(format!(
            "Unknown pipeline '{}': not a built-in ({}) and no such file",
            name_or_path,
            Self::builtin_names().join(", ")
        )))
    }
}

impl Default for PipelineLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graph::END;

    #[test]
    fn test_builtin_field_service_parses() {
        let def = PipelineLoader::parse_yaml(PipelineLoader::builtin("field_service").unwrap())
            .unwrap();

        assert_eq!(def.name, "field_service");
        assert_eq!(def.entry, "schedule");
        assert_eq!(def.input_field, "goal");
        let ids: Vec<_> = def.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["schedule", "service_insight", "knowledge"]);
        assert_eq!(def.edges.last().unwrap().to, END);

        let schema = def.state.unwrap();
        for field in ["goal", "work_order_id", "product_id", "description", "documentation"] {
            assert!(schema.contains(field), "missing {}", field);
        }
    }

    #[test]
    fn test_builtin_narrated_ends_with_final_answer() {
        let def = PipelineLoader::new().resolve("field_service_narrated").unwrap();
        let last = def.edges.iter().find(|e| e.to == END).unwrap();
        assert_eq!(last.from, "final_answer");
        assert!(def.state.unwrap().contains("final_answer"));
    }

    #[test]
    fn test_resolve_unknown_pipeline() {
        let err = PipelineLoader::new()
            .resolve("no_such_pipeline.yaml")
            .unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
        assert!(err.to_string().contains("field_service"));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = PipelineLoader::parse_yaml("name: [unclosed");
        assert!(matches!(result, Err(DispatchError::Yaml(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("dispatch-loader-{}.yaml", std::process::id()));
        fs::write(
            &path,
            "name: tiny\nentry: a\nnodes: [{ id: a, step: scheduling }]\nedges: [{ from: a, to: __end__ }]\n",
        )
        .unwrap();

        let def = PipelineLoader::new()
            .resolve(path.to_str().unwrap())
            .unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(def.name, "tiny");
        assert_eq!(def.nodes[0].step, "scheduling");
    }
}
