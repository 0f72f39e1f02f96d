// SPDX-License-Identifier: MIT

//! Pipeline definition types
//!
//! A definition is plain data: it can be built in code with the builder
//! methods or deserialized from YAML, and is validated by
//! [`compile`](super::compile).

use serde::{Deserialize, Serialize};

use crate::engine::state::StateSchema;

/// Terminal marker; an edge pointing here ends the chain
pub const END: &str = "__end__";

/// Field seeded with the caller's goal when none is configured
pub const DEFAULT_INPUT_FIELD: &str = "goal";

fn default_input_field() -> String {
    DEFAULT_INPUT_FIELD.to_string()
}

/// A pipeline definition: nodes, edges and an entry point
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GraphDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Node the run starts at
    #[serde(default)]
    pub entry: String,
    /// State field that receives the run's goal
    #[serde(default = "default_input_field")]
    pub input_field: String,
    /// Optional schema; when present, unknown keys are rejected at merge time
    #[serde(default)]
    pub state: Option<StateSchema>,
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
}

/// A node bound to a registered step
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NodeDefinition {
    pub id: String,
    pub step: String,
}

/// A directed edge; `to` may be [`END`]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EdgeDefinition {
    pub from: String,
    pub to: String,
}

impl GraphDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            entry: String::new(),
            input_field: default_input_field(),
            state: None,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn node(mut self, id: impl Into<String>, step: impl Into<String>) -> Self {
        self.nodes.push(NodeDefinition {
            id: id.into(),
            step: step.into(),
        });
        self
    }

    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push(EdgeDefinition {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    pub fn entry(mut self, node: impl Into<String>) -> Self {
        self.entry = node.into();
        self
    }

    pub fn input_field(mut self, field: impl Into<String>) -> Self {
        self.input_field = field.into();
        self
    }

    pub fn state(mut self, schema: StateSchema) -> Self {
        self.state = Some(schema);
        self
    }

    /// Chain the given nodes in order and terminate the last one at [`END`].
    /// The first node becomes the entry point.
    pub fn chain(mut self, node_ids: &[&str]) -> Self {
        if let Some(first) = node_ids.first() {
            self.entry = first.to_string();
        }
        for pair in node_ids.windows(2) {
            self = self.edge(pair[0], pair[1]);
        }
        if let Some(last) = node_ids.last() {
            self = self.edge(*last, END);
        }
        self
    }
}
