// SPDX-License-Identifier: MIT

//! Graph compilation - validates a definition and resolves its steps

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::types::{GraphDefinition, NodeDefinition, END};
use crate::engine::error::GraphError;
use crate::engine::registry::StepRegistry;
use crate::engine::state::{StateSchema, WorkflowState};
use crate::engine::step::Step;

/// Node with its step resolved from the registry
pub struct CompiledNode {
    pub id: String,
    pub step_name: String,
    pub step: Arc<dyn Step>,
}

/// Where control goes after a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    Node(String),
    End,
}

/// Immutable, validated chain of nodes
pub struct CompiledGraph {
    name: String,
    description: String,
    entry: String,
    input_field: String,
    schema: Option<Arc<StateSchema>>,
    nodes: HashMap<String, CompiledNode>,
    next: HashMap<String, Next>,
    order: Vec<String>,
}

impl CompiledGraph {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn input_field(&self) -> &str {
        &self.input_field
    }

    pub fn schema(&self) -> Option<&StateSchema> {
        self.schema.as_deref()
    }

    pub fn node(&self, id: &str) -> Option<&CompiledNode> {
        self.nodes.get(id)
    }

    /// Successor of `id`; every compiled node has one
    pub fn next(&self, id: &str) -> Option<&Next> {
        self.next.get(id)
    }

    /// Node ids in execution order
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Fresh state for a run: schema-bound (with defaults) when a schema is declared
    pub fn initial_state(&self) -> WorkflowState {
        match &self.schema {
            Some(schema) => WorkflowState::new(schema.clone()),
            None => WorkflowState::empty(),
        }
    }
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("name", &self.name)
            .field("entry", &self.entry)
            .field("order", &self.order)
            .finish()
    }
}

/// Validate `def` against `registry` and produce an immutable graph
pub fn compile(def: &GraphDefinition, registry: &StepRegistry) -> Result<CompiledGraph, GraphError> {
    let mut declared: HashSet<&str> = HashSet::new();
    for node in &def.nodes {
        if node.id == END {
            return Err(GraphError::ReservedNodeName(node.id.clone()));
        }
        if !declared.insert(node.id.as_str()) {
            return Err(GraphError::DuplicateNode(node.id.clone()));
        }
    }

    if !declared.contains(def.entry.as_str()) {
        return Err(GraphError::UnknownNode {
            node: def.entry.clone(),
            referenced_by: "entry point".to_string(),
        });
    }

    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &def.edges {
        let target_ok = edge.to == END || declared.contains(edge.to.as_str());
        let unknown = if !declared.contains(edge.from.as_str()) {
            Some(&edge.from)
        } else if !target_ok {
            Some(&edge.to)
        } else {
            None
        };
        if let Some(node) = unknown {
            return Err(GraphError::UnknownNode {
                node: node.clone(),
                referenced_by: format!("edge {} -> {}", edge.from, edge.to),
            });
        }
        outgoing
            .entry(edge.from.as_str())
            .or_default()
            .push(edge.to.as_str());
    }

    let mut nodes = HashMap::with_capacity(def.nodes.len());
    for node in &def.nodes {
        let step = registry
            .resolve(&node.step)
            .map_err(|_| GraphError::UnresolvedStep {
                node: node.id.clone(),
                step: node.step.clone(),
            })?;
        nodes.insert(
            node.id.clone(),
            CompiledNode {
                id: node.id.clone(),
                step_name: node.step.clone(),
                step,
            },
        );
    }

    let mut next = HashMap::with_capacity(def.nodes.len());
    for node in &def.nodes {
        match outgoing.get(node.id.as_str()).map(Vec::as_slice) {
            None | Some([]) => {}
            Some([target]) => {
                let target = if *target == END {
                    Next::End
                } else {
                    Next::Node(target.to_string())
                };
                next.insert(node.id.clone(), target);
            }
            Some(targets) => {
                return Err(GraphError::BranchingNotSupported {
                    node: node.id.clone(),
                    targets: targets.iter().map(|t| t.to_string()).collect(),
                });
            }
        }
    }

    if let Some(cycle) = find_cycle(&def.nodes, &next) {
        return Err(GraphError::Cycle(cycle));
    }

    // Acyclic with out-degree <= 1, so this walk terminates
    let mut order = Vec::with_capacity(def.nodes.len());
    let mut current = def.entry.clone();
    loop {
        order.push(current.clone());
        match next.get(&current) {
            Some(Next::Node(successor)) => current = successor.clone(),
            Some(Next::End) => break,
            None => return Err(GraphError::UnreachableTerminal(current)),
        }
    }

    let on_chain: HashSet<&str> = order.iter().map(String::as_str).collect();
    if let Some(stray) = def.nodes.iter().find(|n| !on_chain.contains(n.id.as_str())) {
        return Err(GraphError::UnreachableNode(stray.id.clone()));
    }

    if let Some(schema) = &def.state {
        let seed = serde_json::Value::String(String::new());
        if schema.check(&def.input_field, &seed).is_err() {
            return Err(GraphError::UndeclaredInputField(def.input_field.clone()));
        }
        let mut defaults: Vec<_> = schema.defaults().collect();
        defaults.sort_by(|a, b| a.0.cmp(b.0));
        for (field, value) in defaults {
            schema
                .check(field, value)
                .map_err(|e| GraphError::InvalidDefault {
                    field: field.clone(),
                    reason: e.to_string(),
                })?;
        }
    }

    log::info!(
        "Compiled graph '{}' with {} nodes: {}",
        def.name,
        order.len(),
        order.join(" -> ")
    );

    Ok(CompiledGraph {
        name: def.name.clone(),
        description: def.description.clone(),
        entry: def.entry.clone(),
        input_field: def.input_field.clone(),
        schema: def.state.clone().map(Arc::new),
        nodes,
        next,
        order,
    })
}

/// Find a cycle by following each node's single successor.
/// Returns the cycle path with its first node repeated at the end.
fn find_cycle<'a>(
    nodes: &'a [NodeDefinition],
    next: &'a HashMap<String, Next>,
) -> Option<Vec<String>> {
    let mut cleared: HashSet<&'a str> = HashSet::new();

    for node in nodes {
        let mut path: Vec<&'a str> = Vec::new();
        let mut current: &'a str = node.id.as_str();

        loop {
            if cleared.contains(current) {
                break;
            }
            if let Some(pos) = path.iter().position(|id| *id == current) {
                let mut cycle: Vec<String> = path[pos..].iter().map(|s| s.to_string()).collect();
                cycle.push(current.to_string());
                return Some(cycle);
            }
            path.push(current);
            match next.get(current) {
                Some(Next::Node(successor)) => current = successor.as_str(),
                _ => break,
            }
        }

        cleared.extend(path);
    }

    None
}
