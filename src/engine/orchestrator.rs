// SPDX-License-Identifier: MIT

//! Orchestrator - the entry point callers use
//!
//! The graph is compiled once, at construction, so misconfiguration surfaces
//! before any run is attempted. Every run starts from a fresh state.

use std::sync::Arc;
use tokio::sync::mpsc;

use super::error::{ExecutionError, GraphError};
use super::graph::{compile, CompiledGraph, ExecutionEvent, ExecutionReport, Executor, GraphDefinition};
use super::registry::StepRegistry;
use super::state::WorkflowState;
use super::step::PartialUpdate;

/// Compiled pipeline plus the logic to seed and run it
#[derive(Debug, Clone)]
pub struct Orchestrator {
    graph: Arc<CompiledGraph>,
}

impl Orchestrator {
    /// Compile `def` against `registry`
    pub fn new(registry: &StepRegistry, def: &GraphDefinition) -> Result<Self, GraphError> {
        let graph = compile(def, registry)?;
        Ok(Self {
            graph: Arc::new(graph),
        })
    }

    pub fn graph(&self) -> &CompiledGraph {
        &self.graph
    }

    /// Run the pipeline for `goal` and return the final state
    pub async fn run(&self, goal: impl Into<String>) -> Result<WorkflowState, ExecutionError> {
        let initial = self.seed(goal.into())?;
        Executor::new().execute(&self.graph, &initial).await
    }

    /// Run the pipeline, keeping per-node records and optionally streaming events
    pub async fn run_traced(
        &self,
        goal: impl Into<String>,
        events: Option<mpsc::Sender<ExecutionEvent>>,
    ) -> Result<ExecutionReport, ExecutionError> {
        let initial = self.seed(goal.into())?;
        let executor = match events {
            Some(tx) => Executor::with_events(tx),
            None => Executor::new(),
        };
        executor.execute_traced(&self.graph, &initial).await
    }

    fn seed(&self, goal: String) -> Result<WorkflowState, ExecutionError> {
        let mut state = self.graph.initial_state();
        state.merge(PartialUpdate::new().with(self.graph.input_field(), goal))?;
        Ok(state)
    }
}
