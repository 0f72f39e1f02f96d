// SPDX-License-Identifier: MIT

//! Graph executor - walks a compiled chain and accumulates state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::compiler::{CompiledGraph, Next};
use crate::engine::error::ExecutionError;
use crate::engine::state::WorkflowState;
use crate::engine::step::StepError;

/// Progress notifications for streaming consumers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    NodeStarted { node: String },
    NodeUpdated { node: String, keys: Vec<String> },
    NodeMissed { node: String },
    NodeFailed { node: String, error: String },
    Completed { state: serde_json::Value },
}

/// What a node contributed to the state
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordedOutcome {
    Updated { keys: Vec<String> },
    /// Ran successfully without new data
    Miss,
}

/// Per-node execution record
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub node: String,
    pub step: String,
    #[serde(flatten)]
    pub outcome: RecordedOutcome,
    pub elapsed_ms: u64,
}

/// Result of a full run
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepRecord>,
    pub state: WorkflowState,
}

/// Drives a [`CompiledGraph`] one node at a time.
///
/// Each step is awaited before the next starts. A failing step stops the run;
/// the state accumulated so far is dropped.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    events: Option<mpsc::Sender<ExecutionEvent>>,
}

impl Executor {
    pub fn new() -> Self {
        Self { events: None }
    }

    /// Emit [`ExecutionEvent`]s on `tx` while running
    pub fn with_events(tx: mpsc::Sender<ExecutionEvent>) -> Self {
        Self { events: Some(tx) }
    }

    /// Run `graph` from its entry node and return the final state
    pub async fn execute(
        &self,
        graph: &CompiledGraph,
        initial_state: &WorkflowState,
    ) -> Result<WorkflowState, ExecutionError> {
        Ok(self.execute_traced(graph, initial_state).await?.state)
    }

    /// Run `graph` and keep a per-node record alongside the final state
    pub async fn execute_traced(
        &self,
        graph: &CompiledGraph,
        initial_state: &WorkflowState,
    ) -> Result<ExecutionReport, ExecutionError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = initial_state.clone();
        let mut steps = Vec::with_capacity(graph.len());

        log::info!("Run {} started on graph '{}'", run_id, graph.name());

        let mut current = Next::Node(graph.entry().to_string());
        while let Next::Node(node_id) = current {
            let node = graph.node(&node_id).ok_or_else(|| ExecutionError::StepExecution {
                node: node_id.clone(),
                source: format!("node '{}' is missing from the compiled graph", node_id).into(),
            })?;

            log::info!("Executing node: {} (step '{}')", node.id, node.step_name);
            self.emit(ExecutionEvent::NodeStarted {
                node: node.id.clone(),
            })
            .await;

            let node_start = Instant::now();
            let update = match node.step.run(&state).await {
                Ok(outcome) => outcome.into_update(),
                Err(e) => return Err(self.fail(&node.id, e).await),
            };

            let outcome = if update.is_empty() {
                log::warn!("Node {} returned no new data", node.id);
                self.emit(ExecutionEvent::NodeMissed {
                    node: node.id.clone(),
                })
                .await;
                RecordedOutcome::Miss
            } else {
                match state.merge(update) {
                    Ok(keys) => {
                        log::info!("Node {} completed, wrote {:?}", node.id, keys);
                        self.emit(ExecutionEvent::NodeUpdated {
                            node: node.id.clone(),
                            keys: keys.clone(),
                        })
                        .await;
                        RecordedOutcome::Updated { keys }
                    }
                    Err(e) => return Err(self.fail(&node.id, Box::new(e)).await),
                }
            };

            steps.push(StepRecord {
                node: node.id.clone(),
                step: node.step_name.clone(),
                outcome,
                elapsed_ms: node_start.elapsed().as_millis() as u64,
            });

            current = graph.next(&node_id).cloned().unwrap_or(Next::End);
        }

        log::info!(
            "Run {} finished after {} nodes with {} fields",
            run_id,
            steps.len(),
            state.len()
        );
        self.emit(ExecutionEvent::Completed {
            state: state.to_json(),
        })
        .await;

        Ok(ExecutionReport {
            run_id,
            started_at,
            steps,
            state,
        })
    }

    async fn fail(&self, node: &str, source: StepError) -> ExecutionError {
        log::error!("Node {} failed: {}", node, source);
        self.emit(ExecutionEvent::NodeFailed {
            node: node.to_string(),
            error: source.to_string(),
        })
        .await;
        ExecutionError::StepExecution {
            node: node.to_string(),
            source,
        }
    }

    async fn emit(&self, event: ExecutionEvent) {
        if let Some(tx) = &self.events {
            // A consumer that went away must not fail the run
            let _ = tx.send(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graph::{compile, GraphDefinition, END};
    use crate::engine::registry::StepRegistry;
    use crate::engine::state::{FieldType, StateSchema};
    use crate::engine::step::{step_fn, PartialUpdate, Step, StepError, StepOutcome};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Returns a fixed update
    struct MockStep {
        update: PartialUpdate,
    }

    impl MockStep {
        fn new(update: PartialUpdate) -> Self {
            Self { update }
        }
    }

    #[async_trait]
    impl Step for MockStep {
        async fn run(&self, _state: &WorkflowState) -> Result<StepOutcome, StepError> {
            Ok(StepOutcome::update(self.update.clone()))
        }
    }

    /// Captures the keys it saw so tests can check what a step observed
    struct KeyCapturingStep {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl KeyCapturingStep {
        fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            (Self { seen: seen.clone() }, seen)
        }
    }

    #[async_trait]
    impl Step for KeyCapturingStep {
        async fn run(&self, state: &WorkflowState) -> Result<StepOutcome, StepError> {
            *self.seen.lock().unwrap() = state.keys().cloned().collect();
            Ok(StepOutcome::Miss)
        }
    }

    fn chain(registry: &StepRegistry, steps: &[&str]) -> CompiledGraph {
        let mut def = GraphDefinition::new("test");
        for step in steps {
            def = def.node(*step, *step);
        }
        compile(&def.chain(steps), registry).unwrap()
    }

    fn seeded(goal: &str) -> WorkflowState {
        let mut state = WorkflowState::empty();
        state.merge(PartialUpdate::new().with("goal", goal)).unwrap();
        state
    }

    #[tokio::test]
    async fn test_single_node_execution() {
        let mut registry = StepRegistry::new();
        registry
            .register(
                "a",
                Arc::new(MockStep::new(PartialUpdate::new().with("result", "done"))),
            )
            .unwrap();
        let graph = chain(&registry, &["a"]);

        let state = Executor::new().execute(&graph, &seeded("g")).await.unwrap();
        assert_eq!(state.get("result"), Some(&json!("done")));
        assert_eq!(state.get("goal"), Some(&json!("g")));
    }

    #[tokio::test]
    async fn test_later_step_overwrites_earlier() {
        let mut registry = StepRegistry::new();
        registry
            .register(
                "a",
                Arc::new(MockStep::new(PartialUpdate::new().with("status", "draft"))),
            )
            .unwrap();
        registry
            .register(
                "b",
                Arc::new(MockStep::new(PartialUpdate::new().with("status", "final"))),
            )
            .unwrap();
        let graph = chain(&registry, &["a", "b"]);

        let state = Executor::new().execute(&graph, &seeded("g")).await.unwrap();
        assert_eq!(state.get_str("status"), Some("final"));
    }

    #[tokio::test]
    async fn test_step_sees_only_upstream_keys() {
        let (capture, seen) = KeyCapturingStep::new();
        let mut registry = StepRegistry::new();
        registry
            .register(
                "a",
                Arc::new(MockStep::new(PartialUpdate::new().with("work_order_id", "WO-1"))),
            )
            .unwrap();
        registry.register("b", Arc::new(capture)).unwrap();
        registry
            .register(
                "c",
                Arc::new(MockStep::new(PartialUpdate::new().with("documentation", "doc"))),
            )
            .unwrap();
        let graph = chain(&registry, &["a", "b", "c"]);

        Executor::new().execute(&graph, &seeded("g")).await.unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["goal".to_string(), "work_order_id".to_string()]
        );
    }

    #[tokio::test]
    async fn test_initial_state_is_not_aliased() {
        let mut registry = StepRegistry::new();
        registry
            .register(
                "a",
                Arc::new(MockStep::new(PartialUpdate::new().with("work_order_id", "WO-1"))),
            )
            .unwrap();
        let graph = chain(&registry, &["a"]);

        let initial = seeded("g");
        let final_state = Executor::new().execute(&graph, &initial).await.unwrap();

        assert_eq!(initial.len(), 1);
        assert_eq!(final_state.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_stops_chain_and_names_node() {
        let (capture, seen) = KeyCapturingStep::new();
        let mut registry = StepRegistry::new();
        registry
            .register(
                "a",
                Arc::new(step_fn("fails", |_| Err("lookup backend offline".into()))),
            )
            .unwrap();
        registry.register("b", Arc::new(capture)).unwrap();
        let graph = chain(&registry, &["a", "b"]);

        let err = Executor::new()
            .execute(&graph, &seeded("g"))
            .await
            .unwrap_err();

        assert_eq!(err.node(), Some("a"));
        assert!(err.to_string().contains("lookup backend offline"));
        assert!(seen.lock().unwrap().is_empty(), "b must not run");
    }

    #[tokio::test]
    async fn test_schema_rejection_is_step_failure() {
        let mut registry = StepRegistry::new();
        registry
            .register(
                "a",
                Arc::new(MockStep::new(PartialUpdate::new().with("technician", "Tech-01"))),
            )
            .unwrap();
        let def = GraphDefinition::new("typed")
            .node("a", "a")
            .chain(&["a"])
            .state(StateSchema::default().field("goal", FieldType::String));
        let graph = compile(&def, &registry).unwrap();

        let err = Executor::new()
            .execute(&graph, &graph.initial_state())
            .await
            .unwrap_err();
        assert_eq!(err.node(), Some("a"));
        assert!(err.to_string().contains("technician"));
    }

    #[tokio::test]
    async fn test_trace_records_updates_and_misses() {
        let mut registry = StepRegistry::new();
        registry
            .register(
                "a",
                Arc::new(MockStep::new(PartialUpdate::new().with("work_order_id", "WO-1"))),
            )
            .unwrap();
        registry
            .register("b", Arc::new(step_fn("miss", |_| Ok(StepOutcome::Miss))))
            .unwrap();
        registry
            .register(
                "c",
                Arc::new(step_fn("empty", |_| Ok(StepOutcome::update(PartialUpdate::new())))),
            )
            .unwrap();
        let graph = chain(&registry, &["a", "b", "c"]);

        let report = Executor::new()
            .execute_traced(&graph, &seeded("g"))
            .await
            .unwrap();

        let nodes: Vec<_> = report.steps.iter().map(|r| r.node.as_str()).collect();
        assert_eq!(nodes, vec!["a", "b", "c"]);
        assert_eq!(
            report.steps[0].outcome,
            RecordedOutcome::Updated {
                keys: vec!["work_order_id".to_string()]
            }
        );
        assert_eq!(report.steps[1].outcome, RecordedOutcome::Miss);
        assert_eq!(report.steps[2].outcome, RecordedOutcome::Miss);
        assert_eq!(report.state.len(), 2);
    }

    #[tokio::test]
    async fn test_events_are_emitted_in_order() {
        let mut registry = StepRegistry::new();
        registry
            .register(
                "a",
                Arc::new(MockStep::new(PartialUpdate::new().with("work_order_id", "WO-1"))),
            )
            .unwrap();
        registry
            .register("b", Arc::new(step_fn("miss", |_| Ok(StepOutcome::Miss))))
            .unwrap();
        let graph = chain(&registry, &["a", "b"]);

        let (tx, mut rx) = mpsc::channel(16);
        Executor::with_events(tx)
            .execute(&graph, &seeded("g"))
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert_eq!(events.len(), 5);
        assert_eq!(events[0], ExecutionEvent::NodeStarted { node: "a".into() });
        assert_eq!(
            events[1],
            ExecutionEvent::NodeUpdated {
                node: "a".into(),
                keys: vec!["work_order_id".into()]
            }
        );
        assert_eq!(events[3], ExecutionEvent::NodeMissed { node: "b".into() });
        assert!(matches!(events[4], ExecutionEvent::Completed { .. }));
    }

    #[tokio::test]
    async fn test_dropped_event_receiver_does_not_fail_run() {
        let mut registry = StepRegistry::new();
        registry
            .register("a", Arc::new(step_fn("miss", |_| Ok(StepOutcome::Miss))))
            .unwrap();
        let graph = chain(&registry, &["a"]);

        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let result = Executor::with_events(tx).execute(&graph, &seeded("g")).await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_event_serialization() {
        let event = ExecutionEvent::NodeUpdated {
            node: "knowledge".into(),
            keys: vec!["documentation".into()],
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "node_updated", "node": "knowledge", "keys": ["documentation"]})
        );
    }

    #[test]
    fn test_chain_helper_terminates() {
        let mut registry = StepRegistry::new();
        registry
            .register("a", Arc::new(step_fn("miss", |_| Ok(StepOutcome::Miss))))
            .unwrap();
        let graph = chain(&registry, &["a"]);
        assert_eq!(graph.next("a"), Some(&Next::End));
        assert_eq!(END, "__end__");
    }
}
