// SPDX-License-Identifier: MIT

//! HTTP interface for running the compiled pipeline

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::engine::error::{DispatchError, ExecutionError};
use crate::engine::orchestrator::Orchestrator;
use crate::engine::registry::StepRegistry;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub registry: Arc<StepRegistry>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, registry: StepRegistry) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            registry: Arc::new(registry),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/steps", get(list_steps))
        .route("/api/pipeline", get(get_pipeline))
        .route("/api/runs", post(create_run))
        .route("/api/runs/stream", post(stream_run))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> Result<(), DispatchError> {
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_steps(State(app): State<AppState>) -> Json<Value> {
    let steps: Vec<Value> = app
        .registry
        .all()
        .into_iter()
        .map(|name| {
            let description = app
                .registry
                .resolve(&name)
                .map(|step| step.description().to_string())
                .unwrap_or_default();
            json!({ "name": name, "description": description })
        })
        .collect();
    Json(json!(steps))
}

async fn get_pipeline(State(app): State<AppState>) -> Json<Value> {
    let graph = app.orchestrator.graph();
    let nodes: Vec<Value> = graph
        .order()
        .iter()
        .filter_map(|id| graph.node(id))
        .map(|node| json!({ "id": node.id, "step": node.step_name }))
        .collect();

    Json(json!({
        "name": graph.name(),
        "description": graph.description(),
        "entry": graph.entry(),
        "input_field": graph.input_field(),
        "nodes": nodes,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub goal: String,
}

async fn create_run(
    State(app): State<AppState>,
    Json(payload): Json<RunRequest>,
) -> (StatusCode, Json<Value>) {
    match app.orchestrator.run_traced(payload.goal, None).await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({
                "run_id": report.run_id,
                "started_at": report.started_at,
                "state": report.state,
                "steps": report.steps,
            })),
        ),
        Err(e) => {
            log::error!("Run failed: {}", e);
            let status = match e {
                ExecutionError::StepExecution { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                ExecutionError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            };
            (status, Json(json!({ "error": e.to_string(), "node": e.node() })))
        }
    }
}

async fn stream_run(
    State(app): State<AppState>,
    Json(payload): Json<RunRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(100);

    tokio::spawn(async move {
        log::info!("Starting streaming run for goal: {}", payload.goal);
        // Step failures reach the client as node_failed events
        if let Err(e) = app.orchestrator.run_traced(payload.goal, Some(tx)).await {
            log::error!("Streaming run failed: {}", e);
        }
    });

    let stream = ReceiverStream::new(rx).map(|event| {
        Ok(Event::default()
            .json_data(&event)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents;
    use crate::engine::loader::PipelineLoader;
    use crate::engine::step::{step_fn, PartialUpdate, StepOutcome};
    use crate::services::ServiceCatalog;

    fn app_state(catalog: ServiceCatalog) -> AppState {
        let mut registry = StepRegistry::new();
        agents::register_defaults(&mut registry, Arc::new(catalog)).unwrap();
        let def = PipelineLoader::new().resolve("field_service").unwrap();
        let orchestrator = Orchestrator::new(&registry, &def).unwrap();
        AppState::new(orchestrator, registry)
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health_check().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_steps() {
        let Json(body) = list_steps(State(app_state(ServiceCatalog::default()))).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["knowledge", "scheduling", "service_insight"]);
    }

    #[tokio::test]
    async fn test_get_pipeline_lists_chain() {
        let Json(body) = get_pipeline(State(app_state(ServiceCatalog::default()))).await;
        assert_eq!(body["entry"], "schedule");
        assert_eq!(body["nodes"][2]["step"], "knowledge");
    }

    #[tokio::test]
    async fn test_create_run() {
        let request = RunRequest {
            goal: "Tell me today's work order".to_string(),
        };
        let (status, Json(body)) =
            create_run(State(app_state(ServiceCatalog::default())), Json(request)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["documentation"], "AC-987 Installation & Maintenance Manual");
        assert_eq!(body["steps"].as_array().unwrap().len(), 3);
        assert!(body["run_id"].is_string());
    }

    #[tokio::test]
    async fn test_create_run_reports_failing_node() {
        let mut registry = StepRegistry::new();
        registry
            .register(
                "scheduling",
                Arc::new(step_fn("ok", |_| {
                    Ok(StepOutcome::update(PartialUpdate::new().with("work_order_id", "WO-1")))
                })),
            )
            .unwrap();
        registry
            .register("service_insight", Arc::new(step_fn("down", |_| Err("backend offline".into()))))
            .unwrap();
        registry
            .register("knowledge", Arc::new(step_fn("noop", |_| Ok(StepOutcome::Miss))))
            .unwrap();
        let def = PipelineLoader::new().resolve("field_service").unwrap();
        let app = AppState::new(Orchestrator::new(&registry, &def).unwrap(), registry);

        let request = RunRequest {
            goal: "today".to_string(),
        };
        let (status, Json(body)) = create_run(State(app), Json(request)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["node"], "service_insight");
        assert!(body["error"].as_str().unwrap().contains("backend offline"));
    }

    #[tokio::test]
    async fn test_router_builds() {
        let _router = router(app_state(ServiceCatalog::empty()));
    }
}
