// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use dispatch_rs::agents;
use dispatch_rs::engine::graph::Next;
use dispatch_rs::engine::loader::PipelineLoader;
use dispatch_rs::engine::{Orchestrator, StepRegistry};
use dispatch_rs::model::{self, Model, OpenAIModel, ScriptedModel};
use dispatch_rs::server::{self, AppState};
use dispatch_rs::services::ServiceCatalog;

const DEFAULT_GOAL: &str = "Tell me today's scheduled work order, give me details about it, \
and provide any relevant documentation.";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline once and print the final state
    Run {
        /// What the technician is asking for
        #[arg(short, long, default_value = DEFAULT_GOAL)]
        goal: String,

        /// Abort the run after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Print per-step records
        #[arg(long)]
        trace: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Print the registered steps and the compiled chain
    Graph {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Serve the pipeline over HTTP
    Serve {
        #[arg(long, default_value_t = 3000)]
        port: u16,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Built-in pipeline name or path to a YAML file
    #[arg(short, long)]
    pipeline: Option<String>,

    /// YAML file replacing the built-in service catalog
    #[arg(long)]
    catalog: Option<String>,

    /// Override today's scheduled work order
    #[arg(long)]
    scheduled: Option<String>,

    /// Add the model-backed final_answer step
    #[arg(long)]
    narrate: bool,

    /// Model name (falls back to MODEL_NAME)
    #[arg(short, long)]
    model: Option<String>,

    /// Answer with this fixed text instead of calling a model
    #[arg(long)]
    scripted: Option<String>,
}

impl PipelineArgs {
    /// `--scripted` stands in for the model, so it narrates too
    fn narrated(&self) -> bool {
        self.narrate || self.scripted.is_some()
    }

    fn pipeline_name(&self) -> &str {
        match (&self.pipeline, self.narrated()) {
            (Some(name), _) => name.as_str(),
            (None, true) => "field_service_narrated",
            (None, false) => "field_service",
        }
    }

    fn catalog(&self) -> anyhow::Result<ServiceCatalog> {
        let catalog = match &self.catalog {
            Some(path) => ServiceCatalog::load(path)
                .with_context(|| format!("Failed to load catalog from {}", path))?,
            None => ServiceCatalog::default(),
        };
        Ok(match &self.scheduled {
            Some(work_order_id) => catalog.with_scheduled(work_order_id.clone()),
            None => catalog,
        })
    }

    fn model(&self) -> anyhow::Result<Arc<dyn Model>> {
        if let Some(text) = &self.scripted {
            return Ok(Arc::new(ScriptedModel::new([text.clone()])));
        }
        let model_name = model::model_name_from_env(self.model.as_deref());
        log::info!("Using model: {}", model_name);
        Ok(Arc::new(OpenAIModel::new(model_name)?))
    }

    /// Register steps and compile the selected pipeline
    fn build(&self) -> anyhow::Result<(StepRegistry, Orchestrator)> {
        let name = self.pipeline_name();
        let def = PipelineLoader::new().resolve(name)?;

        let mut registry = StepRegistry::new();
        agents::register_defaults_for(&mut registry, Arc::new(self.catalog()?), &def.input_field)?;
        if self.narrated() {
            agents::register_narrator_for(&mut registry, self.model()?, &def.input_field)?;
        }

        let orchestrator = Orchestrator::new(&registry, &def)
            .with_context(|| format!("Pipeline '{}' failed to compile", name))?;
        Ok((registry, orchestrator))
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            goal,
            timeout_secs,
            trace,
            pipeline,
        } => {
            let (_, orchestrator) = pipeline.build()?;

            let run = orchestrator.run_traced(goal, None);
            let report = match timeout_secs {
                Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), run).await {
                    Ok(result) => result?,
                    Err(_) => bail!("Run timed out after {}s", secs),
                },
                None => run.await?,
            };

            if trace {
                println!("=== TRACE (run {}) ===", report.run_id);
                for record in &report.steps {
                    println!(
                        "{} [{}] {} ({} ms)",
                        record.node,
                        record.step,
                        serde_json::to_string(&record.outcome)?,
                        record.elapsed_ms
                    );
                }
            }

            println!("\n=== FINAL RESULT ===");
            for (key, value) in report.state.iter() {
                println!("{}: {}", key, display_value(value));
            }
        }
        Commands::Graph { pipeline } => {
            let (registry, orchestrator) = pipeline.build()?;

            println!("Registered steps:");
            for name in registry.all() {
                let step = registry.resolve(&name)?;
                println!("  {} - {}", name, step.description());
            }

            let graph = orchestrator.graph();
            println!("\nPipeline '{}': {}", graph.name(), graph.description());
            for id in graph.order() {
                let Some(node) = graph.node(id) else { continue };
                let next = match graph.next(id) {
                    Some(Next::Node(next)) => next.as_str(),
                    _ => "END",
                };
                println!("  {} [{}] -> {}", node.id, node.step_name, next);
            }
        }
        Commands::Serve { port, pipeline } => {
            let (registry, orchestrator) = pipeline.build()?;
            server::serve(AppState::new(orchestrator, registry), port).await?;
        }
    }

    Ok(())
}
