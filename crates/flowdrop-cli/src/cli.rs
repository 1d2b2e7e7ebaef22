//! Command definitions and handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use flowdrop_engine::{
    validate_workflow, CompilationError, EngineError, LoggingRealTimeManager,
    OrchestrationOptions, OrchestrationRequest, OrchestrationStatus, Orchestrator,
    ProcessorRegistry, SynchronousOrchestrator, Workflow, WorkflowCompiler,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::{AppConfig, ConfigError};

#[derive(Parser)]
#[command(name = "flowdrop")]
#[command(version, about = "Run FlowDrop workflows from the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./flowdrop.json when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute a workflow and print the orchestration response
    Run {
        /// Workflow JSON file
        workflow: PathBuf,

        /// Initial data as a JSON object
        #[arg(short, long)]
        input: Option<String>,

        /// Pipeline id attached to results
        #[arg(short, long)]
        pipeline: Option<String>,

        /// Stop at the first failed node
        #[arg(long)]
        fail_fast: bool,
    },
    /// Print the execution plan of a workflow
    Compile {
        /// Workflow JSON file
        workflow: PathBuf,
    },
    /// Check a workflow against the registered node types
    Validate {
        /// Workflow JSON file
        workflow: PathBuf,
    },
    /// List registered node types with their schemas
    Nodes {
        /// Include input, output and config schemas
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read workflow {path:?}: {source}")]
    ReadWorkflow {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid workflow {path:?}: {source}")]
    ParseWorkflow {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("--input must be a JSON object: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Compilation(#[from] CompilationError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Workflow has {0} validation error(s)")]
    Invalid(usize),

    #[error("Workflow run {execution_id} finished with status {status:?}")]
    RunFailed {
        execution_id: String,
        status: OrchestrationStatus,
    },

    #[error(transparent)]
    Output(#[from] serde_json::Error),
}

/// Execute a parsed command line
pub async fn execute(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::load(cli.config.as_deref()).await?;
    let mut registry = ProcessorRegistry::new();
    flowdrop_nodes::register_builtins(&mut registry, &config.nodes);

    match cli.command {
        Command::Run {
            workflow,
            input,
            pipeline,
            fail_fast,
        } => {
            let workflow = read_workflow(&workflow).await?;
            let initial = parse_input(input.as_deref())?;
            run(registry, config, workflow, initial, pipeline, fail_fast).await
        }
        Command::Compile { workflow } => {
            let workflow = read_workflow(&workflow).await?;
            let compiled = WorkflowCompiler::new().compile(&workflow)?;
            print_json(&json!({
                "workflowId": compiled.workflow_id,
                "executionOrder": compiled.execution_plan.execution_order,
                "inputMappings": compiled.execution_plan.input_mappings,
                "metadata": compiled.execution_plan.metadata,
            }))
        }
        Command::Validate { workflow } => {
            let workflow = read_workflow(&workflow).await?;
            let errors = validate_workflow(&workflow, Some(&registry));
            if errors.is_empty() {
                println!("Workflow '{}' is valid ({} nodes)", workflow.id, workflow.nodes.len());
                return Ok(());
            }
            for error in &errors {
                println!("- {}", error);
            }
            Err(CliError::Invalid(errors.len()))
        }
        Command::Nodes { verbose } => print_json(&list_nodes(&registry, verbose)),
    }
}

async fn run(
    registry: ProcessorRegistry,
    config: AppConfig,
    workflow: Workflow,
    initial: Map<String, Value>,
    pipeline: Option<String>,
    fail_fast: bool,
) -> Result<(), CliError> {
    let orchestrator = SynchronousOrchestrator::new(Arc::new(registry))
        .with_config(config.orchestrator)
        .with_real_time_manager(Arc::new(LoggingRealTimeManager));

    let mut request = OrchestrationRequest::new(workflow).with_initial_data(initial);
    if let Some(pipeline) = pipeline {
        request = request.with_pipeline_id(pipeline);
    }
    if fail_fast {
        request = request.with_options(OrchestrationOptions {
            continue_on_error: Some(false),
            ..Default::default()
        });
    }

    let response = orchestrator.orchestrate(request).await?;
    print_json(&serde_json::to_value(&response)?)?;

    if response.status == OrchestrationStatus::Completed {
        Ok(())
    } else {
        Err(CliError::RunFailed {
            execution_id: response.execution_id,
            status: response.status,
        })
    }
}

async fn read_workflow(path: &Path) -> Result<Workflow, CliError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::ReadWorkflow {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&contents).map_err(|source| CliError::ParseWorkflow {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_input(input: Option<&str>) -> Result<Map<String, Value>, CliError> {
    let Some(input) = input else {
        return Ok(Map::new());
    };
    match serde_json::from_str(input) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CliError::InvalidInput(format!("got {}", other))),
        Err(e) => Err(CliError::InvalidInput(e.to_string())),
    }
}

fn list_nodes(registry: &ProcessorRegistry, verbose: bool) -> Value {
    let mut metadata = registry.all_metadata();
    metadata.sort_by(|a, b| a.node_type.cmp(&b.node_type));

    let nodes: Vec<Value> = metadata
        .into_iter()
        .map(|meta| {
            let mut entry = json!({
                "type": meta.node_type,
                "category": meta.category,
                "label": meta.label,
                "description": meta.description,
            });
            if verbose {
                entry["inputSchema"] = meta.input_schema();
                entry["outputSchema"] = meta.output_schema();
                entry["configSchema"] = meta.config_schema();
            }
            entry
        })
        .collect();
    Value::Array(nodes)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use flowdrop_nodes::NodesConfig;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_arguments() {
        let cli = Cli::parse_from([
            "flowdrop",
            "run",
            "flow.json",
            "--input",
            r#"{"text": "hello"}"#,
            "--pipeline",
            "p1",
        ]);
        match cli.command {
            Command::Run {
                workflow,
                input,
                pipeline,
                fail_fast,
            } => {
                assert_eq!(workflow, PathBuf::from("flow.json"));
                assert_eq!(input.as_deref(), Some(r#"{"text": "hello"}"#));
                assert_eq!(pipeline.as_deref(), Some("p1"));
                assert!(!fail_fast);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_input() {
        assert!(parse_input(None).unwrap().is_empty());
        assert_eq!(parse_input(Some(r#"{"a": 1}"#)).unwrap()["a"], json!(1));
        assert!(matches!(parse_input(Some("[1]")), Err(CliError::InvalidInput(_))));
        assert!(matches!(parse_input(Some("{")), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_list_nodes_sorted() {
        let registry = flowdrop_nodes::builtin_registry(&NodesConfig::default());
        let nodes = list_nodes(&registry, true);
        let types: Vec<&str> = nodes
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["type"].as_str().unwrap())
            .collect();
        assert_eq!(types.first(), Some(&"boolean_gateway"));
        assert!(types.contains(&"if_else"));
        assert!(nodes[0]["configSchema"].is_object());
    }

    #[tokio::test]
    async fn test_missing_workflow_file() {
        let result = read_workflow(Path::new("/nonexistent/flow.json")).await;
        assert!(matches!(result, Err(CliError::ReadWorkflow { .. })));
    }
}
