use std::path::{Path, PathBuf};
use anyhow::Context;
use clap::{Parser, Subcommand};
use netmetrics::{parser, plan_query, resolve_request, run_normalized, ComposedQuery, QueryOutcome, RunIdNormalizer};
use netmetrics_cli::DataFusionExecutor;
use serde_json::{json, Map, Value as JsonValue};

#[derive(Parser)]
#[command(name = "netmetrics")]
#[command(about = "Compose metric queries comparing model runs, and run them on local tables")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the composed SQL for a request
    Sql {
        /// Catalog YAML file
        #[arg(long)]
        catalog: PathBuf,

        /// Request YAML file
        #[arg(long)]
        request: PathBuf,
    },
    /// Execute a request against local CSV or Parquet tables
    Run {
        /// Catalog YAML file
        #[arg(long)]
        catalog: PathBuf,

        /// Request YAML file
        #[arg(long)]
        request: PathBuf,

        /// Table to register, as name=path (repeatable)
        #[arg(long = "table", value_parser = parse_table)]
        tables: Vec<(String, PathBuf)>,
    },
}

fn parse_table(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected name=path, got '{}'", arg)),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Commands::Sql { catalog, request } => {
            let (_, query) = compose(&catalog, &request)?;
            println!("{}", query.sql()?);
        }
        Commands::Run { catalog, request, tables } => {
            let (normalizer, query) = compose(&catalog, &request)?;
            let executor = DataFusionExecutor::new()?;
            for (name, path) in &tables {
                executor.register_file(name, path)?;
            }
            let outcome = run_normalized(&executor, &query, &normalizer)?;
            println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);
        }
    }
    Ok(())
}

fn compose(catalog: &Path, request: &Path) -> anyhow::Result<(RunIdNormalizer, ComposedQuery)> {
    let catalog = parser::parse_file(catalog)
        .with_context(|| format!("failed to load catalog {}", catalog.display()))?;
    let request = parser::parse_request_file(request)
        .with_context(|| format!("failed to load request {}", request.display()))?;
    let spec = resolve_request(&catalog, &request)?;
    let query = plan_query(&spec)?;
    tracing::info!(columns = query.aliases.len(), "composed query");
    Ok((RunIdNormalizer::from_config(&catalog.normalizer)?, query))
}

fn outcome_json(outcome: &QueryOutcome) -> JsonValue {
    match outcome {
        QueryOutcome::Rows(result) => {
            let rows: Vec<JsonValue> = result
                .table
                .rows
                .iter()
                .map(|row| {
                    let record: Map<String, JsonValue> = result
                        .table
                        .columns
                        .iter()
                        .cloned()
                        .zip(row.iter().map(|v| serde_json::to_value(v).unwrap_or(JsonValue::Null)))
                        .collect();
                    JsonValue::Object(record)
                })
                .collect();
            json!({ "rows": rows, "excluded": result.excluded })
        }
        QueryOutcome::UnknownColumn { column } => json!({ "unknown_column": column }),
    }
}
