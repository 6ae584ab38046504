use crate::error::{ErrorKind, Result};
use clap::{Args, Parser, Subcommand};
use exn::ResultExt;
use kvdrive_config::{Config, loader};
use kvdrive_drive::backend::LocalDrive;
use kvdrive_pipeline::{JsonLinesSink, Runner, SinkHandle};
use kvdrive_storage::LocalStores;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "kvdrive", version, about)]
pub struct Cli {
    /// JSON job configuration [default: config.json in the platform config directory]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute the configured operations
    Run(RunArgs),
    /// Validate the configuration and print the resolved plan
    Validate,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Directory holding one sub-directory per key-value store
    #[arg(long)]
    stores: PathBuf,
    /// Directory the document store is rooted at
    #[arg(long)]
    drive: PathBuf,
    /// Write result records to this file instead of stdout
    #[arg(long)]
    results: Option<PathBuf>,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let raw = loader::load(self.config.as_deref()).or_raise(|| ErrorKind::Config)?;
        let config = Config::parse(&raw).or_raise(|| ErrorKind::Config)?;
        match self.command {
            Command::Validate => print_plan(&config),
            Command::Run(args) => run(config, args).await,
        }
    }
}

fn print_plan(config: &Config) -> Result<()> {
    let plan = serde_json::json!({ "settings": config.settings, "plan": config.plan });
    let rendered = serde_json::to_string_pretty(&plan).or_raise(|| ErrorKind::Config)?;
    println!("{rendered}");
    tracing::info!(operations = config.plan.operations.len(), "Configuration is valid");
    Ok(())
}

async fn run(config: Config, args: RunArgs) -> Result<()> {
    if config.settings.is_setup_mode {
        // Token setup belongs to the auth collaborator; there is nothing to execute.
        tracing::info!(tokens_store = %config.settings.tokens_store, "Setup mode, no operations run");
        return Ok(());
    }

    let stores = LocalStores::new(absolute(&args.stores)?).or_raise(|| ErrorKind::Setup("key-value stores"))?;
    let drive = LocalDrive::new("local", absolute(&args.drive)?).or_raise(|| ErrorKind::Setup("document store"))?;
    let sink: SinkHandle = match &args.results {
        Some(path) => Arc::new(JsonLinesSink::create(path).await.or_raise(|| ErrorKind::Setup("result file"))?),
        None => Arc::new(JsonLinesSink::stdout()),
    };

    let runner = Runner::new(Arc::new(drive), Arc::new(stores), sink).with_settings(&config.settings);
    let summary = runner.run(&config.plan).await.or_raise(|| ErrorKind::Run)?;
    if summary.is_clean() {
        tracing::info!(records = summary.succeeded, "All operations succeeded");
    } else {
        tracing::warn!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            failed_operations = summary.failed_operations.len(),
            "Run finished with failures"
        );
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).or_raise(|| ErrorKind::Setup("paths"))
}
