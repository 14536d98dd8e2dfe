//! netpilot - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use netpilot::bulk::{BulkOperation, OperationType};
use netpilot::cli::{Args, Commands, DeviceArgs, Verbosity};
use netpilot::pipeline::{DeploymentRequest, Pipeline};
use netpilot::{Config, Engine, ExecutionStatus};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = args.verbosity();

    let mut config = Config::load(args.config.clone()).context("Failed to load configuration")?;
    if let Some(provider) = &args.provider {
        config.provider.kind = provider.clone();
    }
    config.validate().context("Invalid configuration")?;

    init_logging(verbosity, &config);

    let succeeded = match &args.command {
        Commands::Config => {
            show_config(&config)?;
            true
        }
        Commands::Deploy { intent, targets } => {
            let engine = Engine::from_config(config).await?;
            run_deploy(&engine, intent, targets, verbosity).await?
        }
        Commands::Retrieve { targets } => {
            let engine = Engine::from_config(config).await?;
            run_retrieve(&engine, targets, verbosity).await?
        }
        Commands::Bulk {
            targets,
            command,
            config_file,
        } => {
            let (operation_type, data) = match (command, config_file) {
                (Some(command), _) => (OperationType::Command, command.clone()),
                (None, Some(path)) => (
                    OperationType::Configuration,
                    std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                (None, None) => anyhow::bail!("Either --command or --config-file is required"),
            };
            let engine = Engine::from_config(config).await?;
            run_bulk(&engine, targets, operation_type, data, verbosity).await?
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

/// RUST_LOG wins, then -v/-q, then the configured level
fn init_logging(verbosity: Verbosity, config: &Config) {
    let level = verbosity
        .log_level()
        .unwrap_or(config.logging.level.as_str());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("netpilot={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn show_config(config: &Config) -> Result<()> {
    let path = Config::default_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(no home directory)".to_string());
    println!("{} {}", "Config file:".bold(), path);
    println!();
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Create the simulated devices named on the command line
async fn create_devices(engine: &Engine, targets: &DeviceArgs) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for (name, addr) in targets.parsed()? {
        let device = engine.devices().create_device(&name, &addr).await?;
        ids.push(device.id);
    }
    Ok(ids)
}

fn progress_bar(verbosity: Verbosity, label: &str) -> ProgressBar {
    if !verbosity.show_progress() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb.set_message(label.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Poll a pipeline until it reaches a terminal state
async fn watch_pipeline(engine: &Engine, id: &str, pb: &ProgressBar) -> Result<Pipeline> {
    loop {
        let pipeline = engine.pipelines().get_pipeline(id).await?;
        pb.set_position(pipeline.progress as u64);
        if let Some(stage) = pipeline
            .stages
            .iter()
            .find(|s| s.status == ExecutionStatus::Running)
        {
            pb.set_message(format!("{}...", stage.name));
        }

        if pipeline.status.is_terminal() {
            pb.finish_and_clear();
            return Ok(pipeline);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn print_stages(pipeline: &Pipeline) {
    for stage in &pipeline.stages {
        let marker = match stage.status {
            ExecutionStatus::Completed => "✓".green(),
            ExecutionStatus::Failed => "✗".red(),
            ExecutionStatus::Running => "…".yellow(),
            ExecutionStatus::Pending => "·".dimmed(),
        };
        println!("  {} {}", marker, stage.name);
        if let Some(error) = &stage.error {
            println!("      {}", error.red());
        }
    }
}

async fn run_deploy(
    engine: &Engine,
    intent: &str,
    targets: &DeviceArgs,
    verbosity: Verbosity,
) -> Result<bool> {
    let device_ids = create_devices(engine, targets).await?;
    let handle = engine
        .pipelines()
        .create_deployment_pipeline(DeploymentRequest::new(intent, device_ids))
        .await?;

    let pb = progress_bar(verbosity, "deployment");
    let pipeline = watch_pipeline(engine, &handle.id, &pb).await?;

    println!("{} {}", "Deployment".bold(), pipeline.id.dimmed());
    print_stages(&pipeline);

    if let Some(output) = &pipeline.output {
        if verbosity.show_details() {
            if let Some(plan) = output["plan"].as_str() {
                println!("\n{}\n{}", "Plan:".bold(), plan);
            }
        }
        if let Some(config) = output["configuration"].as_str() {
            println!("\n{}\n{}", "Configuration:".bold(), config);
        }
    }

    match pipeline.status {
        ExecutionStatus::Completed => {
            println!("{}", "Deployment completed".green().bold());
            Ok(true)
        }
        _ => {
            let error = pipeline.error.as_deref().unwrap_or("unknown error");
            println!("{} {}", "Deployment failed:".red().bold(), error);
            Ok(false)
        }
    }
}

async fn run_retrieve(engine: &Engine, targets: &DeviceArgs, verbosity: Verbosity) -> Result<bool> {
    let device_ids = create_devices(engine, targets).await?;
    let handle = engine
        .pipelines()
        .create_retrieval_pipeline(device_ids)
        .await?;

    let pb = progress_bar(verbosity, "retrieval");
    let pipeline = watch_pipeline(engine, &handle.id, &pb).await?;

    println!("{} {}", "Retrieval".bold(), pipeline.id.dimmed());
    print_stages(&pipeline);

    let results = pipeline
        .output
        .as_ref()
        .and_then(|o| o["analysisResults"].as_object().cloned())
        .unwrap_or_default();
    for (device_id, result) in &results {
        let name = engine
            .devices()
            .get_device(device_id)
            .await
            .map(|d| d.name)
            .unwrap_or_else(|_| device_id.clone());
        match result["error"].as_str() {
            Some(error) => println!("\n{} {}", name.bold(), error.red()),
            None => println!(
                "\n{}\n{}",
                name.bold(),
                result["insights"].as_str().unwrap_or_default()
            ),
        }
    }

    Ok(pipeline.status == ExecutionStatus::Completed)
}

async fn run_bulk(
    engine: &Engine,
    targets: &DeviceArgs,
    operation_type: OperationType,
    data: String,
    verbosity: Verbosity,
) -> Result<bool> {
    let device_ids = create_devices(engine, targets).await?;
    let handle = engine
        .bulk()
        .create_bulk_operation(operation_type, device_ids.clone(), data)
        .await?;

    let pb = progress_bar(verbosity, operation_type.as_str());
    let op: BulkOperation = loop {
        let op = engine.bulk().get_bulk_operation(&handle.id).await?;
        pb.set_position(op.progress as u64);
        if op.status.is_terminal() {
            pb.finish_and_clear();
            break op;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    println!(
        "{} {} ({} ok, {} failed)",
        "Bulk".bold(),
        op.id.dimmed(),
        op.succeeded().to_string().green(),
        op.failed().to_string().red()
    );
    for device_id in &device_ids {
        let name = engine
            .devices()
            .get_device(device_id)
            .await
            .map(|d| d.name)
            .unwrap_or_else(|_| device_id.clone());
        if let Some(result) = op.results.get(device_id) {
            if result.success {
                println!("\n{} {}", "✓".green(), name.bold());
                if let Some(output) = &result.output {
                    println!("{}", output);
                }
            } else {
                println!(
                    "\n{} {} {}",
                    "✗".red(),
                    name.bold(),
                    result.error.as_deref().unwrap_or_default().red()
                );
            }
        }
    }

    Ok(op.status == ExecutionStatus::Completed && op.failed() == 0)
}
