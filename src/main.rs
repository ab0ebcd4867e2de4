// ABOUTME: CLI driver for the content migrator
// ABOUTME: Validates, runs or resumes a migration and renders progress in the terminal

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use content_migrator::{
    MigrationOrchestrator, MigratorConfig, MigratorError, ResultStatus, SimulatedEngine,
};

#[derive(Parser)]
#[command(name = "content-migrator")]
#[command(about = "Configure and drive a content migration between two server environments", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML file with [source] and [destination] endpoints
    #[arg(short, long, global = true, default_value = "migrator.toml")]
    config: PathBuf,

    /// Manifest path, overriding the config file
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and validate the migration plan without running it
    Validate,
    /// Run the migration from the beginning
    Run,
    /// Continue an interrupted migration from its saved manifest
    Resume,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = MigratorConfig::load(&cli.config)?;
    init_tracing(config.logging.filter.as_deref());

    config.resolve_secrets(std::io::stdin().is_terminal())?;
    let manifest_path = cli.manifest.clone().unwrap_or_else(|| config.manifest_path());

    let mut orchestrator = MigrationOrchestrator::new(SimulatedEngine::default());
    if !orchestrator.build_plan(&config.source, &config.destination) {
        return Err(MigratorError::Validation(
            "migration plan is not valid, see the log above for details".to_string(),
        )
        .into());
    }

    if matches!(cli.command, Commands::Validate) {
        println!("✓ Migration plan is valid");
        return Ok(());
    }

    let progress = attach_progress(&orchestrator);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, canceling migration");
            ctrl_c.cancel();
        }
    });

    let result = match cli.command {
        Commands::Resume => orchestrator.resume(&manifest_path, cancel).await,
        _ => orchestrator.execute(cancel).await,
    };
    progress.finish_and_clear();

    if !orchestrator.save_manifest(&manifest_path).await {
        tracing::warn!(
            "Manifest was not saved to {}; this run cannot be resumed",
            manifest_path.display()
        );
    }

    println!();
    for action in orchestrator.catalog().actions() {
        let elapsed = orchestrator.action_elapsed(action);
        if !elapsed.is_empty() {
            println!("  {:<32} {}", action, elapsed);
        }
    }
    println!("  {:<32} {}", "Total", orchestrator.total_elapsed());

    match result.status {
        ResultStatus::Success => Ok(()),
        ResultStatus::Canceled => bail!(
            "Migration canceled. Resume it with: content-migrator resume --manifest {}",
            manifest_path.display()
        ),
        ResultStatus::Failure => bail!("Migration failed with {} error(s)", result.errors.len()),
    }
}

fn init_tracing(filter: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Renders tracker changes as a progress bar and prints bus messages above it.
fn attach_progress(orchestrator: &MigrationOrchestrator<SimulatedEngine>) -> ProgressBar {
    let bar = ProgressBar::new(orchestrator.catalog().len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }

    if let Some(tracker) = orchestrator.tracker() {
        let bar = bar.clone();
        tracker.subscribe(move |snapshot| {
            bar.set_position(snapshot.index.max(0) as u64);
            bar.set_message(snapshot.message.clone());
        });
    }

    if let Some(bus) = orchestrator.bus() {
        let bar = bar.clone();
        bus.subscribe(move |message| match &message.action {
            Some(action) => bar.println(format!("[{}]\n{}", action, message.text)),
            None => bar.println(&message.text),
        });
    }

    bar
}
