//! Orca CLI - exercises the loading orchestration against a simulated workflow API.

mod workflows;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use orca_core::{FallbackVisual, LoadingConfig, LoadingConfigPatch};
use orca_loading::{
    ErrorPolicy, LoadItem, LoadingOrchestrator, LoadingProvider, QueryBridge, ToastCenter, TOAST_ID,
};
use tokio::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use workflows::{render_table, SimulatedWorkflows};

#[derive(Parser)]
#[command(name = "orca")]
#[command(about = "Workflow client loading orchestration", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the workflow list through the orchestrator and print each transition
    Simulate {
        /// Simulated fetch latency (ms)
        #[arg(long, default_value = "300")]
        fetch_ms: u64,
        /// Make the fetch fail
        #[arg(long)]
        fail: bool,
        /// Keep the overlay up when the fetch fails
        #[arg(long)]
        stay_loading_on_error: bool,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the effective loading configuration
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// JSON file with `delay` and `minLoading`
    #[arg(long)]
    config: Option<PathBuf>,
    /// Fade-out delay (ms)
    #[arg(long)]
    delay: Option<u64>,
    /// Minimum loading time (ms)
    #[arg(long)]
    min_loading: Option<u64>,
}

impl ConfigArgs {
    /// File (or defaults), then flag overrides.
    fn resolve(&self) -> Result<LoadingConfig> {
        let base = match &self.config {
            Some(path) => LoadingConfig::from_json_file(path)
                .with_context(|| format!("reading {}", path.display()))?,
            None => LoadingConfig::default(),
        };
        Ok(base.merged(&self.patch()))
    }

    fn patch(&self) -> LoadingConfigPatch {
        LoadingConfigPatch {
            delay: self.delay,
            min_loading: self.min_loading,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Simulate {
            fetch_ms,
            fail,
            stay_loading_on_error,
            config,
        } => {
            let config = config.resolve()?;
            let policy = if stay_loading_on_error {
                ErrorPolicy::StayLoading
            } else {
                ErrorPolicy::Complete
            };
            simulate(config, Duration::from_millis(fetch_ms), fail, policy).await?;
        }
        Commands::Config { config } => {
            let config = config.resolve()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Runs one load and returns every gate render, in order.
async fn simulate(
    config: LoadingConfig,
    latency: Duration,
    fail: bool,
    policy: ErrorPolicy,
) -> Result<Vec<String>> {
    info!(?config, latency_ms = latency.as_millis() as u64, fail, "starting simulation");
    let started = Instant::now();

    let provider = LoadingProvider::new(config, FallbackVisual::new("Loading Workflows"));
    let context = provider.context();
    let orchestrator = LoadingOrchestrator::new(&context, true)?;
    let toasts = ToastCenter::new();

    let mut changes = context.subscribe()?;
    let printer = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let state = *changes.borrow_and_update();
            println!(
                "{:>6}ms  {:<10} isLoading={} isComponentMounted={}",
                started.elapsed().as_millis(),
                state.phase(),
                state.is_loading,
                state.is_component_mounted
            );
        }
    });

    let mut renders = Vec::new();
    let mut render = |label: &str, gate: String| {
        println!("{:>6}ms  {}: {}", started.elapsed().as_millis(), label, gate);
        renders.push(gate);
    };

    let gate = orchestrator.load_item(gate_item("(workflow table)".to_string(), false))?;
    render("render", gate.to_string());

    let source = SimulatedWorkflows { latency, fail };
    let status = QueryBridge::new(policy)
        .drive(&orchestrator, &source, &toasts, "Loading Workflows")
        .await?;

    let table = render_table(&status);
    if orchestrator.has_pending_mount() {
        // overlay fades over the ready table until the mount lands
        let overlay = orchestrator.load_item(gate_item(table.clone(), false))?;
        render("render (settling)", overlay.to_string());
        let gate = orchestrator.load_item(gate_item(table.clone(), status.data.is_some()))?;
        render("render (data ready)", gate.to_string());

        let wait = orchestrator.mounting_delay() + Duration::from_secs(1);
        wait_until_mounted(&provider, wait).await?;
    }

    let gate = orchestrator.load_item(gate_item(table, false))?;
    render("render", gate.to_string());

    if let Some(toast) = toasts.get(TOAST_ID) {
        println!("toast: {} ({})", toast.message, toast.status);
    }

    printer.abort();
    Ok(renders)
}

fn gate_item(children: String, is_loaded: bool) -> LoadItem<String> {
    LoadItem::new(children)
        .loaded(is_loaded)
        .on_loaded(|| info!("data loaded, fading out overlay"))
        .on_mount(|| info!("workflow table mounted"))
}

async fn wait_until_mounted(provider: &LoadingProvider, limit: Duration) -> Result<()> {
    let mut changes = provider.context().subscribe()?;
    let mounted = async {
        loop {
            if changes.borrow_and_update().is_component_mounted {
                return Ok::<(), tokio::sync::watch::error::RecvError>(());
            }
            changes.changed().await?;
        }
    };
    tokio::time::timeout(limit, mounted)
        .await
        .context("timed out waiting for mount")??;

    debug!(scope = %provider.id(), "mount observed");
    Ok(())
}
