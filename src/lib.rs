// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod notifier;
pub mod pipeline;
pub mod serve;
pub mod task;
pub mod transform;
pub mod watch;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::{CliArgs, PipelineCommand};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{OnBusy, Runtime, RuntimeEvent};
use crate::notifier::{DesktopNotifier, Notifier};
use crate::pipeline::PipelineGraph;
use crate::serve::ReloadHub;
use crate::task::Task;
use crate::watch::{WatcherOptions, WatchProfile};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the explicit task graph (built once, passed around as a value)
/// - the selected entry pipeline
/// - for `dev`: server, watcher, and the watch scheduler runtime
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    let notifier: Arc<dyn Notifier> = Arc::new(DesktopNotifier);
    let hub = ReloadHub::new();
    let graph = pipeline::build_graph(&cfg, notifier, hub.clone())?;

    match args.command.unwrap_or(PipelineCommand::Dev) {
        PipelineCommand::Dev => run_dev(&cfg, graph, hub).await,
        PipelineCommand::Clean => run_once(graph.clean).await,
        PipelineCommand::Build => run_once(graph.build).await,
        PipelineCommand::Webp => run_once(graph.webp).await,
        PipelineCommand::WebpBuild => run_once(graph.webp_build).await,
    }
}

/// Execute one entry pipeline and return. Contained per-file failures were
/// already surfaced while running; they do not fail the process.
async fn run_once(task: Arc<dyn Task>) -> Result<()> {
    let outcome = task.execute().await?;

    if !outcome.is_success() {
        warn!(
            task = %task.name(),
            failures = outcome.failures(),
            "pipeline finished with failures"
        );
    }

    Ok(())
}

/// The default pipeline: build everything once, start the dev server, then
/// install the watch bindings and idle until Ctrl-C.
async fn run_dev(cfg: &ConfigFile, graph: PipelineGraph, hub: ReloadHub) -> Result<()> {
    let outcome = graph.build_once.execute().await?;
    if !outcome.is_success() {
        warn!(
            failures = outcome.failures(),
            "initial build finished with failures; watching anyway"
        );
    }

    // Dev server; a bind failure is fatal.
    let server = serve::spawn_server(cfg.paths.serve_root(), cfg.server.port, hub.clone()).await?;
    info!(addr = %server.addr, "serving {}", cfg.paths.serve);

    // Watch scheduler wiring.
    let on_busy = OnBusy::from_str(&cfg.watch.on_busy).map_err(|e| anyhow!(e))?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let profiles: Vec<WatchProfile> = graph
        .bindings
        .iter()
        .enumerate()
        .map(|(index, binding)| WatchProfile {
            binding: index,
            sources: binding.sources.clone(),
        })
        .collect();

    let _watcher_handle = watch::spawn_watcher(
        cfg.paths.source_root(),
        profiles,
        rt_tx.clone(),
        WatcherOptions {
            debounce: Duration::from_millis(cfg.watch.debounce_ms),
            use_hash: cfg.watch.use_hash,
        },
    )?;

    // Ctrl-C requests graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let runtime = Runtime::new(graph.bindings, on_busy, rt_rx, rt_tx);
    runtime.run().await
}
