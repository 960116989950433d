//! `run` command implementation.

use anyhow::{Context, Result};
use drr_engine::CancellationToken;
use std::time::Duration;
use tracing::{info, warn};

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        flows = blueprint.flows.len(),
        total_weight = blueprint.total_weight(),
        output_capacity = blueprint.output.capacity,
        "Configuration loaded"
    );

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        max_items: (args.max_items > 0).then_some(args.max_items),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
        report_window: args.report_window,
    });

    let cancel = CancellationToken::new();
    let signal_guard = cancel.clone();
    let signal_task = tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_signal() => {
                warn!("Received shutdown signal, stopping scheduler...");
                signal_guard.cancel();
            }
            _ = signal_guard.cancelled() => {}
        }
    });

    info!("Starting scheduler...");
    let result = pipeline.run(cancel.clone()).await;
    cancel.cancel();
    let _ = signal_task.await;

    let stats = result.context("Scheduler run failed")?;
    info!(
        items = stats.items_delivered,
        stop_reason = %stats.stop_reason,
        duration_secs = stats.duration.as_secs_f64(),
        throughput = format!("{:.0}", stats.throughput()),
        "Run completed"
    );
    stats.print_summary();

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that fails to install never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
