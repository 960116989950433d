//! Pipeline orchestrator - wires producers, scheduler and the output
//! consumer together.

use std::future::pending;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{FlowItem, MuxBlueprint};
use drr_engine::{CancellationToken, Drr, Termination};
use ingestion::SourceSet;
use observability::{record_item_delivered, record_run_summary, ShareAggregator};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use super::stats::{PipelineStats, StopReason};

/// Grace period for the loop task after the consumer stops reading
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated blueprint
    pub blueprint: MuxBlueprint,

    /// Stop after this many output items (None = unlimited)
    pub max_items: Option<u64>,

    /// Stop after this long (None = no timeout)
    pub timeout: Option<Duration>,

    /// Prometheus exporter port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Output items per share sample
    pub report_window: u64,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until every flow is exhausted, a limit is hit, or `cancel` fires
    #[instrument(name = "pipeline_run", skip_all, fields(flows = self.config.blueprint.flows.len()))]
    pub async fn run(self, cancel: CancellationToken) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
        }

        let (out_tx, mut out_rx) = mpsc::channel::<FlowItem>(blueprint.output.capacity);
        let mut drr = Drr::new(out_tx).context("Failed to create scheduler")?;
        let sources =
            SourceSet::from_blueprint(blueprint, &mut drr).context("Failed to register flows")?;
        let handle = drr
            .start(cancel.clone())
            .context("Failed to start scheduler")?;

        info!(
            flows = sources.len(),
            max_items = ?self.config.max_items,
            timeout = ?self.config.timeout,
            "Scheduler running"
        );

        let mut shares =
            ShareAggregator::from_blueprint(blueprint).with_window(self.config.report_window);
        let timeout = self.config.timeout;
        let deadline = async move {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut stop_reason = None;
        loop {
            tokio::select! {
                _ = &mut deadline => {
                    warn!(timeout = ?timeout, "Run timed out");
                    stop_reason = Some(StopReason::Timeout);
                    break;
                }
                item = out_rx.recv() => {
                    let Some(item) = item else { break };
                    record_item_delivered(&item.flow_id);
                    shares.update(&item);

                    if self.config.max_items.is_some_and(|max| shares.total() >= max) {
                        info!(items = shares.total(), "Reached max items limit");
                        stop_reason = Some(StopReason::MaxItems);
                        break;
                    }
                }
            }
        }

        // Shutdown
        cancel.cancel();
        sources.stop_all();
        drop(out_rx);

        let scheduler = match tokio::time::timeout(JOIN_TIMEOUT, handle.join()).await {
            Ok(Ok(summary)) => Some(summary),
            Ok(Err(e)) => {
                warn!(error = %e, "Scheduler task failed");
                None
            }
            Err(_) => {
                warn!("Scheduler did not stop within the grace period");
                None
            }
        };

        let stop_reason = stop_reason.unwrap_or(match scheduler.map(|s| s.termination) {
            Some(Termination::Exhausted) => StopReason::Exhausted,
            _ => StopReason::Cancelled,
        });

        shares.publish();
        if let Some(ref run) = scheduler {
            record_run_summary(run.rounds, run.forwarded, run.flows_closed);
        }

        let stats = PipelineStats {
            items_delivered: shares.total(),
            duration: start_time.elapsed(),
            stop_reason,
            scheduler,
            producers: sources.snapshots(),
            shares: shares.summary(),
        };

        info!(
            items = stats.items_delivered,
            stop_reason = %stats.stop_reason,
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}
