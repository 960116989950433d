//! Synthetic flow producers
//!
//! Stand-ins for real upstream producers: each source writes numbered
//! `FlowItem`s into a bounded channel, paced or as fast as the channel
//! accepts them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{tick_period, FlowConfig, FlowItem, FlowName};
use drr_engine::CancellationToken;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::config::SourceMetrics;
use crate::error::{IngestionError, Result};

/// Synthetic source configuration
#[derive(Debug, Clone)]
pub struct SyntheticSourceConfig {
    /// Name stamped on every produced item
    pub flow_id: FlowName,

    /// Number of items to produce (None = until stopped)
    pub items: Option<u64>,

    /// Items per second (None = as fast as the channel accepts)
    pub rate_hz: Option<f64>,
}

impl SyntheticSourceConfig {
    pub fn from_flow(flow: &FlowConfig) -> Self {
        Self {
            flow_id: flow.id.clone(),
            items: flow.items,
            rate_hz: flow.rate_hz,
        }
    }
}

/// Synthetic producer feeding one flow
///
/// The producer task owns the channel sender; when it exits (item count
/// reached, `stop()`, or the receiver dropped) the flow closes.
pub struct SyntheticSource {
    config: SyntheticSourceConfig,
    stop: CancellationToken,
    running: Arc<AtomicBool>,
}

impl SyntheticSource {
    /// # Errors
    /// `InvalidRate` if `rate_hz` is set but has no non-zero, representable
    /// tick period.
    pub fn new(config: SyntheticSourceConfig) -> Result<Self> {
        if let Some(rate_hz) = config.rate_hz {
            if tick_period(rate_hz).is_none() {
                return Err(IngestionError::InvalidRate {
                    flow: config.flow_id,
                    rate_hz,
                });
            }
        }

        Ok(Self::with_config(config))
    }

    fn with_config(config: SyntheticSourceConfig) -> Self {
        Self {
            config,
            stop: CancellationToken::new(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Unpaced source producing `items` items, then closing
    pub fn burst(flow_id: impl Into<FlowName>, items: u64) -> Self {
        Self::with_config(SyntheticSourceConfig {
            flow_id: flow_id.into(),
            items: Some(items),
            rate_hz: None,
        })
    }

    /// Source producing at `rate_hz`
    pub fn paced(flow_id: impl Into<FlowName>, rate_hz: f64, items: Option<u64>) -> Result<Self> {
        Self::new(SyntheticSourceConfig {
            flow_id: flow_id.into(),
            items,
            rate_hz: Some(rate_hz),
        })
    }

    pub fn flow_id(&self) -> &FlowName {
        &self.config.flow_id
    }

    /// Start the producer, returning the flow's receiving end
    ///
    /// # Arguments
    /// * `capacity` - flow channel capacity
    /// * `metrics` - optional shared counters
    pub fn start(
        &self,
        capacity: usize,
        metrics: Option<Arc<SourceMetrics>>,
    ) -> Result<mpsc::Receiver<FlowItem>> {
        if capacity == 0 {
            return Err(IngestionError::ZeroCapacity {
                flow: self.config.flow_id.clone(),
            });
        }
        let (tx, rx) = mpsc::channel(capacity);
        self.start_into(tx, metrics);
        Ok(rx)
    }

    /// Start the producer on an existing channel
    pub fn start_into(&self, tx: mpsc::Sender<FlowItem>, metrics: Option<Arc<SourceMetrics>>) {
        let config = self.config.clone();
        let stop = self.stop.clone();
        let running = self.running.clone();
        let metrics = metrics.unwrap_or_else(|| Arc::new(SourceMetrics::new()));

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let produced =
                metrics::counter!("drr_source_items_total", "flow" => config.flow_id.to_string());
            let mut ticker = config.rate_hz.and_then(tick_period).map(|period| {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });
            let mut seq: u64 = 0;

            debug!(
                flow_id = %config.flow_id,
                items = ?config.items,
                rate_hz = ?config.rate_hz,
                "synthetic source started"
            );

            loop {
                if stop.is_cancelled() || config.items.is_some_and(|n| seq >= n) {
                    break;
                }

                if let Some(ticker) = ticker.as_mut() {
                    tokio::select! {
                        biased;
                        _ = stop.cancelled() => break,
                        _ = ticker.tick() => {}
                    }
                }

                let permit = match tx.try_reserve() {
                    Ok(permit) => permit,
                    Err(TrySendError::Full(())) => {
                        metrics.record_blocked();
                        tokio::select! {
                            biased;
                            _ = stop.cancelled() => break,
                            permit = tx.reserve() => match permit {
                                Ok(permit) => permit,
                                Err(_) => break,
                            },
                        }
                    }
                    Err(TrySendError::Closed(())) => break,
                };

                permit.send(FlowItem::new(config.flow_id.clone(), seq));
                metrics.record_produced();
                produced.increment(1);
                trace!(flow_id = %config.flow_id, seq, "synthetic item sent");
                seq += 1;
            }

            running.store(false, Ordering::SeqCst);
            metrics.mark_finished();
            debug!(flow_id = %config.flow_id, produced = seq, "synthetic source stopped");
        });
    }

    /// Stop the producer; the flow closes once buffered items are read
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Whether the producer task is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
