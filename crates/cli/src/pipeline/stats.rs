//! Run statistics.

use std::fmt;
use std::time::Duration;

use drr_engine::RunSummary;
use ingestion::MetricsSnapshot;
use contracts::FlowName;
use observability::ShareSummary;

/// Why the run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// Every flow was exhausted
    #[default]
    Exhausted,
    /// `--max-items` reached
    MaxItems,
    /// `--timeout` elapsed
    Timeout,
    /// Shutdown signal
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exhausted => "exhausted",
            Self::MaxItems => "max-items",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        })
    }
}

/// Statistics from a scheduler run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Items read from the output
    pub items_delivered: u64,

    pub duration: Duration,

    pub stop_reason: StopReason,

    /// Scheduler counters (None if the loop task did not finish in time)
    pub scheduler: Option<RunSummary>,

    /// Per-flow producer counters, in registration order
    pub producers: Vec<(FlowName, MetricsSnapshot)>,

    pub shares: ShareSummary,
}

impl PipelineStats {
    /// Delivered items per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.items_delivered as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Run Statistics ===");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Stop reason: {}", self.stop_reason);
        println!("  Items delivered: {}", self.items_delivered);
        println!("  Throughput: {:.0} items/s", self.throughput());

        if let Some(ref run) = self.scheduler {
            println!("\n  Scheduler");
            println!("    rounds: {}", run.rounds);
            println!("    forwarded: {}", run.forwarded);
            println!("    flows closed: {}", run.flows_closed);
            println!("    termination: {}", run.termination);
        }

        if !self.producers.is_empty() {
            println!("\n  Producers");
            for (flow, snap) in &self.producers {
                println!(
                    "    {}: produced={} blocked={}{}",
                    flow,
                    snap.items_produced,
                    snap.sends_blocked,
                    if snap.finished { " (finished)" } else { "" }
                );
            }
        }

        println!("\n{}", self.shares);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput() {
        let stats = PipelineStats {
            items_delivered: 500,
            duration: Duration::from_millis(250),
            ..Default::default()
        };
        assert!((stats.throughput() - 2000.0).abs() < 1e-9);
        assert_eq!(PipelineStats::default().throughput(), 0.0);
    }
}
