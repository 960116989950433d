//! Consumer-side metrics
//!
//! The scheduler emits its own counters; these helpers cover what only the
//! consumer of the output can see: which flow each delivered item came
//! from, and how the delivered shares compare to the configured weights.

use std::collections::HashMap;
use std::fmt;

use contracts::{FlowItem, FlowName, MuxBlueprint};
use metrics::{counter, gauge};

/// Count one item read from the output
pub fn record_item_delivered(flow: &str) {
    counter!("drr_output_items_total", "flow" => flow.to_string()).increment(1);
}

/// Publish a flow's observed share of the output so far
pub fn record_share(flow: &str, observed: f64, expected: f64) {
    gauge!("drr_flow_share_observed", "flow" => flow.to_string()).set(observed);
    gauge!("drr_flow_share_expected", "flow" => flow.to_string()).set(expected);
}

/// Publish the scheduler's final counters
pub fn record_run_summary(rounds: u64, forwarded: u64, flows_closed: u64) {
    gauge!("drr_last_run_rounds").set(rounds as f64);
    gauge!("drr_last_run_forwarded").set(forwarded as f64);
    gauge!("drr_last_run_flows_closed").set(flows_closed as f64);
}

const DEFAULT_WINDOW: u64 = 1000;

#[derive(Debug, Clone, Default)]
struct FlowTally {
    expected: f64,
    count: u64,
    window_count: u64,
    last_seq: Option<u64>,
    out_of_order: u64,
    /// Per-window deviation of observed from expected share
    deviation: RunningStats,
}

/// Accumulates delivered items per flow and compares observed shares with
/// the shares implied by the weights
///
/// Shares are also sampled over fixed windows of output items so the
/// summary shows how steady the split was, not only its end value.
#[derive(Debug, Clone)]
pub struct ShareAggregator {
    order: Vec<FlowName>,
    flows: HashMap<FlowName, FlowTally>,
    total: u64,
    window: u64,
    window_seen: u64,
}

impl ShareAggregator {
    /// `expected` lists each flow with its expected share, in report order
    pub fn new(expected: Vec<(FlowName, f64)>) -> Self {
        let mut order = Vec::with_capacity(expected.len());
        let mut flows = HashMap::with_capacity(expected.len());
        for (name, share) in expected {
            order.push(name.clone());
            flows.insert(
                name,
                FlowTally {
                    expected: share,
                    ..Default::default()
                },
            );
        }
        Self {
            order,
            flows,
            total: 0,
            window: DEFAULT_WINDOW,
            window_seen: 0,
        }
    }

    pub fn from_blueprint(blueprint: &MuxBlueprint) -> Self {
        Self::new(blueprint.expected_shares())
    }

    /// Sample window in output items (minimum 1)
    pub fn with_window(mut self, window: u64) -> Self {
        self.window = window.max(1);
        self
    }

    /// Account for one delivered item
    pub fn update(&mut self, item: &FlowItem) {
        if !self.flows.contains_key(&item.flow_id) {
            self.order.push(item.flow_id.clone());
        }
        let tally = self.flows.entry(item.flow_id.clone()).or_default();

        tally.count += 1;
        tally.window_count += 1;
        if tally.last_seq.is_some_and(|last| item.seq <= last) {
            tally.out_of_order += 1;
        }
        tally.last_seq = Some(item.seq);

        self.total += 1;
        self.window_seen += 1;
        if self.window_seen == self.window {
            self.close_window();
        }
    }

    fn close_window(&mut self) {
        let window = self.window_seen as f64;
        for tally in self.flows.values_mut() {
            let observed = tally.window_count as f64 / window;
            tally.deviation.push(observed - tally.expected);
            tally.window_count = 0;
        }
        self.window_seen = 0;
    }

    /// Items seen so far
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Items seen from one flow
    pub fn count(&self, flow: &str) -> u64 {
        self.flows.get(flow).map_or(0, |t| t.count)
    }

    /// Observed share of one flow (0 before any item)
    pub fn observed_share(&self, flow: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(flow) as f64 / self.total as f64
    }

    /// Publish current shares as gauges
    pub fn publish(&self) {
        for name in &self.order {
            if let Some(tally) = self.flows.get(name) {
                record_share(name, self.observed_share(name), tally.expected);
            }
        }
    }

    /// Generate summary report
    pub fn summary(&self) -> ShareSummary {
        let flows = self
            .order
            .iter()
            .filter_map(|name| {
                let tally = self.flows.get(name)?;
                Some(FlowShare {
                    flow: name.clone(),
                    count: tally.count,
                    observed: self.observed_share(name),
                    expected: tally.expected,
                    out_of_order: tally.out_of_order,
                    window_deviation: StatsSummary::from(&tally.deviation),
                })
            })
            .collect();

        ShareSummary {
            total: self.total,
            flows,
        }
    }

    /// Reset statistics, keeping the expected shares
    pub fn reset(&mut self) {
        for tally in self.flows.values_mut() {
            *tally = FlowTally {
                expected: tally.expected,
                ..Default::default()
            };
        }
        self.total = 0;
        self.window_seen = 0;
    }
}

/// One flow's line in the share report
#[derive(Debug, Clone)]
pub struct FlowShare {
    pub flow: FlowName,
    pub count: u64,
    pub observed: f64,
    pub expected: f64,
    /// Items whose sequence number did not increase
    pub out_of_order: u64,
    pub window_deviation: StatsSummary,
}

impl FlowShare {
    pub fn error(&self) -> f64 {
        self.observed - self.expected
    }
}

/// Share report
#[derive(Debug, Clone, Default)]
pub struct ShareSummary {
    pub total: u64,
    pub flows: Vec<FlowShare>,
}

impl ShareSummary {
    /// Largest absolute difference between observed and expected share
    pub fn max_abs_error(&self) -> f64 {
        self.flows
            .iter()
            .map(|f| f.error().abs())
            .fold(0.0, f64::max)
    }

    pub fn out_of_order(&self) -> u64 {
        self.flows.iter().map(|f| f.out_of_order).sum()
    }
}

impl fmt::Display for ShareSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Output Share Summary ===")?;
        writeln!(f, "Total items: {}", self.total)?;
        writeln!(
            f,
            "{:<16} {:>10} {:>9} {:>9} {:>9}",
            "flow", "items", "observed", "expected", "error"
        )?;
        for share in &self.flows {
            writeln!(
                f,
                "{:<16} {:>10} {:>8.2}% {:>8.2}% {:>+8.2}%",
                share.flow.as_str(),
                share.count,
                share.observed * 100.0,
                share.expected * 100.0,
                share.error() * 100.0
            )?;
            if share.window_deviation.count > 0 {
                writeln!(f, "  window deviation: {}", share.window_deviation)?;
            }
        }
        writeln!(f, "Max share error: {:.2}%", self.max_abs_error() * 100.0)?;
        let out_of_order = self.out_of_order();
        if out_of_order > 0 {
            writeln!(f, "Out-of-order items: {}", out_of_order)?;
        }
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:+.4}, max={:+.4}, mean={:+.4}, std={:.4} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean and variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(flow: &str, seq: u64) -> FlowItem {
        FlowItem::new(flow.into(), seq)
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_shares_follow_counts() {
        let mut agg = ShareAggregator::new(vec![("a".into(), 0.75), ("b".into(), 0.25)]);
        for seq in 0..30 {
            agg.update(&item("a", seq));
        }
        for seq in 0..10 {
            agg.update(&item("b", seq));
        }

        assert_eq!(agg.total(), 40);
        assert!((agg.observed_share("a") - 0.75).abs() < 1e-12);
        let summary = agg.summary();
        assert_eq!(summary.flows.len(), 2);
        assert_eq!(summary.flows[0].flow, "a");
        assert!(summary.max_abs_error() < 1e-12);
        assert_eq!(summary.out_of_order(), 0);
    }

    #[test]
    fn test_windows_sample_deviation() {
        let mut agg =
            ShareAggregator::new(vec![("a".into(), 0.5), ("b".into(), 0.5)]).with_window(4);
        // Window 1: a a a b, window 2: a b b b
        for (flow, seq) in [("a", 0), ("a", 1), ("a", 2), ("b", 0)] {
            agg.update(&item(flow, seq));
        }
        for (flow, seq) in [("a", 3), ("b", 1), ("b", 2), ("b", 3)] {
            agg.update(&item(flow, seq));
        }

        let summary = agg.summary();
        let a = &summary.flows[0].window_deviation;
        assert_eq!(a.count, 2);
        assert!((a.max - 0.25).abs() < 1e-12);
        assert!((a.min + 0.25).abs() < 1e-12);
        assert!(a.mean.abs() < 1e-12);
    }

    #[test]
    fn test_unknown_flow_and_disorder_are_reported() {
        let mut agg = ShareAggregator::new(vec![("a".into(), 1.0)]);
        agg.update(&item("a", 1));
        agg.update(&item("a", 0));
        agg.update(&item("stray", 0));

        let summary = agg.summary();
        assert_eq!(summary.flows.len(), 2);
        assert_eq!(summary.flows[1].flow, "stray");
        assert_eq!(summary.flows[1].expected, 0.0);
        assert_eq!(summary.out_of_order(), 1);

        let text = summary.to_string();
        assert!(text.contains("Total items: 3"));
        assert!(text.contains("Out-of-order items: 1"));
    }

    #[test]
    fn test_reset_keeps_expected() {
        let mut agg = ShareAggregator::new(vec![("a".into(), 1.0)]);
        agg.update(&item("a", 0));
        agg.reset();
        assert_eq!(agg.total(), 0);
        assert_eq!(agg.count("a"), 0);
        assert_eq!(agg.summary().flows[0].expected, 1.0);
    }
}
