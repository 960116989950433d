//! MuxBlueprint - Config Loader output
//!
//! Describes a complete fan-in setup: the shared output queue and every
//! weighted input flow with its synthetic producer parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::FlowName;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete multiplexer blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuxBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Output queue settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Weighted input flows, registered in this order
    pub flows: Vec<FlowConfig>,
}

/// Output queue settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Bounded output channel capacity
    #[serde(default = "default_output_capacity")]
    pub capacity: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            capacity: default_output_capacity(),
        }
    }
}

fn default_output_capacity() -> usize {
    64
}

/// One weighted input flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Unique flow name
    pub id: FlowName,

    /// Scheduling weight (items per round). Signed so that invalid values
    /// survive parsing and are reported by validation.
    pub weight: i64,

    /// Bounded channel capacity between producer and scheduler
    #[serde(default = "default_flow_capacity")]
    pub capacity: usize,

    /// Number of items to produce (None = unbounded)
    #[serde(default)]
    pub items: Option<u64>,

    /// Production rate in items per second (None = as fast as possible)
    #[serde(default)]
    pub rate_hz: Option<f64>,
}

fn default_flow_capacity() -> usize {
    128
}

/// Interval between items for a production rate
///
/// `None` unless the period is a non-zero, representable `Duration`. This
/// rejects non-positive and non-finite rates, rates so high the period
/// rounds to zero, and rates so low the period overflows.
pub fn tick_period(rate_hz: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(1.0 / rate_hz)
        .ok()
        .filter(|period| !period.is_zero())
}

impl MuxBlueprint {
    /// Sum of all configured weights
    pub fn total_weight(&self) -> i64 {
        self.flows.iter().map(|f| f.weight).sum()
    }

    /// Long-run share each flow should receive when every flow stays loaded
    pub fn expected_shares(&self) -> Vec<(FlowName, f64)> {
        let total = self.total_weight();
        self.flows
            .iter()
            .map(|f| {
                let share = if total > 0 {
                    f.weight as f64 / total as f64
                } else {
                    0.0
                };
                (f.id.clone(), share)
            })
            .collect()
    }

    /// Look up a flow by name
    pub fn flow(&self, id: &str) -> Option<&FlowConfig> {
        self.flows.iter().find(|f| f.id == id)
    }
}
