//! SourceSet - producers for every flow of a blueprint

use std::sync::Arc;

use contracts::{FlowItem, FlowName, MuxBlueprint};
use drr_engine::{Drr, FlowId};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::config::{MetricsSnapshot, SourceMetrics};
use crate::error::{IngestionError, Result};
use crate::source::{SyntheticSource, SyntheticSourceConfig};

struct SourceEntry {
    name: FlowName,
    id: FlowId,
    weight: i64,
    source: SyntheticSource,
    metrics: Arc<SourceMetrics>,
}

/// Synthetic producers registered with one scheduler
///
/// Dropping the set stops every producer.
pub struct SourceSet {
    entries: Vec<SourceEntry>,
}

impl SourceSet {
    /// Create one producer per blueprint flow and register its channel
    ///
    /// Flows are registered in blueprint order. Producers only start once
    /// every flow was accepted; if registration fails part-way, the flows
    /// already registered are closed without producing anything.
    #[instrument(name = "ingestion_from_blueprint", skip_all, fields(flows = blueprint.flows.len()))]
    pub fn from_blueprint(blueprint: &MuxBlueprint, drr: &mut Drr<FlowItem>) -> Result<Self> {
        let mut pending = Vec::with_capacity(blueprint.flows.len());

        for flow in &blueprint.flows {
            let source = SyntheticSource::new(SyntheticSourceConfig::from_flow(flow))?;
            if flow.capacity == 0 {
                return Err(IngestionError::ZeroCapacity {
                    flow: flow.id.clone(),
                });
            }

            let (tx, rx) = mpsc::channel(flow.capacity);
            let id = drr
                .input(flow.weight, rx)
                .map_err(|source| IngestionError::Register {
                    flow: flow.id.clone(),
                    source,
                })?;
            debug!(flow = %flow.id, flow_id = %id, weight = flow.weight, "flow registered");

            let entry = SourceEntry {
                name: flow.id.clone(),
                id,
                weight: flow.weight,
                source,
                metrics: Arc::new(SourceMetrics::new()),
            };
            pending.push((entry, tx));
        }

        let entries = pending
            .into_iter()
            .map(|(entry, tx)| {
                entry.source.start_into(tx, Some(entry.metrics.clone()));
                entry
            })
            .collect::<Vec<_>>();

        info!(count = entries.len(), "synthetic sources started");
        Ok(Self { entries })
    }

    /// Registered flow count
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scheduler id assigned to a named flow
    pub fn flow_id(&self, name: &str) -> Option<FlowId> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.id)
    }

    /// `(name, weight)` pairs in registration order
    pub fn weights(&self) -> Vec<(FlowName, i64)> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.weight))
            .collect()
    }

    /// Shared counters of a named flow's producer
    pub fn metrics(&self, name: &str) -> Option<Arc<SourceMetrics>> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.metrics.clone())
    }

    /// Producer counters for every flow, in registration order
    pub fn snapshots(&self) -> Vec<(FlowName, MetricsSnapshot)> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.metrics.snapshot()))
            .collect()
    }

    /// Stop every producer
    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.entries.len(), "stopping synthetic sources");
        for entry in &self.entries {
            entry.source.stop();
        }
    }
}

impl Drop for SourceSet {
    fn drop(&mut self) {
        for entry in &self.entries {
            entry.source.stop();
        }
    }
}
