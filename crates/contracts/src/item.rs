//! FlowItem - the payload produced by synthetic sources
//!
//! The scheduler itself is payload-agnostic; this type exists so producers,
//! the CLI and the end-to-end tests agree on how to attribute output items
//! back to the flow that produced them.

use serde::{Deserialize, Serialize};

use crate::FlowName;

/// One item travelling through a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowItem {
    /// Name of the producing flow
    pub flow_id: FlowName,

    /// Per-flow sequence number, starting at 0
    pub seq: u64,
}

impl FlowItem {
    pub fn new(flow_id: FlowName, seq: u64) -> Self {
        Self { flow_id, seq }
    }
}
