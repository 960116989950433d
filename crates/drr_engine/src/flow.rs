//! Weighted input flow

use std::fmt;

use tokio::sync::mpsc;

/// Identity of a registered flow
///
/// Assigned at registration, monotonically increasing, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowId(u64);

impl FlowId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Registration sequence number (0 for the first flow)
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow-{}", self.0)
    }
}

/// A registered input stream and its weight
pub(crate) struct Flow<T> {
    pub(crate) id: FlowId,
    pub(crate) weight: u32,
    pub(crate) rx: mpsc::Receiver<T>,
}

impl<T> fmt::Debug for Flow<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow")
            .field("id", &self.id)
            .field("weight", &self.weight)
            .field("buffered", &self.rx.len())
            .finish()
    }
}
