//! Active flow set with deferred removal
//!
//! Flows observed closed during a round are only marked; the active set is
//! compacted after the round so indices stay stable while it is iterated.

use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::debug;

use crate::error::DrrError;
use crate::flow::{Flow, FlowId};

/// Ordered set of active flows
pub(crate) struct Registry<T> {
    flows: Vec<Flow<T>>,
    pending_removal: Vec<usize>,
    next_id: u64,
}

impl<T> Registry<T> {
    pub(crate) fn new() -> Self {
        Self {
            flows: Vec::new(),
            pending_removal: Vec::new(),
            next_id: 0,
        }
    }

    /// Validate and append a flow
    ///
    /// Performs no mutation when validation fails.
    pub(crate) fn register(
        &mut self,
        weight: i64,
        stream: Option<mpsc::Receiver<T>>,
    ) -> Result<FlowId, DrrError> {
        let weight = u32::try_from(weight)
            .ok()
            .filter(|w| *w > 0)
            .ok_or(DrrError::InvalidWeight { weight })?;
        let rx = stream.ok_or(DrrError::EmptyStream)?;

        let id = FlowId::new(self.next_id);
        self.next_id += 1;
        self.flows.push(Flow { id, weight, rx });
        Ok(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.flows.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub(crate) fn flows_mut(&mut self) -> &mut [Flow<T>] {
        &mut self.flows
    }

    pub(crate) fn id(&self, index: usize) -> FlowId {
        self.flows[index].id
    }

    pub(crate) fn weight(&self, index: usize) -> u32 {
        self.flows[index].weight
    }

    /// Non-blocking read from one flow
    pub(crate) fn try_next(&mut self, index: usize) -> Result<T, TryRecvError> {
        self.flows[index].rx.try_recv()
    }

    /// Mark a flow as exhausted; it stays in place until `apply_removals`
    pub(crate) fn mark_closed(&mut self, index: usize) {
        if !self.pending_removal.contains(&index) {
            self.pending_removal.push(index);
        }
    }

    /// Drop every flow marked during the round and return their ids
    pub(crate) fn apply_removals(&mut self) -> Vec<FlowId> {
        if self.pending_removal.is_empty() {
            return Vec::new();
        }

        let pending = std::mem::take(&mut self.pending_removal);
        let removed: Vec<FlowId> = pending.iter().map(|&i| self.flows[i].id).collect();

        let mut index = 0;
        self.flows.retain(|_| {
            let keep = !pending.contains(&index);
            index += 1;
            keep
        });

        debug!(removed = ?removed, remaining = self.flows.len(), "removed exhausted flows");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (mpsc::Sender<u32>, mpsc::Receiver<u32>) {
        mpsc::channel(4)
    }

    #[test]
    fn test_register_assigns_increasing_ids() {
        let mut registry = Registry::new();
        let a = registry.register(1, Some(channel().1)).unwrap();
        let b = registry.register(5, Some(channel().1)).unwrap();
        assert!(a < b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.weight(1), 5);
    }

    #[test]
    fn test_register_rejects_without_mutation() {
        let mut registry: Registry<u32> = Registry::new();
        assert_eq!(
            registry.register(0, Some(channel().1)),
            Err(DrrError::InvalidWeight { weight: 0 })
        );
        assert_eq!(
            registry.register(-7, Some(channel().1)),
            Err(DrrError::InvalidWeight { weight: -7 })
        );
        assert_eq!(
            registry.register(i64::from(u32::MAX) + 1, Some(channel().1)),
            Err(DrrError::InvalidWeight {
                weight: i64::from(u32::MAX) + 1
            })
        );
        assert_eq!(registry.register(3, None), Err(DrrError::EmptyStream));
        assert!(registry.is_empty());

        // Failed registrations do not consume ids
        let first = registry.register(1, Some(channel().1)).unwrap();
        assert_eq!(first.as_u64(), 0);
    }

    #[test]
    fn test_removal_is_deferred() {
        let mut registry = Registry::new();
        let ids: Vec<FlowId> = (1..=4)
            .map(|w| registry.register(w, Some(channel().1)).unwrap())
            .collect();

        registry.mark_closed(1);
        registry.mark_closed(3);
        registry.mark_closed(1);

        // Indices are still valid until the removal pass
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.id(3), ids[3]);

        let removed = registry.apply_removals();
        assert_eq!(removed, vec![ids[1], ids[3]]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.id(0), ids[0]);
        assert_eq!(registry.id(1), ids[2]);

        assert!(registry.apply_removals().is_empty());
    }

    #[test]
    fn test_try_next_reports_disconnect() {
        let mut registry = Registry::new();
        let (tx, rx) = channel();
        registry.register(2, Some(rx)).unwrap();

        assert!(matches!(registry.try_next(0), Err(TryRecvError::Empty)));
        tx.try_send(9).unwrap();
        drop(tx);
        assert_eq!(registry.try_next(0), Ok(9));
        assert!(matches!(
            registry.try_next(0),
            Err(TryRecvError::Disconnected)
        ));
    }
}
