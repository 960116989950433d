//! Readiness multiplexer
//!
//! Waits on a dynamic set of flows plus the cancellation token using a single
//! merged poll: every receiver and the token register the same task waker, so
//! the wait never spins regardless of how many flows are active.

use std::future::{poll_fn, Future};
use std::pin::pin;
use std::task::Poll;

use rand::seq::SliceRandom;
use tokio_util::sync::CancellationToken;

use crate::flow::Flow;

/// Outcome of one readiness wait
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Readiness<T> {
    /// The flow at `index` produced `item`
    Item { index: usize, item: T },
    /// The flow at `index` is exhausted
    Closed { index: usize },
    /// The token fired
    Cancelled,
}

/// Suspend until one flow is ready or closed, or the token fires
///
/// Exactly one source is reported. Flows are scanned in a fresh random
/// order on every wait, so each of several simultaneously ready flows is
/// equally likely to be picked. With no flows the wait depends on the token
/// alone.
pub(crate) async fn wait_ready<T>(
    flows: &mut [Flow<T>],
    cancel: &CancellationToken,
) -> Readiness<T> {
    if cancel.is_cancelled() {
        return Readiness::Cancelled;
    }

    let mut order: Vec<usize> = (0..flows.len()).collect();
    order.shuffle(&mut rand::rng());
    let mut cancelled = pin!(cancel.cancelled());

    poll_fn(|cx| {
        if cancelled.as_mut().poll(cx).is_ready() {
            return Poll::Ready(Readiness::Cancelled);
        }

        for &index in &order {
            match flows[index].rx.poll_recv(cx) {
                Poll::Ready(Some(item)) => return Poll::Ready(Readiness::Item { index, item }),
                Poll::Ready(None) => return Poll::Ready(Readiness::Closed { index }),
                Poll::Pending => {}
            }
        }

        Poll::Pending
    })
    .await
}
