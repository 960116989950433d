//! Deficit Round Robin dispatch loop.

use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace};

use crate::error::DrrError;
use crate::flow::FlowId;
use crate::handle::{DrrHandle, RunSummary, Termination};
use crate::readiness::{wait_ready, Readiness};
use crate::registry::Registry;

/// Dispatch loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    /// Blocked in the readiness multiplexer
    Waiting,
    /// Visiting the active set
    RoundActive,
    /// Pulling up to `budget` items from one flow without blocking
    Draining { flow: FlowId, budget: u32 },
    /// Pruning flows closed during the round
    Removing,
    /// Output closed, no further transitions
    Terminated,
}

/// The flow that woke the current round and what the multiplexer saw on it
struct Wake<T> {
    index: usize,
    /// `None` when the flow was observed closed
    item: Option<T>,
}

/// Weighted fan-in scheduler
///
/// Registers weighted input flows and, once started, forwards their items
/// to a single output using Deficit Round Robin. Each round a flow may emit
/// up to `weight` items; unused budget is forfeited, it does not carry over
/// to the next round.
///
/// ```ignore
/// let (out_tx, mut out_rx) = mpsc::channel(64);
/// let mut drr = Drr::new(out_tx)?;
/// drr.input(3, fast_rx)?;
/// drr.input(1, slow_rx)?;
/// let handle = drr.start(CancellationToken::new())?;
///
/// while let Some(item) = out_rx.recv().await {
///     // ...
/// }
/// ```
pub struct Drr<T> {
    registry: Registry<T>,
    output: mpsc::Sender<T>,
}

impl<T: Send + 'static> Drr<T> {
    /// Create a scheduler writing to `output`
    ///
    /// The scheduler owns closing: the output is closed exactly once, when
    /// the loop terminates, by dropping this sender. Callers must not keep
    /// clones of it, otherwise the consumer never observes the close.
    ///
    /// # Errors
    /// `EmptySink` if no sender is given or its receiver is already dropped.
    pub fn new(output: impl Into<Option<mpsc::Sender<T>>>) -> Result<Self, DrrError> {
        let output = output.into().ok_or(DrrError::EmptySink)?;
        if output.is_closed() {
            return Err(DrrError::EmptySink);
        }
        Ok(Self {
            registry: Registry::new(),
            output,
        })
    }

    /// Register an input flow with a positive weight
    ///
    /// Ownership of the receiver moves into the scheduler, which becomes its
    /// only reader. Registration is only possible before `start`.
    ///
    /// # Errors
    /// `InvalidWeight` for `weight <= 0` or above `u32::MAX`, `EmptyStream`
    /// if no receiver is given. Nothing is registered on error.
    #[instrument(name = "drr_register", skip(self, stream))]
    pub fn input(
        &mut self,
        weight: i64,
        stream: impl Into<Option<mpsc::Receiver<T>>>,
    ) -> Result<FlowId, DrrError> {
        let id = self.registry.register(weight, stream.into())?;
        debug!(flow_id = %id, weight, "registered flow");
        Ok(id)
    }

    /// Number of registered flows
    pub fn flow_count(&self) -> usize {
        self.registry.len()
    }

    /// Spawn the dispatch loop and return immediately
    ///
    /// The loop runs until `cancel` fires, every flow is exhausted, or the
    /// output receiver is dropped; the output is closed in all three cases.
    /// Cancellation takes effect promptly: an item blocked on a full output,
    /// or a woken item whose flow was not yet visited, is dropped, not sent.
    ///
    /// # Errors
    /// `MissingCancellationContext` if no token is given.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    #[instrument(name = "drr_start", skip_all, fields(flows = self.registry.len()))]
    pub fn start(
        self,
        cancel: impl Into<Option<CancellationToken>>,
    ) -> Result<DrrHandle, DrrError> {
        let cancel = cancel.into().ok_or(DrrError::MissingCancellationContext)?;
        let dispatcher = Dispatcher {
            registry: self.registry,
            output: self.output,
            cancel,
            state: LoopState::Waiting,
            summary: Counters::default(),
        };
        Ok(DrrHandle::new(tokio::spawn(dispatcher.run())))
    }
}

/// Builder collecting the output and flows before starting a scheduler
///
/// Errors are deferred to `start`, which reports the first invalid call.
pub struct DrrBuilder<T> {
    output: Option<mpsc::Sender<T>>,
    flows: Vec<(i64, Option<mpsc::Receiver<T>>)>,
}

impl<T: Send + 'static> DrrBuilder<T> {
    pub fn new() -> Self {
        Self {
            output: None,
            flows: Vec::new(),
        }
    }

    pub fn output(mut self, output: mpsc::Sender<T>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn flow(mut self, weight: i64, stream: mpsc::Receiver<T>) -> Self {
        self.flows.push((weight, Some(stream)));
        self
    }

    /// Build the scheduler without starting it
    pub fn build(self) -> Result<Drr<T>, DrrError> {
        let mut drr = Drr::new(self.output)?;
        for (weight, stream) in self.flows {
            drr.input(weight, stream)?;
        }
        Ok(drr)
    }

    pub fn start(self, cancel: CancellationToken) -> Result<DrrHandle, DrrError> {
        self.build()?.start(cancel)
    }
}

impl<T: Send + 'static> Default for DrrBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct Counters {
    rounds: u64,
    forwarded: u64,
    flows_closed: u64,
}

/// State owned by the spawned loop task
struct Dispatcher<T> {
    registry: Registry<T>,
    output: mpsc::Sender<T>,
    cancel: CancellationToken,
    state: LoopState,
    summary: Counters,
}

impl<T: Send + 'static> Dispatcher<T> {
    #[instrument(name = "drr_loop", skip_all, fields(flows = self.registry.len()))]
    async fn run(mut self) -> RunSummary {
        info!("drr loop started");

        let termination = loop {
            self.transition(LoopState::Waiting);
            let wake = match wait_ready(self.registry.flows_mut(), &self.cancel).await {
                Readiness::Cancelled => break Termination::Cancelled,
                Readiness::Item { index, item } => Wake {
                    index,
                    item: Some(item),
                },
                Readiness::Closed { index } => Wake { index, item: None },
            };

            self.transition(LoopState::RoundActive);
            self.summary.rounds += 1;
            metrics::counter!("drr_rounds_total").increment(1);

            if let Err(termination) = self.run_round(wake).await {
                break termination;
            }

            self.transition(LoopState::Removing);
            let removed = self.registry.apply_removals();
            if !removed.is_empty() {
                self.summary.flows_closed += removed.len() as u64;
                metrics::counter!("drr_flows_closed_total").increment(removed.len() as u64);
            }
            if self.registry.is_empty() {
                break Termination::Exhausted;
            }
        };

        self.transition(LoopState::Terminated);
        metrics::counter!("drr_terminations_total", "reason" => termination.as_str())
            .increment(1);

        let Dispatcher {
            registry,
            output,
            summary,
            ..
        } = self;
        // Closing the output is the termination signal seen by the consumer
        drop(output);
        drop(registry);

        info!(
            reason = %termination,
            rounds = summary.rounds,
            forwarded = summary.forwarded,
            flows_closed = summary.flows_closed,
            "drr loop terminated"
        );

        RunSummary {
            rounds: summary.rounds,
            forwarded: summary.forwarded,
            flows_closed: summary.flows_closed,
            termination,
        }
    }

    /// Visit every active flow once, in order
    #[instrument(name = "drr_round", level = "debug", skip_all, fields(round = self.summary.rounds, woke = wake.index))]
    async fn run_round(&mut self, wake: Wake<T>) -> Result<(), Termination> {
        let Wake {
            index: woke,
            item: mut woke_item,
        } = wake;

        for index in 0..self.registry.len() {
            if self.cancel.is_cancelled() {
                return Err(Termination::Cancelled);
            }

            let id = self.registry.id(index);
            let mut budget = self.registry.weight(index);
            let mut sent = 0u64;

            if index == woke {
                match woke_item.take() {
                    Some(item) => {
                        self.forward(id, item).await?;
                        sent += 1;
                        budget -= 1;
                    }
                    None => {
                        debug!(flow_id = %id, "flow closed");
                        self.registry.mark_closed(index);
                        continue;
                    }
                }
            }

            self.transition(LoopState::Draining { flow: id, budget });
            sent += self.drain(index, id, budget).await?;

            if sent > 0 {
                metrics::counter!("drr_items_forwarded_total", "flow_id" => id.to_string())
                    .increment(sent);
            }
            self.transition(LoopState::RoundActive);
        }

        Ok(())
    }

    /// Forward up to `budget` immediately available items from one flow
    async fn drain(&mut self, index: usize, id: FlowId, budget: u32) -> Result<u64, Termination> {
        let mut sent = 0u64;
        for _ in 0..budget {
            match self.registry.try_next(index) {
                Ok(item) => {
                    self.forward(id, item).await?;
                    sent += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!(flow_id = %id, "flow closed");
                    self.registry.mark_closed(index);
                    break;
                }
            }
        }
        Ok(sent)
    }

    /// Write one item to the output, giving up if cancellation fires first
    ///
    /// A full output blocks here, which throttles every producer. If the
    /// token fires while blocked, the item is dropped undelivered.
    async fn forward(&mut self, id: FlowId, item: T) -> Result<(), Termination> {
        if self.cancel.is_cancelled() {
            return Err(Termination::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Termination::Cancelled),
            sent = self.output.send(item) => match sent {
                Ok(()) => {
                    self.summary.forwarded += 1;
                    trace!(flow_id = %id, "forwarded item");
                    Ok(())
                }
                Err(_) => {
                    debug!(flow_id = %id, "output receiver dropped");
                    Err(Termination::OutputClosed)
                }
            },
        }
    }

    fn transition(&mut self, next: LoopState) {
        trace!(from = ?self.state, to = ?next, "drr state transition");
        self.state = next;
    }
}
