//! DrrHandle - observes a running dispatch loop

use std::fmt;

use tokio::task::{JoinError, JoinHandle};

/// Why the dispatch loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The cancellation token fired
    Cancelled,
    /// Every registered flow was exhausted
    Exhausted,
    /// The consumer dropped the output receiver
    OutputClosed,
}

impl Termination {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::Exhausted => "exhausted",
            Self::OutputClosed => "output_closed",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters collected by the dispatch loop over its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Rounds started (one per readiness wake-up)
    pub rounds: u64,
    /// Items written to the output
    pub forwarded: u64,
    /// Flows removed after being observed exhausted
    pub flows_closed: u64,
    /// Termination reason
    pub termination: Termination,
}

/// Handle to a running dispatch loop
///
/// Dropping the handle does not stop the loop; cancel its token instead.
/// The output channel closing remains the primary termination signal; the
/// handle only lets callers wait for the task and read its summary.
#[derive(Debug)]
pub struct DrrHandle {
    task: JoinHandle<RunSummary>,
}

impl DrrHandle {
    pub(crate) fn new(task: JoinHandle<RunSummary>) -> Self {
        Self { task }
    }

    /// Whether the loop task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop task to exit
    ///
    /// # Errors
    /// Returns the `JoinError` if the task panicked or was aborted.
    pub async fn join(self) -> Result<RunSummary, JoinError> {
        self.task.await
    }
}
