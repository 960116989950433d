//! # DRR Engine
//!
//! Weighted fan-in scheduler: merges many input channels into one output
//! channel using Deficit Round Robin.
//!
//! Responsibilities:
//! - flow registration and weight validation
//! - readiness multiplexing over every active flow plus cancellation
//! - per-round weighted forwarding with output backpressure
//! - removal of exhausted flows and output closing on termination
//!
//! ## Example
//!
//! ```ignore
//! use drr_engine::{CancellationToken, Drr};
//! use tokio::sync::mpsc;
//!
//! let (out_tx, mut out_rx) = mpsc::channel(64);
//! let mut drr = Drr::new(out_tx)?;
//! drr.input(3, video_rx)?;
//! drr.input(1, telemetry_rx)?;
//!
//! let cancel = CancellationToken::new();
//! let handle = drr.start(cancel.clone())?;
//!
//! while let Some(item) = out_rx.recv().await {
//!     // Handle merged item
//! }
//! let summary = handle.join().await?;
//! ```

mod engine;
mod error;
mod flow;
mod handle;
mod readiness;
mod registry;

pub use engine::{Drr, DrrBuilder};
pub use error::DrrError;
pub use flow::FlowId;
pub use handle::{DrrHandle, RunSummary, Termination};

// Cancellation context accepted by `Drr::start`
pub use tokio_util::sync::CancellationToken;
