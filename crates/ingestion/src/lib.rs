//! # Ingestion
//!
//! Synthetic producers feeding the scheduler's input flows.
//!
//! Responsibilities:
//! - Produce numbered `FlowItem`s per flow, paced or unpaced
//! - Respect flow channel backpressure
//! - Register every blueprint flow with a `Drr` scheduler
//! - Count produced and blocked items
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::SourceSet;
//!
//! let mut drr = Drr::new(out_tx)?;
//! let sources = SourceSet::from_blueprint(&blueprint, &mut drr)?;
//! let handle = drr.start(cancel.clone())?;
//! ```
//!
//! ## Single Source
//!
//! ```ignore
//! use ingestion::SyntheticSource;
//!
//! let source = SyntheticSource::paced("telemetry", 200.0, None)?;
//! let rx = source.start(128, None)?;
//! ```

mod config;
mod error;
mod set;
mod source;

// Re-exports
pub use config::{MetricsSnapshot, SourceMetrics};
pub use contracts::FlowItem;
pub use error::{IngestionError, Result};
pub use set::SourceSet;
pub use source::{SyntheticSource, SyntheticSourceConfig};
