//! # Contracts
//!
//! Shared data structures for the weighted fan-in workspace.
//! Business crates depend on this crate; reverse dependencies are prohibited.
//!
//! ## Contents
//! - `MuxBlueprint`: declarative description of flows and the output queue
//! - `FlowItem`: the item type produced by synthetic sources
//! - `FlowName`: cheap-to-clone flow identifier
//! - `ContractError`: configuration errors

mod blueprint;
mod error;
mod flow_name;
mod item;

pub use blueprint::*;
pub use error::*;
pub use flow_name::FlowName;
pub use item::FlowItem;
