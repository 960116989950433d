//! Scheduler validation errors
//!
//! Every variant is reported synchronously by `Drr::new`, `Drr::input` or
//! `Drr::start`. Once the dispatch loop runs it cannot fail, only terminate.

use thiserror::Error;

/// Errors returned while setting up a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DrrError {
    /// Weight was zero, negative, or does not fit in `u32`
    #[error("invalid weight {weight}: must be an integer in 1..={max}", max = u32::MAX)]
    InvalidWeight { weight: i64 },

    /// No input stream handle was given
    #[error("input stream is empty")]
    EmptyStream,

    /// No output sink was given, or its receiver is already gone
    #[error("output sink is empty")]
    EmptySink,

    /// `start` was called without a cancellation token
    #[error("cancellation context is missing")]
    MissingCancellationContext,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_weight_message() {
        let err = DrrError::InvalidWeight { weight: -2 };
        assert!(err.to_string().starts_with("invalid weight -2"));
    }
}
