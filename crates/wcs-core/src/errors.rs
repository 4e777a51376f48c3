//! The closed error taxonomy of the weapon control core.
//!
//! Every fallible operation returns `WcsResult`; there is no sideband
//! error channel.

use thiserror::Error;

use crate::enums::{ControlState, WeaponKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WcsError {
    #[error("invalid tube number {0}")]
    InvalidTube(u16),

    #[error("tube {0} has no weapon assigned")]
    NotAssigned(u16),

    #[error("tube {0} is already assigned")]
    AlreadyAssigned(u16),

    #[error("unsupported weapon kind {0}")]
    UnsupportedKind(WeaponKind),

    #[error("invalid transition {from} -> {to}")]
    InvalidTransition {
        from: ControlState,
        to: ControlState,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("launch sequence aborted")]
    Aborted,

    #[error("no valid target")]
    NoTarget,

    #[error("too many waypoints: {0} (max 8)")]
    TooManyWaypoints(usize),

    #[error("invalid drop plan: {0}")]
    InvalidPlan(String),

    #[error("plan list {0} is full")]
    PlanListFull(u32),

    #[error("plan number {0} already exists")]
    DuplicatePlanNumber(u32),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("config error: {0}")]
    Config(String),

    /// Composite result of an all-tube operation; callers can still read
    /// per-tube states to reconcile.
    #[error("partial failure on {} tube(s)", .0.len())]
    PartialFailure(Vec<(u16, WcsError)>),
}

impl From<std::io::Error> for WcsError {
    fn from(err: std::io::Error) -> Self {
        WcsError::Io(err.to_string())
    }
}

pub type WcsResult<T> = Result<T, WcsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_names_both_states() {
        let err = WcsError::InvalidTransition {
            from: ControlState::Launch,
            to: ControlState::Off,
        };
        assert_eq!(err.to_string(), "invalid transition LAUNCH -> OFF");
    }

    #[test]
    fn partial_failure_counts_tubes() {
        let err = WcsError::PartialFailure(vec![
            (1, WcsError::Cancelled),
            (4, WcsError::NotAssigned(4)),
        ]);
        assert_eq!(err.to_string(), "partial failure on 2 tube(s)");
    }
}
