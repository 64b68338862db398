use std::time::Duration;

use sonyptp_session::SessionError;
use sonyptp_wire::{DataType, Scalar, WireError};

/// Errors from camera control and property convergence.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// A transaction failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// A vendor payload did not decode.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// The camera does not report this property.
    #[error("property {code:#06x} not found")]
    NotFound { code: u16 },

    /// The property has a different data type than the operation needs.
    #[error("property {code:#06x} has unexpected type {found}")]
    PropertyType { code: u16, found: DataType },

    /// The property has no usable current value.
    #[error("property {code:#06x} has no current value")]
    MissingValue { code: u16 },

    /// An event arrived without the parameter that identifies its subject.
    #[error("event {code:#06x} carries no parameter")]
    MissingEventParam { code: u16 },

    /// The target lies strictly between two adjacent device values.
    #[error("property {code:#06x}: target unreachable between {below} and {above}")]
    Unreachable {
        code: u16,
        below: Scalar,
        above: Scalar,
    },

    /// A step was issued but the value never changed.
    #[error("property {code:#06x} did not change within {waited:?}")]
    ConvergeTimeout { code: u16, waited: Duration },

    /// Convergence gave up after too many steps.
    #[error("property {code:#06x} not reached after {steps} steps")]
    StepLimit { code: u16, steps: usize },

    /// A stop was requested while waiting.
    #[error("stopped")]
    Stopped,
}

impl ControlError {
    /// Whether trying the same operation again can succeed without closing
    /// the session.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ControlError::ConvergeTimeout { .. } | ControlError::Session(SessionError::Busy(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;
