use std::time::Duration;

use sonyptp_transport::TransportError;
use sonyptp_wire::WireError;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error outside a container exchange.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Framing, protocol or decode error.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Caller passed an invalid request.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("session already open")]
    AlreadyOpen,

    #[error("session not open")]
    NotOpen,

    /// An earlier failure left the session unusable. Close and reopen.
    #[error("session failed; close and reopen it")]
    Poisoned,

    /// Events are being delivered to a callback, not to `wait_event`.
    #[error("event callback pool is active")]
    EventPoolActive,

    /// The shared session stayed locked for the whole wait.
    #[error("session busy for {0:?}")]
    Busy(Duration),

    /// Event transfers did not come back during teardown.
    #[error("event cancellation failed: {0}")]
    Cancel(String),
}

impl SessionError {
    /// A device protocol violation or rejection.
    pub fn is_protocol(&self) -> bool {
        matches!(self, SessionError::Wire(err) if err.is_protocol())
    }

    /// A USB-level failure, wherever it surfaced.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SessionError::Transport(_) | SessionError::Wire(WireError::Transport(_))
        )
    }

    /// The response code, if the device answered with a non-OK code.
    pub fn response_code(&self) -> Option<u16> {
        match self {
            SessionError::Wire(WireError::ResponseCode { code, .. }) => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
