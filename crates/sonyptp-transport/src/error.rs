/// Errors reported by a USB transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint halted and must be cleared before the next transfer.
    #[error("endpoint {endpoint:#04x} stalled")]
    Stall { endpoint: u8 },

    /// The transfer did not finish before its timeout.
    ///
    /// `transferred` counts the bytes that landed before the deadline.
    #[error("transfer timed out after {transferred} bytes")]
    Timeout { transferred: usize },

    /// The device was disconnected.
    #[error("no device (disconnected)")]
    NoDevice,

    /// The device sent more data than the buffer could hold.
    #[error("transfer overflow on endpoint {endpoint:#04x}")]
    Overflow { endpoint: u8 },

    /// The interface or endpoint is in use by someone else.
    #[error("resource busy")]
    Busy,

    /// Claiming the interface failed.
    #[error("failed to claim interface {interface}: {reason}")]
    Claim { interface: u8, reason: String },

    /// The transfer was cancelled before completion.
    #[error("transfer cancelled")]
    Cancelled,

    /// A generic I/O error from the host stack.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// Returns true for a timeout, the only status a read may tolerate.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the endpoint needs a clear-halt before reuse.
    pub fn is_stall(&self) -> bool {
        matches!(self, Self::Stall { .. })
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
