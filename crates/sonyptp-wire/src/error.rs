use sonyptp_transport::TransportError;

/// Allocation failure while growing an arena.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("arena allocation of {requested} bytes failed")]
    Alloc { requested: usize },
}

/// Errors from container framing and dataset decoding.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A field needs more bytes than remain in the input.
    #[error("truncated {field}: needs {needed} bytes, {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// The type code is not in the data type table.
    #[error("unsupported data type {code:#06x}")]
    UnsupportedType { code: u16 },

    /// The descriptor form flag is not None, Range or Enum.
    #[error("unknown form flag {flag}")]
    UnknownForm { flag: u8 },

    /// More than five parameters in one container.
    #[error("too many parameters ({count}, max 5)")]
    TooManyParams { count: usize },

    /// A payload too large for the 32-bit container length.
    #[error("payload too large ({size} bytes)")]
    PayloadTooLarge { size: usize },

    /// Container length disagrees with the bytes transferred.
    #[error("length mismatch: declared {declared}, transferred {transferred}")]
    Length { declared: usize, transferred: usize },

    /// The container answers a different transaction.
    #[error("transaction id mismatch: expected {expected}, found {found}")]
    TransactionId { expected: u32, found: u32 },

    /// The container has the wrong type for this phase.
    #[error("container type mismatch: expected {expected}, found {found}")]
    ContainerType { expected: u16, found: u16 },

    /// The device answered with a response code other than OK.
    #[error("device responded {code:#06x} ({name})")]
    ResponseCode { code: u16, name: &'static str },

    /// Allocating the decode arena or a data buffer failed.
    #[error("memory error: {0}")]
    Memory(#[from] ArenaError),

    /// The transport failed underneath a container read or write.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl WireError {
    /// Error for a non-OK response code.
    pub fn response(code: u16) -> Self {
        Self::ResponseCode {
            code,
            name: crate::codes::response_name(code),
        }
    }

    /// Protocol violations: the device said something other than expected.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::Length { .. }
                | Self::TransactionId { .. }
                | Self::ContainerType { .. }
                | Self::ResponseCode { .. }
        )
    }

    /// Decode failures inside a payload.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. } | Self::UnsupportedType { .. } | Self::UnknownForm { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, WireError>;
