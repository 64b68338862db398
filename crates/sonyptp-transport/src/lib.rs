//! USB transport seam for PTP camera sessions.
//!
//! The PTP layers above only need a handful of USB primitives: bulk reads
//! and writes, halt clearing, and asynchronous interrupt reads pumped by the
//! host event loop. [`UsbTransport`] names exactly those. Opening the device
//! and owning the host library context stay with the caller.
//!
//! With the `scripted` feature, `ScriptedTransport` provides an in-memory
//! device for the tests of every layer.

pub mod error;
#[cfg(any(test, feature = "scripted"))]
pub mod scripted;
pub mod traits;

pub use error::{Result, TransportError};
#[cfg(any(test, feature = "scripted"))]
pub use scripted::{Failure, Responder, ScriptedTransport};
pub use traits::{
    Completion, Endpoints, IgnorePoison, InterruptTransfer, TransferStatus, UsbTransport,
    EP_BULK_IN, EP_BULK_OUT, EP_INTERRUPT_IN,
};
