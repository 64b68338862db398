use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::Result;

/// Default bulk OUT endpoint (commands and outbound data).
pub const EP_BULK_OUT: u8 = 0x02;

/// Default bulk IN endpoint (responses and inbound data).
pub const EP_BULK_IN: u8 = 0x81;

/// Default interrupt IN endpoint (events).
pub const EP_INTERRUPT_IN: u8 = 0x83;

/// Endpoint addresses used by a PTP interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub bulk_out: u8,
    pub bulk_in: u8,
    pub interrupt_in: u8,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            bulk_out: EP_BULK_OUT,
            bulk_in: EP_BULK_IN,
            interrupt_in: EP_INTERRUPT_IN,
        }
    }
}

/// Final status of an asynchronous interrupt transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Completed,
    TimedOut,
    Cancelled,
    Stall,
    NoDevice,
    Overflow,
    Error,
}

/// An interrupt read handed to the transport.
///
/// The transport owns `buffer` until it comes back in a [`Completion`].
#[derive(Debug)]
pub struct InterruptTransfer {
    pub slot: usize,
    pub endpoint: u8,
    pub buffer: Vec<u8>,
}

/// A finished interrupt transfer, returned by [`UsbTransport::handle_events`].
#[derive(Debug)]
pub struct Completion {
    pub slot: usize,
    pub endpoint: u8,
    pub buffer: Vec<u8>,
    pub actual_length: usize,
    pub status: TransferStatus,
}

impl Completion {
    /// Bytes actually received.
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.actual_length.min(self.buffer.len())]
    }
}

/// The USB primitives a PTP session needs from the host stack.
///
/// Opening the device and running the host library's context live outside
/// this trait. Implementations must be usable from the caller thread and the
/// event pump thread at the same time.
pub trait UsbTransport: Send + Sync {
    /// Claim the interface for exclusive use.
    fn claim_interface(&self, interface: u8) -> Result<()>;

    /// Release a previously claimed interface.
    fn release_interface(&self, interface: u8) -> Result<()>;

    /// Write to a bulk endpoint. `None` waits forever.
    fn bulk_write(&self, endpoint: u8, data: &[u8], timeout: Option<Duration>) -> Result<usize>;

    /// Read from a bulk endpoint into `buf`, returning the byte count.
    fn bulk_read(&self, endpoint: u8, buf: &mut [u8], timeout: Option<Duration>) -> Result<usize>;

    /// Blocking read from an interrupt endpoint.
    fn interrupt_read(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize>;

    /// Clear a halt/stall condition on an endpoint.
    fn clear_halt(&self, endpoint: u8) -> Result<()>;

    /// Submit an asynchronous interrupt read.
    fn submit_interrupt(&self, transfer: InterruptTransfer) -> Result<()>;

    /// Request cancellation of the transfer in `slot`.
    ///
    /// The buffer is returned later as a [`TransferStatus::Cancelled`]
    /// completion from [`handle_events`](Self::handle_events).
    fn cancel_interrupt(&self, slot: usize) -> Result<()>;

    /// Pump the host event loop once, returning finished transfers.
    fn handle_events(&self, timeout: Duration) -> Result<Vec<Completion>>;
}

impl<T: UsbTransport + ?Sized> UsbTransport for Arc<T> {
    fn claim_interface(&self, interface: u8) -> Result<()> {
        (**self).claim_interface(interface)
    }

    fn release_interface(&self, interface: u8) -> Result<()> {
        (**self).release_interface(interface)
    }

    fn bulk_write(&self, endpoint: u8, data: &[u8], timeout: Option<Duration>) -> Result<usize> {
        (**self).bulk_write(endpoint, data, timeout)
    }

    fn bulk_read(&self, endpoint: u8, buf: &mut [u8], timeout: Option<Duration>) -> Result<usize> {
        (**self).bulk_read(endpoint, buf, timeout)
    }

    fn interrupt_read(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize> {
        (**self).interrupt_read(endpoint, buf, timeout)
    }

    fn clear_halt(&self, endpoint: u8) -> Result<()> {
        (**self).clear_halt(endpoint)
    }

    fn submit_interrupt(&self, transfer: InterruptTransfer) -> Result<()> {
        (**self).submit_interrupt(transfer)
    }

    fn cancel_interrupt(&self, slot: usize) -> Result<()> {
        (**self).cancel_interrupt(slot)
    }

    fn handle_events(&self, timeout: Duration) -> Result<Vec<Completion>> {
        (**self).handle_events(timeout)
    }
}

/// Lock a mutex whose contents stay valid if a holder panicked.
pub trait IgnorePoison<T> {
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> IgnorePoison<T> for Mutex<T> {
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|e| e.into_inner())
    }
}
