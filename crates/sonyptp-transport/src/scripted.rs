//! In-memory transport double.
//!
//! `ScriptedTransport` plays the device side of the USB link from queued
//! data: bulk IN chunks, interrupt events and injected failures. Every bulk
//! OUT write is recorded. An optional responder sees each write and may
//! queue reply chunks, which is enough to emulate a full PTP device.

use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::{Completion, IgnorePoison, InterruptTransfer, TransferStatus, UsbTransport};

/// Reply hook: receives every bulk OUT write, returns chunks to queue on bulk IN.
pub type Responder = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>> + Send>;

/// A failure to inject into the next matching transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Stall,
    Timeout,
    NoDevice,
    Overflow,
    Io,
}

impl Failure {
    fn into_error(self, endpoint: u8) -> TransportError {
        match self {
            Failure::Stall => TransportError::Stall { endpoint },
            Failure::Timeout => TransportError::Timeout { transferred: 0 },
            Failure::NoDevice => TransportError::NoDevice,
            Failure::Overflow => TransportError::Overflow { endpoint },
            Failure::Io => TransportError::Io(io::Error::other("injected failure")),
        }
    }
}

enum ReadStep {
    Data(Vec<u8>),
    /// Bytes that land before the read times out.
    Timeout(Vec<u8>),
    Fail(Failure),
}

#[derive(Default)]
struct State {
    claimed: Option<u8>,
    claims: usize,
    bulk_in: VecDeque<ReadStep>,
    writes: Vec<Vec<u8>>,
    write_failures: VecDeque<Failure>,
    halts_cleared: Vec<u8>,
    responder: Option<Responder>,
    events: VecDeque<Vec<u8>>,
    submitted: BTreeMap<usize, InterruptTransfer>,
    cancel_requests: Vec<usize>,
    completion_failures: VecDeque<TransferStatus>,
    submit_failures: usize,
    completion_delay: Duration,
    disconnected: bool,
}

impl State {
    fn has_completions(&self) -> bool {
        !self.cancel_requests.is_empty()
            || (!self.submitted.is_empty()
                && (!self.events.is_empty() || !self.completion_failures.is_empty()))
    }
}

/// A scripted stand-in for a USB device.
pub struct ScriptedTransport {
    state: Mutex<State>,
    signal: Condvar,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// Create a transport with empty queues.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            signal: Condvar::new(),
        }
    }

    /// Install a responder that answers bulk OUT writes.
    pub fn with_responder(self, responder: impl FnMut(&[u8]) -> Vec<Vec<u8>> + Send + 'static) -> Self {
        self.state.lock_ignore_poison().responder = Some(Box::new(responder));
        self
    }

    /// Hold back every batch of async completions by `delay`.
    pub fn with_completion_delay(self, delay: Duration) -> Self {
        self.state.lock_ignore_poison().completion_delay = delay;
        self
    }

    /// Queue a chunk for the next bulk IN read.
    ///
    /// A chunk longer than the read buffer is split across reads.
    pub fn push_bulk_in(&self, chunk: impl Into<Vec<u8>>) {
        self.state
            .lock_ignore_poison()
            .bulk_in
            .push_back(ReadStep::Data(chunk.into()));
    }

    /// Queue a chunk that arrives and then times out.
    pub fn push_bulk_in_timeout(&self, chunk: impl Into<Vec<u8>>) {
        self.state
            .lock_ignore_poison()
            .bulk_in
            .push_back(ReadStep::Timeout(chunk.into()));
    }

    /// Queue a failing bulk IN read.
    pub fn push_bulk_in_failure(&self, failure: Failure) {
        self.state
            .lock_ignore_poison()
            .bulk_in
            .push_back(ReadStep::Fail(failure));
    }

    /// Fail the next bulk OUT write.
    pub fn fail_next_write(&self, failure: Failure) {
        self.state
            .lock_ignore_poison()
            .write_failures
            .push_back(failure);
    }

    /// Queue an event container on the interrupt endpoint.
    pub fn push_event(&self, container: impl Into<Vec<u8>>) {
        self.state
            .lock_ignore_poison()
            .events
            .push_back(container.into());
        self.signal.notify_all();
    }

    /// Complete the next submitted interrupt transfer with `status`.
    pub fn fail_next_completion(&self, status: TransferStatus) {
        self.state
            .lock_ignore_poison()
            .completion_failures
            .push_back(status);
        self.signal.notify_all();
    }

    /// Reject the next interrupt submission.
    pub fn fail_next_submit(&self) {
        self.state.lock_ignore_poison().submit_failures += 1;
    }

    /// Simulate an unplugged device. Every later call fails with `NoDevice`.
    pub fn disconnect(&self) {
        self.state.lock_ignore_poison().disconnected = true;
        self.signal.notify_all();
    }

    /// Every bulk OUT write so far, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock_ignore_poison().writes.clone()
    }

    /// Drain the recorded bulk OUT writes.
    pub fn take_writes(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.state.lock_ignore_poison().writes)
    }

    /// Endpoints cleared with `clear_halt`, in order.
    pub fn halts_cleared(&self) -> Vec<u8> {
        self.state.lock_ignore_poison().halts_cleared.clone()
    }

    /// Currently claimed interface.
    pub fn claimed_interface(&self) -> Option<u8> {
        self.state.lock_ignore_poison().claimed
    }

    /// How many times an interface was claimed.
    pub fn claim_count(&self) -> usize {
        self.state.lock_ignore_poison().claims
    }

    /// Interrupt transfers currently owned by the transport.
    pub fn outstanding_interrupts(&self) -> usize {
        let state = self.state.lock_ignore_poison();
        state.submitted.len()
    }

    /// Bulk IN steps not yet consumed.
    pub fn pending_reads(&self) -> usize {
        self.state.lock_ignore_poison().bulk_in.len()
    }

    fn check_connected(state: &State) -> Result<()> {
        if state.disconnected {
            return Err(TransportError::NoDevice);
        }
        Ok(())
    }
}

impl UsbTransport for ScriptedTransport {
    fn claim_interface(&self, interface: u8) -> Result<()> {
        let mut state = self.state.lock_ignore_poison();
        Self::check_connected(&state)?;
        if state.claimed.is_some() {
            return Err(TransportError::Busy);
        }
        state.claimed = Some(interface);
        state.claims += 1;
        Ok(())
    }

    fn release_interface(&self, interface: u8) -> Result<()> {
        let mut state = self.state.lock_ignore_poison();
        if state.claimed == Some(interface) {
            state.claimed = None;
        }
        Ok(())
    }

    fn bulk_write(&self, endpoint: u8, data: &[u8], _timeout: Option<Duration>) -> Result<usize> {
        let mut state = self.state.lock_ignore_poison();
        Self::check_connected(&state)?;
        if let Some(failure) = state.write_failures.pop_front() {
            return Err(failure.into_error(endpoint));
        }
        trace!(endpoint, len = data.len(), "scripted bulk write");
        state.writes.push(data.to_vec());
        let replies = match state.responder.as_mut() {
            Some(responder) => responder(data),
            None => Vec::new(),
        };
        state.bulk_in.extend(replies.into_iter().map(ReadStep::Data));
        Ok(data.len())
    }

    fn bulk_read(&self, endpoint: u8, buf: &mut [u8], _timeout: Option<Duration>) -> Result<usize> {
        let mut state = self.state.lock_ignore_poison();
        Self::check_connected(&state)?;
        match state.bulk_in.pop_front() {
            None => Err(TransportError::Timeout { transferred: 0 }),
            Some(ReadStep::Fail(failure)) => Err(failure.into_error(endpoint)),
            Some(ReadStep::Data(chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    state.bulk_in.push_front(ReadStep::Data(chunk[n..].to_vec()));
                }
                Ok(n)
            }
            Some(ReadStep::Timeout(chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Err(TransportError::Timeout { transferred: n })
            }
        }
    }

    fn interrupt_read(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock_ignore_poison();
        loop {
            Self::check_connected(&state)?;
            if let Some(event) = state.events.pop_front() {
                if event.len() > buf.len() {
                    return Err(TransportError::Overflow { endpoint });
                }
                buf[..event.len()].copy_from_slice(&event);
                return Ok(event.len());
            }
            state = match deadline {
                None => self.signal.wait(state).unwrap_or_else(|e| e.into_inner()),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(TransportError::Timeout { transferred: 0 });
                    }
                    self.signal
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(|e| e.into_inner())
                        .0
                }
            };
        }
    }

    fn clear_halt(&self, endpoint: u8) -> Result<()> {
        let mut state = self.state.lock_ignore_poison();
        Self::check_connected(&state)?;
        state.halts_cleared.push(endpoint);
        Ok(())
    }

    fn submit_interrupt(&self, transfer: InterruptTransfer) -> Result<()> {
        let mut state = self.state.lock_ignore_poison();
        Self::check_connected(&state)?;
        if state.submit_failures > 0 {
            state.submit_failures -= 1;
            return Err(TransportError::Io(io::Error::other("injected submit failure")));
        }
        state.submitted.insert(transfer.slot, transfer);
        self.signal.notify_all();
        Ok(())
    }

    fn cancel_interrupt(&self, slot: usize) -> Result<()> {
        let mut state = self.state.lock_ignore_poison();
        if !state.submitted.contains_key(&slot) {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("slot {slot} not in flight"),
            )));
        }
        if !state.cancel_requests.contains(&slot) {
            state.cancel_requests.push(slot);
        }
        self.signal.notify_all();
        Ok(())
    }

    fn handle_events(&self, timeout: Duration) -> Result<Vec<Completion>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock_ignore_poison();
        while !state.has_completions() {
            let now = Instant::now();
            if now >= deadline {
                return Ok(Vec::new());
            }
            state = self
                .signal
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }

        let delay = state.completion_delay;
        if !delay.is_zero() {
            drop(state);
            std::thread::sleep(delay);
            state = self.state.lock_ignore_poison();
        }

        let mut completions = Vec::new();
        for slot in std::mem::take(&mut state.cancel_requests) {
            if let Some(transfer) = state.submitted.remove(&slot) {
                completions.push(Completion {
                    slot,
                    endpoint: transfer.endpoint,
                    buffer: transfer.buffer,
                    actual_length: 0,
                    status: TransferStatus::Cancelled,
                });
            }
        }

        while !state.submitted.is_empty() {
            if let Some(status) = state.completion_failures.pop_front() {
                if let Some((slot, transfer)) = state.submitted.pop_first() {
                    completions.push(Completion {
                        slot,
                        endpoint: transfer.endpoint,
                        buffer: transfer.buffer,
                        actual_length: 0,
                        status,
                    });
                }
                continue;
            }
            let Some(event) = state.events.pop_front() else {
                break;
            };
            if let Some((slot, mut transfer)) = state.submitted.pop_first() {
                let (actual_length, status) = if event.len() > transfer.buffer.len() {
                    (0, TransferStatus::Overflow)
                } else {
                    transfer.buffer[..event.len()].copy_from_slice(&event);
                    (event.len(), TransferStatus::Completed)
                };
                completions.push(Completion {
                    slot,
                    endpoint: transfer.endpoint,
                    buffer: transfer.buffer,
                    actual_length,
                    status,
                });
            }
        }

        Ok(completions)
    }
}
