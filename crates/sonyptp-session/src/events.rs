//! Asynchronous event delivery.
//!
//! An [`EventPool`] keeps a fixed number of interrupt reads submitted to the
//! transport and runs a pump thread that drives the host event loop. Each
//! completed read is decoded, handed to the registered callback, and
//! resubmitted with the same buffer.
//!
//! Teardown is a rendezvous: cancellation is requested for every slot, then
//! the event loop keeps being pumped until every slot has come back from the
//! transport. A buffer is never released while a completion for it can
//! still fire.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use sonyptp_transport::{
    Completion, IgnorePoison, InterruptTransfer, TransferStatus, TransportError, UsbTransport,
};
use sonyptp_wire::{decode_event, Event, MAX_PARAM_CONTAINER};
use tracing::{debug, trace, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};

/// Callback invoked on the pump thread for every valid event.
///
/// Runs on the I/O thread and must not block.
pub type EventCallback = Arc<dyn Fn(&Event) + Send + Sync>;

struct PoolState {
    callback: EventCallback,
    /// Slots whose transfer is owned by the transport.
    in_flight: BTreeSet<usize>,
    cancelling: bool,
    delivered: u64,
}

struct Shared<T> {
    transport: Arc<T>,
    endpoint: u8,
    state: Mutex<PoolState>,
    running: AtomicBool,
}

impl<T: UsbTransport> Shared<T> {
    fn dispatch(&self, completions: Vec<Completion>) {
        for completion in completions {
            match completion.status {
                TransferStatus::Cancelled => {
                    trace!(slot = completion.slot, "event transfer cancelled");
                    self.release(completion.slot);
                }
                TransferStatus::Completed => {
                    self.deliver(&completion);
                    self.resubmit(completion);
                }
                status => {
                    debug!(slot = completion.slot, ?status, "event transfer failed, resubmitting");
                    self.resubmit(completion);
                }
            }
        }
    }

    fn deliver(&self, completion: &Completion) {
        let event = match decode_event(completion.data()) {
            Ok(event) => event,
            Err(err) => {
                debug!(slot = completion.slot, %err, "ignoring malformed event");
                return;
            }
        };
        let callback = {
            let mut state = self.state.lock_ignore_poison();
            if state.cancelling {
                return;
            }
            state.delivered += 1;
            Arc::clone(&state.callback)
        };
        debug!(code = event.code, params = ?event.params, "event");
        callback(&event);
    }

    fn resubmit(&self, completion: Completion) {
        let slot = completion.slot;
        let mut state = self.state.lock_ignore_poison();
        if state.cancelling {
            state.in_flight.remove(&slot);
            return;
        }
        let transfer = InterruptTransfer {
            slot,
            endpoint: self.endpoint,
            buffer: completion.buffer,
        };
        if let Err(err) = self.transport.submit_interrupt(transfer) {
            warn!(slot, %err, "event transfer resubmit failed");
            state.in_flight.remove(&slot);
        }
    }

    fn release(&self, slot: usize) {
        self.state.lock_ignore_poison().in_flight.remove(&slot);
    }

    fn in_flight(&self) -> usize {
        self.state.lock_ignore_poison().in_flight.len()
    }
}

/// A pool of self-resubmitting interrupt reads with a pump thread.
pub struct EventPool<T: UsbTransport + 'static> {
    shared: Arc<Shared<T>>,
    pump: Option<JoinHandle<()>>,
    poll: Duration,
    cancel_timeout: Duration,
}

impl<T: UsbTransport + 'static> EventPool<T> {
    /// Submit `config.event_slots` interrupt reads and start the pump thread.
    ///
    /// A slot whose submission fails stays empty; the pool runs with the rest.
    pub fn start(transport: Arc<T>, config: &SessionConfig, callback: EventCallback) -> Result<Self> {
        let endpoint = config.endpoints.interrupt_in;
        let shared = Arc::new(Shared {
            transport,
            endpoint,
            state: Mutex::new(PoolState {
                callback,
                in_flight: BTreeSet::new(),
                cancelling: false,
                delivered: 0,
            }),
            running: AtomicBool::new(true),
        });

        {
            let mut state = shared.state.lock_ignore_poison();
            for slot in 0..config.event_slots {
                let transfer = InterruptTransfer {
                    slot,
                    endpoint,
                    buffer: vec![0; MAX_PARAM_CONTAINER],
                };
                match shared.transport.submit_interrupt(transfer) {
                    Ok(()) => {
                        state.in_flight.insert(slot);
                    }
                    Err(err) => warn!(slot, %err, "event transfer submit failed"),
                }
            }
            debug!(slots = state.in_flight.len(), "event transfers submitted");
        }

        let mut pool = Self {
            shared: Arc::clone(&shared),
            pump: None,
            poll: config.event_poll,
            cancel_timeout: config.cancel_timeout,
        };

        let poll = config.event_poll;
        let spawned = thread::Builder::new()
            .name("sonyptp-events".into())
            .spawn(move || pump(shared, poll));
        match spawned {
            Ok(handle) => {
                pool.pump = Some(handle);
                Ok(pool)
            }
            Err(err) => {
                if let Err(cancel_err) = pool.stop() {
                    warn!(%cancel_err, "event pool cleanup after spawn failure");
                }
                Err(TransportError::Io(err).into())
            }
        }
    }

    /// Replace the callback. Takes effect from the next completion.
    pub fn set_callback(&self, callback: EventCallback) {
        self.shared.state.lock_ignore_poison().callback = callback;
    }

    /// Interrupt reads currently owned by the transport.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight()
    }

    /// Events handed to the callback so far.
    pub fn delivered(&self) -> u64 {
        self.shared.state.lock_ignore_poison().delivered
    }

    pub fn is_running(&self) -> bool {
        self.pump.is_some()
    }

    /// Cancel every transfer, stop the pump, and wait until all slots are back.
    ///
    /// Returns once no completion can fire any more, or fails after
    /// `cancel_timeout` with the number of slots still outstanding.
    pub fn stop(&mut self) -> Result<()> {
        let slots: Vec<usize> = {
            let mut state = self.shared.state.lock_ignore_poison();
            state.cancelling = true;
            state.in_flight.iter().copied().collect()
        };
        for &slot in &slots {
            if let Err(err) = self.shared.transport.cancel_interrupt(slot) {
                trace!(slot, %err, "cancel skipped");
            }
        }

        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.pump.take() {
            if handle.join().is_err() {
                warn!("event pump thread panicked");
            }
        }

        let deadline = Instant::now() + self.cancel_timeout;
        loop {
            let outstanding = self.shared.in_flight();
            if outstanding == 0 {
                debug!(cancelled = slots.len(), "event transfers released");
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(SessionError::Cancel(format!(
                    "{outstanding} event transfers still in flight after {:?}",
                    self.cancel_timeout
                )));
            }
            let wait = self.poll.min(deadline - now);
            let completions = self
                .shared
                .transport
                .handle_events(wait)
                .map_err(|err| SessionError::Cancel(err.to_string()))?;
            self.shared.dispatch(completions);
        }
    }
}

impl<T: UsbTransport + 'static> Drop for EventPool<T> {
    fn drop(&mut self) {
        if self.pump.is_some() {
            if let Err(err) = self.stop() {
                warn!(%err, "event pool teardown incomplete");
            }
        }
    }
}

fn pump<T: UsbTransport>(shared: Arc<Shared<T>>, poll: Duration) {
    debug!("event pump started");
    while shared.running.load(Ordering::Acquire) {
        match shared.transport.handle_events(poll) {
            Ok(completions) => shared.dispatch(completions),
            Err(err) => {
                warn!(%err, "event pump stopped on transport error");
                break;
            }
        }
    }
    debug!("event pump exited");
}
