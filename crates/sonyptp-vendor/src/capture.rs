//! Waiting for captured images.
//!
//! The camera reports captures two ways: an ObjectAdded event, and the
//! pending-images property. [`wait_for_pending`] always confirms through the
//! property; the [`PendingStrategy`] only decides what wakes it between
//! reads.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use sonyptp_transport::IgnorePoison;
use sonyptp_wire::Event;
use tracing::{debug, trace};

use crate::codes::event;
use crate::error::{ControlError, Result};

/// Decoded pending-images word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingStatus {
    /// Images held in camera memory.
    pub count: u16,
    /// The head image is ready to transfer.
    pub ready: bool,
}

impl PendingStatus {
    pub const READY_BIT: u16 = 0x8000;

    pub fn from_raw(raw: u16) -> Self {
        Self {
            count: raw & !Self::READY_BIT,
            ready: raw & Self::READY_BIT != 0,
        }
    }

    pub fn raw(self) -> u16 {
        (self.count & !Self::READY_BIT) | if self.ready { Self::READY_BIT } else { 0 }
    }

    pub fn has_pending(self) -> bool {
        self.count > 0
    }
}

/// Why a [`CaptureSignal::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Posted,
    TimedOut,
    Stopped,
}

#[derive(Default)]
struct SignalState {
    permits: usize,
    stopped: bool,
}

#[derive(Default)]
struct SignalInner {
    state: Mutex<SignalState>,
    changed: Condvar,
}

/// Counting semaphore plus a stop flag, shared between the event callback
/// and a capture thread.
#[derive(Clone, Default)]
pub struct CaptureSignal {
    inner: Arc<SignalInner>,
}

impl CaptureSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self) {
        self.inner.state.lock_ignore_poison().permits += 1;
        self.inner.changed.notify_one();
    }

    /// Wake every waiter; later waits return [`Wake::Stopped`] at once.
    pub fn stop(&self) {
        self.inner.state.lock_ignore_poison().stopped = true;
        self.inner.changed.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.state.lock_ignore_poison().stopped
    }

    /// Permits posted and not yet taken.
    pub fn permits(&self) -> usize {
        self.inner.state.lock_ignore_poison().permits
    }

    /// Take one permit, waiting at most `timeout`. Stop wins over permits.
    pub fn wait(&self, timeout: Duration) -> Wake {
        self.wait_until(timeout, true)
    }

    /// Sleep for `timeout` unless stopped first. Permits are left alone.
    pub fn pause(&self, timeout: Duration) -> Wake {
        self.wait_until(timeout, false)
    }

    fn wait_until(&self, timeout: Duration, take_permit: bool) -> Wake {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock_ignore_poison();
        loop {
            if state.stopped {
                return Wake::Stopped;
            }
            if take_permit && state.permits > 0 {
                state.permits -= 1;
                return Wake::Posted;
            }
            let now = Instant::now();
            if now >= deadline {
                return Wake::TimedOut;
            }
            state = self
                .inner
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
    }

    /// An event callback that posts once per ObjectAdded event.
    pub fn event_callback(&self) -> impl Fn(&Event) + Send + Sync + 'static {
        let signal = self.clone();
        move |ev: &Event| {
            trace!(code = ev.code, "capture signal saw event");
            if ev.code == event::OBJECT_ADDED {
                signal.post();
            }
        }
    }
}

/// What wakes [`wait_for_pending`] between property reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStrategy {
    /// Wait for an ObjectAdded post, reading anyway after `fallback`.
    Events { fallback: Duration },
    /// Read every `interval`.
    Poll { interval: Duration },
}

impl Default for PendingStrategy {
    fn default() -> Self {
        PendingStrategy::Events {
            fallback: Duration::from_secs(1),
        }
    }
}

/// Anything that can report the pending-images word.
pub trait PendingSource {
    fn pending_status(&mut self) -> Result<PendingStatus>;
}

impl<P: PendingSource + ?Sized> PendingSource for &mut P {
    fn pending_status(&mut self) -> Result<PendingStatus> {
        (**self).pending_status()
    }
}

/// Block until at least one image is pending.
///
/// Returns [`ControlError::Stopped`] once `signal` is stopped; a stop is
/// noticed within one wait interval.
pub fn wait_for_pending<S: PendingSource>(
    mut source: S,
    signal: &CaptureSignal,
    strategy: PendingStrategy,
) -> Result<PendingStatus> {
    loop {
        if signal.is_stopped() {
            return Err(ControlError::Stopped);
        }
        let status = source.pending_status()?;
        if status.has_pending() {
            debug!(count = status.count, ready = status.ready, "images pending");
            return Ok(status);
        }
        let wake = match strategy {
            PendingStrategy::Events { fallback } => signal.wait(fallback),
            PendingStrategy::Poll { interval } => signal.pause(interval),
        };
        if wake == Wake::Stopped {
            return Err(ControlError::Stopped);
        }
    }
}
