use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use sonyptp_transport::{IgnorePoison, UsbTransport};

use crate::error::{Result, SessionError};
use crate::session::Session;

struct Gate<T: UsbTransport + 'static> {
    slot: Mutex<Option<Session<T>>>,
    returned: Condvar,
}

/// A session shared between threads.
///
/// Callers take turns through a gate with a bounded wait, so a long
/// transaction on one thread cannot block a shutdown request on another
/// indefinitely.
pub struct SharedSession<T: UsbTransport + 'static> {
    gate: Arc<Gate<T>>,
}

impl<T: UsbTransport + 'static> Clone for SharedSession<T> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
        }
    }
}

/// Puts the session back into the gate even if the caller panics.
struct Lease<'a, T: UsbTransport + 'static> {
    gate: &'a Gate<T>,
    session: Option<Session<T>>,
}

impl<T: UsbTransport + 'static> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            *self.gate.slot.lock_ignore_poison() = Some(session);
            self.gate.returned.notify_one();
        }
    }
}

impl<T: UsbTransport + 'static> SharedSession<T> {
    pub fn new(session: Session<T>) -> Self {
        Self {
            gate: Arc::new(Gate {
                slot: Mutex::new(Some(session)),
                returned: Condvar::new(),
            }),
        }
    }

    /// Run `f` with exclusive use of the session, waiting at most `timeout`
    /// for another caller to finish.
    pub fn with_session<R>(
        &self,
        timeout: Duration,
        f: impl FnOnce(&mut Session<T>) -> Result<R>,
    ) -> Result<R> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.gate.slot.lock_ignore_poison();
        let session = loop {
            if let Some(session) = slot.take() {
                break session;
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(SessionError::Busy(timeout));
            }
            slot = self
                .gate
                .returned
                .wait_timeout(slot, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        };
        drop(slot);

        let mut lease = Lease {
            gate: &self.gate,
            session: Some(session),
        };
        match lease.session.as_mut() {
            Some(session) => f(session),
            None => Err(SessionError::NotOpen),
        }
    }

    /// Close the session, waiting at most `timeout` for the gate.
    pub fn close(&self, timeout: Duration) -> Result<()> {
        self.with_session(timeout, Session::close)
    }
}
