use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use sonyptp_transport::UsbTransport;
use sonyptp_wire::codes::{operation, response};
use sonyptp_wire::{ContainerReader, ContainerWriter, Event, Params, WireError, MAX_PARAMS};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::events::{EventCallback, EventPool};

/// Transaction id before the first transaction of a session. The first
/// transaction, OpenSession, therefore carries id 0.
pub const INITIAL_TRANSACTION_ID: u32 = u32::MAX;

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Active,
    /// A transaction failed. Only `close` is accepted.
    Failed,
}

/// Operation code and parameters of one transaction.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub code: u16,
    pub params: &'a [u32],
}

impl<'a> Request<'a> {
    pub fn new(code: u16) -> Self {
        Self { code, params: &[] }
    }

    pub fn with_params(code: u16, params: &'a [u32]) -> Self {
        Self { code, params }
    }
}

/// Direction and content of the optional data phase.
#[derive(Debug, Clone, Copy)]
pub enum DataPhase<'a> {
    None,
    /// Send this payload after the command.
    Out(&'a [u8]),
    /// Read a payload before the response.
    In,
}

/// Outcome of a successful transaction.
#[derive(Debug, Clone)]
pub struct Reply {
    pub code: u16,
    pub params: Params,
    /// Inbound payload, present only for [`DataPhase::In`].
    pub data: Option<Bytes>,
}

impl Reply {
    /// The inbound payload, or an empty buffer when there was none.
    pub fn into_data(self) -> Bytes {
        self.data.unwrap_or_default()
    }
}

/// A PTP session over one claimed USB interface.
///
/// One transaction runs at a time; the transaction id and staging buffer are
/// owned by the session. Any failure after a transaction has started leaves
/// the session [`Failed`](SessionState::Failed): close it and open again.
pub struct Session<T: UsbTransport + 'static> {
    transport: Arc<T>,
    reader: ContainerReader<T>,
    writer: ContainerWriter<T>,
    config: SessionConfig,
    state: SessionState,
    transaction_id: u32,
    callback: Option<EventCallback>,
    events: Option<EventPool<T>>,
}

impl<T: UsbTransport + 'static> Session<T> {
    /// Create a closed session with default configuration.
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    /// Create a closed session with explicit configuration.
    pub fn with_config(transport: Arc<T>, config: SessionConfig) -> Self {
        let container = config.container_config();
        Self {
            reader: ContainerReader::with_config(Arc::clone(&transport), container.clone()),
            writer: ContainerWriter::with_config(Arc::clone(&transport), container),
            transport,
            config,
            state: SessionState::Closed,
            transaction_id: INITIAL_TRANSACTION_ID,
            callback: None,
            events: None,
        }
    }

    /// Claim the interface, start event delivery if a callback is
    /// registered, and issue OpenSession.
    ///
    /// On failure everything acquired so far is released again and the
    /// session stays closed.
    pub fn open(&mut self) -> Result<()> {
        match self.state {
            SessionState::Closed => {}
            SessionState::Active => return Err(SessionError::AlreadyOpen),
            SessionState::Failed => return Err(SessionError::Poisoned),
        }

        self.transaction_id = INITIAL_TRANSACTION_ID;
        self.transport.claim_interface(self.config.interface)?;

        if let Some(callback) = &self.callback {
            match EventPool::start(Arc::clone(&self.transport), &self.config, Arc::clone(callback)) {
                Ok(pool) => self.events = Some(pool),
                Err(err) => {
                    self.release_interface();
                    return Err(err);
                }
            }
        }

        self.state = SessionState::Active;
        let session_id = self.config.session_id;
        if let Err(err) = self.transact(
            &Request::with_params(operation::OPEN_SESSION, &[session_id]),
            DataPhase::None,
        ) {
            self.stop_events();
            self.release_interface();
            self.state = SessionState::Closed;
            return Err(err);
        }

        info!(session_id, interface = self.config.interface, "session open");
        Ok(())
    }

    /// Best-effort CloseSession, synchronous event teardown, interface release.
    ///
    /// Closing a closed session does nothing. The session ends up closed even
    /// when teardown reports an error.
    pub fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }

        if self.state == SessionState::Active {
            if let Err(err) = self.transact(&Request::new(operation::CLOSE_SESSION), DataPhase::None) {
                warn!(%err, "CloseSession failed");
            }
        }

        let teardown = match self.events.take() {
            Some(mut pool) => pool.stop(),
            None => Ok(()),
        };
        self.release_interface();
        self.state = SessionState::Closed;
        info!(session_id = self.config.session_id, "session closed");
        teardown
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Id of the most recent transaction.
    pub fn transaction_id(&self) -> u32 {
        self.transaction_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Borrow the transport.
    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    /// Run one transaction: command, optional data phase, response.
    ///
    /// Too many parameters is rejected before the transaction id advances.
    /// Every later failure, including a non-OK response code, fails the
    /// session.
    pub fn transact(&mut self, request: &Request<'_>, phase: DataPhase<'_>) -> Result<Reply> {
        let params = Params::from_slice(request.params).map_err(|_| {
            SessionError::InvalidParams(format!(
                "{} parameters for operation {:#06x}, max {MAX_PARAMS}",
                request.params.len(),
                request.code
            ))
        })?;
        self.ensure_active()?;

        self.transaction_id = self.transaction_id.wrapping_add(1);
        let transaction_id = self.transaction_id;

        match self.exchange(request.code, transaction_id, &params, phase) {
            Ok(reply) => {
                debug!(
                    code = request.code,
                    transaction_id,
                    data = reply.data.as_ref().map(Bytes::len),
                    "transaction complete"
                );
                Ok(reply)
            }
            Err(err) => {
                warn!(code = request.code, transaction_id, %err, "transaction failed");
                self.state = SessionState::Failed;
                Err(err.into())
            }
        }
    }

    fn exchange(
        &mut self,
        code: u16,
        transaction_id: u32,
        params: &Params,
        phase: DataPhase<'_>,
    ) -> std::result::Result<Reply, WireError> {
        self.writer.send_command(code, transaction_id, params)?;
        let data = match phase {
            DataPhase::None => None,
            DataPhase::Out(payload) => {
                self.writer.send_data(code, transaction_id, payload)?;
                None
            }
            DataPhase::In => Some(self.reader.read_data(transaction_id)?),
        };
        let resp = self.reader.read_response(transaction_id)?;
        if resp.code != response::OK {
            return Err(WireError::response(resp.code));
        }
        Ok(Reply {
            code: resp.code,
            params: resp.params,
            data,
        })
    }

    /// Block for one event on the interrupt endpoint. `Ok(None)` on timeout.
    ///
    /// Not available while events are delivered to a callback.
    pub fn wait_event(&mut self, timeout: Option<Duration>) -> Result<Option<Event>> {
        if self.events.is_some() {
            return Err(SessionError::EventPoolActive);
        }
        self.ensure_active()?;
        match self.reader.read_event(timeout) {
            Ok(event) => Ok(event),
            Err(err) => {
                if err.is_protocol() {
                    warn!(%err, "malformed event");
                } else {
                    self.state = SessionState::Failed;
                }
                Err(err.into())
            }
        }
    }

    /// Deliver events to `callback` on the pump thread.
    ///
    /// Takes effect immediately on an open session, otherwise at the next
    /// `open`.
    pub fn register_event_callback(
        &mut self,
        callback: impl Fn(&Event) + Send + Sync + 'static,
    ) -> Result<()> {
        let callback: EventCallback = Arc::new(callback);
        self.callback = Some(Arc::clone(&callback));
        match &self.events {
            Some(pool) => pool.set_callback(callback),
            None if self.state == SessionState::Active => {
                self.events = Some(EventPool::start(
                    Arc::clone(&self.transport),
                    &self.config,
                    callback,
                )?);
            }
            None => {}
        }
        Ok(())
    }

    /// Stop callback delivery and return to synchronous `wait_event`.
    pub fn clear_event_callback(&mut self) -> Result<()> {
        self.callback = None;
        match self.events.take() {
            Some(mut pool) => pool.stop(),
            None => Ok(()),
        }
    }

    /// Event pool, while callback delivery is running.
    pub fn event_pool(&self) -> Option<&EventPool<T>> {
        self.events.as_ref()
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            SessionState::Active => Ok(()),
            SessionState::Closed => Err(SessionError::NotOpen),
            SessionState::Failed => Err(SessionError::Poisoned),
        }
    }

    fn stop_events(&mut self) {
        if let Some(mut pool) = self.events.take() {
            if let Err(err) = pool.stop() {
                warn!(%err, "event teardown failed");
            }
        }
    }

    fn release_interface(&self) {
        if let Err(err) = self.transport.release_interface(self.config.interface) {
            warn!(interface = self.config.interface, %err, "interface release failed");
        }
    }
}

impl<T: UsbTransport + 'static> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("transaction_id", &self.transaction_id)
            .field("session_id", &self.config.session_id)
            .field("events", &self.events.as_ref().map(EventPool::in_flight))
            .finish()
    }
}

impl<T: UsbTransport + 'static> Drop for Session<T> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            if let Err(err) = self.close() {
                warn!(%err, "session close on drop failed");
            }
        }
    }
}
