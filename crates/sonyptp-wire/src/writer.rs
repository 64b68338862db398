use std::sync::Arc;

use bytes::BytesMut;
use sonyptp_transport::{TransportError, UsbTransport};
use tracing::{debug, trace};

use crate::container::{encode_command, encode_data, ContainerConfig, Params};
use crate::error::{Result, WireError};

/// Attempts per outbound container. A stall clears the halt and retries once.
pub const SEND_ATTEMPTS: usize = 2;

/// Writes command and data containers to the device.
///
/// Each container goes out as a single bulk transfer with no timeout.
pub struct ContainerWriter<T> {
    transport: Arc<T>,
    buf: BytesMut,
    config: ContainerConfig,
}

impl<T: UsbTransport> ContainerWriter<T> {
    /// Create a writer with default configuration.
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_config(transport, ContainerConfig::default())
    }

    /// Create a writer with explicit configuration.
    pub fn with_config(transport: Arc<T>, config: ContainerConfig) -> Self {
        Self {
            transport,
            buf: BytesMut::new(),
            config,
        }
    }

    /// Send the command phase of a transaction.
    pub fn send_command(&mut self, code: u16, transaction_id: u32, params: &Params) -> Result<()> {
        self.buf.clear();
        encode_command(code, transaction_id, params, &mut self.buf);
        trace!(code, transaction_id, ?params, "command container");
        self.send()
    }

    /// Send an outbound data phase.
    pub fn send_data(&mut self, code: u16, transaction_id: u32, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_data(code, transaction_id, payload, &mut self.buf)?;
        trace!(code, transaction_id, len = payload.len(), "data container");
        self.send()
    }

    fn send(&mut self) -> Result<()> {
        let endpoint = self.config.endpoints.bulk_out;
        let mut attempt = 1;
        loop {
            match self.transport.bulk_write(endpoint, &self.buf, None) {
                Ok(written) if written == self.buf.len() => return Ok(()),
                Ok(written) => {
                    return Err(WireError::Length {
                        declared: self.buf.len(),
                        transferred: written,
                    })
                }
                Err(TransportError::Stall { endpoint: stalled }) => {
                    debug!(endpoint = stalled, attempt, "bulk out stalled, clearing halt");
                    self.transport.clear_halt(endpoint)?;
                    if attempt == SEND_ATTEMPTS {
                        return Err(TransportError::Stall { endpoint: stalled }.into());
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Borrow the transport.
    pub fn get_ref(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use sonyptp_transport::{Failure, ScriptedTransport, EP_BULK_OUT};

    use super::*;
    use crate::container::{decode_header, ContainerType, HEADER_SIZE};

    #[test]
    fn command_is_one_write() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut writer = ContainerWriter::new(Arc::clone(&transport));
        let params = Params::from_slice(&[1]).unwrap();
        writer.send_command(0x1002, 0, &params).unwrap();

        let writes = transport.writes();
        assert_eq!(writes.len(), 1);
        let header = decode_header(&writes[0]).unwrap();
        assert_eq!(header.length, 16);
        assert_eq!(header.container_type(), Some(ContainerType::Command));
    }

    #[test]
    fn data_follows_header_in_same_write() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut writer = ContainerWriter::new(Arc::clone(&transport));
        writer.send_data(0x9207, 4, &[1, 2, 3]).unwrap();

        let writes = transport.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(&writes[0][HEADER_SIZE..], &[1, 2, 3]);
    }

    #[test]
    fn stall_is_cleared_and_retried_once() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail_next_write(Failure::Stall);
        let mut writer = ContainerWriter::new(Arc::clone(&transport));
        writer.send_command(0x1001, 0, &Params::new()).unwrap();

        assert_eq!(transport.halts_cleared(), vec![EP_BULK_OUT]);
        assert_eq!(transport.writes().len(), 1);
    }

    #[test]
    fn second_stall_is_returned() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail_next_write(Failure::Stall);
        transport.fail_next_write(Failure::Stall);
        let mut writer = ContainerWriter::new(Arc::clone(&transport));

        let err = writer.send_command(0x1001, 0, &Params::new()).unwrap_err();
        assert!(matches!(
            err,
            WireError::Transport(TransportError::Stall { .. })
        ));
        assert_eq!(transport.halts_cleared().len(), 2);
        assert!(transport.writes().is_empty());
    }

    #[test]
    fn other_errors_are_not_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail_next_write(Failure::Io);
        let mut writer = ContainerWriter::new(Arc::clone(&transport));

        assert!(writer.send_command(0x1001, 0, &Params::new()).is_err());
        assert!(transport.halts_cleared().is_empty());
    }
}
