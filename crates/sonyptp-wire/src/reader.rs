use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use sonyptp_transport::{TransportError, UsbTransport};
use tracing::{trace, warn};

use crate::container::{
    decode_event, decode_header, decode_params, ContainerConfig, ContainerHeader, ContainerType,
    Event, Response, HEADER_SIZE, MAX_PARAM_CONTAINER,
};
use crate::error::{ArenaError, Result, WireError};

/// Reads response, data and event containers from the device.
///
/// Inbound data arrives through a fixed staging buffer. When a container is
/// larger than one staging read, the remainder is read straight into the
/// final payload buffer.
pub struct ContainerReader<T> {
    transport: Arc<T>,
    staging: Vec<u8>,
    config: ContainerConfig,
}

/// Bytes landed by one logical bulk read, and whether it ended in a timeout.
struct BulkRead {
    len: usize,
    timed_out: bool,
}

impl<T: UsbTransport> ContainerReader<T> {
    /// Create a reader with default configuration.
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_config(transport, ContainerConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(transport: Arc<T>, config: ContainerConfig) -> Self {
        let staging = vec![0u8; config.staging_size.max(MAX_PARAM_CONTAINER)];
        Self {
            transport,
            staging,
            config,
        }
    }

    fn bulk_in(transport: &T, config: &ContainerConfig, buf: &mut [u8]) -> Result<BulkRead> {
        let endpoint = config.endpoints.bulk_in;
        let mut empty_reads = 0usize;
        loop {
            match transport.bulk_read(endpoint, buf, config.read_timeout) {
                Ok(0) if empty_reads < config.zero_length_retries => {
                    empty_reads += 1;
                    warn!(endpoint, empty_reads, "zero-length packet, reading again");
                }
                Ok(len) => {
                    return Ok(BulkRead {
                        len,
                        timed_out: false,
                    })
                }
                Err(TransportError::Timeout { transferred }) if transferred > 0 => {
                    warn!(endpoint, transferred, "bulk read timed out with data");
                    return Ok(BulkRead {
                        len: transferred,
                        timed_out: true,
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// A short read is a timeout if the transport said so, else a length error.
    fn short_read(read: &BulkRead, declared: usize) -> WireError {
        if read.timed_out {
            WireError::Transport(TransportError::Timeout {
                transferred: read.len,
            })
        } else {
            WireError::Length {
                declared,
                transferred: read.len,
            }
        }
    }

    fn check_header(
        header: &ContainerHeader,
        expected: ContainerType,
        transaction_id: u32,
    ) -> Result<()> {
        if header.transaction_id != transaction_id {
            return Err(WireError::TransactionId {
                expected: transaction_id,
                found: header.transaction_id,
            });
        }
        if header.kind != expected as u16 {
            return Err(WireError::ContainerType {
                expected: expected as u16,
                found: header.kind,
            });
        }
        Ok(())
    }

    /// Read the data phase of transaction `transaction_id`.
    pub fn read_data(&mut self, transaction_id: u32) -> Result<Bytes> {
        let first = Self::bulk_in(&self.transport, &self.config, &mut self.staging)?;
        if first.len < HEADER_SIZE {
            return Err(Self::short_read(&first, HEADER_SIZE));
        }
        let header = decode_header(&self.staging[..first.len])?;
        trace!(?header, "data container");

        let declared = header.length as usize;
        if declared < HEADER_SIZE || declared < first.len {
            return Err(WireError::Length {
                declared,
                transferred: first.len,
            });
        }
        if declared > first.len && first.len < self.staging.len() {
            // The device ended the transfer before the declared length.
            return Err(Self::short_read(&first, declared));
        }
        Self::check_header(&header, ContainerType::Data, transaction_id)?;

        let payload_len = declared - HEADER_SIZE;
        let mut payload = Vec::new();
        payload
            .try_reserve_exact(payload_len)
            .map_err(|_| ArenaError::Alloc {
                requested: payload_len,
            })?;
        payload.extend_from_slice(&self.staging[HEADER_SIZE..first.len]);

        if declared > first.len {
            let remaining = declared - first.len;
            let start = payload.len();
            payload.resize(payload_len, 0);
            let second = Self::bulk_in(&self.transport, &self.config, &mut payload[start..])?;
            if second.len != remaining {
                return Err(Self::short_read(&second, remaining));
            }
        }

        Ok(Bytes::from(payload))
    }

    /// Read the response phase of transaction `transaction_id`.
    ///
    /// The response code is returned as-is; judging it is up to the caller.
    pub fn read_response(&mut self, transaction_id: u32) -> Result<Response> {
        let buf = &mut self.staging[..MAX_PARAM_CONTAINER];
        let read = Self::bulk_in(&self.transport, &self.config, buf)?;
        if read.len < HEADER_SIZE {
            return Err(Self::short_read(&read, HEADER_SIZE));
        }
        let header = decode_header(&buf[..read.len])?;
        trace!(?header, "response container");

        if header.length as usize != read.len {
            return Err(Self::short_read(&read, header.length as usize));
        }
        Self::check_header(&header, ContainerType::Response, transaction_id)?;

        Ok(Response {
            code: header.code,
            transaction_id: header.transaction_id,
            params: decode_params(&buf[HEADER_SIZE..read.len])?,
        })
    }

    /// Block on the interrupt endpoint for one event. `Ok(None)` on timeout.
    pub fn read_event(&mut self, timeout: Option<Duration>) -> Result<Option<Event>> {
        let endpoint = self.config.endpoints.interrupt_in;
        let buf = &mut self.staging[..MAX_PARAM_CONTAINER];
        let len = match self.transport.interrupt_read(endpoint, buf, timeout) {
            Ok(len) => len,
            Err(TransportError::Timeout { transferred: 0 }) => return Ok(None),
            Err(TransportError::Timeout { transferred }) => transferred,
            Err(err) => return Err(err.into()),
        };
        decode_event(&buf[..len]).map(Some)
    }

    /// Borrow the transport.
    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    /// Current reader configuration.
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }
}
