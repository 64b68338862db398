use std::fmt;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use sonyptp_transport::Endpoints;

use crate::error::{Result, WireError};

/// Container header: length (4) + type (2) + code (2) + transaction id (4).
pub const HEADER_SIZE: usize = 12;

/// Maximum parameters in a command, response or event container.
pub const MAX_PARAMS: usize = 5;

/// Largest parameter-carrying container.
pub const MAX_PARAM_CONTAINER: usize = HEADER_SIZE + 4 * MAX_PARAMS;

/// Default staging buffer for the first read of an inbound data phase.
pub const DEFAULT_STAGING_SIZE: usize = 512;

/// Container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ContainerType {
    Command = 1,
    Data = 2,
    Response = 3,
    Event = 4,
}

impl ContainerType {
    pub fn from_u16(raw: u16) -> Option<Self> {
        match raw {
            1 => Some(ContainerType::Command),
            2 => Some(ContainerType::Data),
            3 => Some(ContainerType::Response),
            4 => Some(ContainerType::Event),
            _ => None,
        }
    }
}

/// Up to five 32-bit parameters, stored inline.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Params {
    values: [u32; MAX_PARAMS],
    len: usize,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slice(values: &[u32]) -> Result<Self> {
        if values.len() > MAX_PARAMS {
            return Err(WireError::TooManyParams {
                count: values.len(),
            });
        }
        let mut params = Self::default();
        params.values[..values.len()].copy_from_slice(values);
        params.len = values.len();
        Ok(params)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.values[..self.len]
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.as_slice().get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.as_slice().iter().map(|p| format!("{p:#010x}")))
            .finish()
    }
}

/// The fixed 12-byte prefix of every container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub length: u32,
    pub kind: u16,
    pub code: u16,
    pub transaction_id: u32,
}

impl ContainerHeader {
    pub fn container_type(&self) -> Option<ContainerType> {
        ContainerType::from_u16(self.kind)
    }

    /// Declared payload length after the header.
    pub fn payload_len(&self) -> usize {
        (self.length as usize).saturating_sub(HEADER_SIZE)
    }
}

/// A decoded response container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub code: u16,
    pub transaction_id: u32,
    pub params: Params,
}

/// A decoded event container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub code: u16,
    pub transaction_id: u32,
    pub params: Params,
}

/// Configuration for container reads and writes.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Endpoint addresses. Default: 0x02 out, 0x81 in, 0x83 interrupt.
    pub endpoints: Endpoints,
    /// Size of the first read of an inbound data phase. Default: 512.
    pub staging_size: usize,
    /// Timeout for bulk IN reads. Writes never time out.
    pub read_timeout: Option<Duration>,
    /// How many zero-length reads to skip before giving up. Default: 16.
    pub zero_length_retries: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            staging_size: DEFAULT_STAGING_SIZE,
            read_timeout: Some(Duration::from_secs(5)),
            zero_length_retries: 16,
        }
    }
}

/// Encode a container that carries parameters (command, response, event).
///
/// Wire format (little-endian):
/// ```text
/// ┌────────────┬──────────┬──────────┬──────────────┬─────────────────┐
/// │ Length     │ Type     │ Code     │ Transaction  │ Params          │
/// │ (4B)       │ (2B)     │ (2B)     │ (4B)         │ (0-5 x 4B)      │
/// └────────────┴──────────┴──────────┴──────────────┴─────────────────┘
/// ```
pub fn encode_params(
    kind: ContainerType,
    code: u16,
    transaction_id: u32,
    params: &Params,
    dst: &mut BytesMut,
) {
    let length = HEADER_SIZE + 4 * params.len();
    dst.reserve(length);
    dst.put_u32_le(length as u32);
    dst.put_u16_le(kind as u16);
    dst.put_u16_le(code);
    dst.put_u32_le(transaction_id);
    for &param in params.as_slice() {
        dst.put_u32_le(param);
    }
}

/// Encode a command container.
pub fn encode_command(code: u16, transaction_id: u32, params: &Params, dst: &mut BytesMut) {
    encode_params(ContainerType::Command, code, transaction_id, params, dst);
}

/// Encode a data container: header followed by the opaque payload.
pub fn encode_data(code: u16, transaction_id: u32, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let length = HEADER_SIZE
        .checked_add(payload.len())
        .filter(|&len| len <= u32::MAX as usize)
        .ok_or(WireError::PayloadTooLarge {
            size: payload.len(),
        })?;
    dst.reserve(length);
    dst.put_u32_le(length as u32);
    dst.put_u16_le(ContainerType::Data as u16);
    dst.put_u16_le(code);
    dst.put_u32_le(transaction_id);
    dst.put_slice(payload);
    Ok(())
}

/// Decode the 12-byte header at the start of `src`.
pub fn decode_header(src: &[u8]) -> Result<ContainerHeader> {
    if src.len() < HEADER_SIZE {
        return Err(WireError::Length {
            declared: HEADER_SIZE,
            transferred: src.len(),
        });
    }
    Ok(ContainerHeader {
        length: u32::from_le_bytes([src[0], src[1], src[2], src[3]]),
        kind: u16::from_le_bytes([src[4], src[5]]),
        code: u16::from_le_bytes([src[6], src[7]]),
        transaction_id: u32::from_le_bytes([src[8], src[9], src[10], src[11]]),
    })
}

/// Decode the parameters following a header. Trailing partial words are ignored.
pub fn decode_params(body: &[u8]) -> Result<Params> {
    let count = body.len() / 4;
    if count > MAX_PARAMS {
        return Err(WireError::TooManyParams { count });
    }
    let mut params = Params::default();
    for (slot, word) in params.values.iter_mut().zip(body.chunks_exact(4)) {
        *slot = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
    }
    params.len = count;
    Ok(params)
}

/// Decode a complete event container as read from the interrupt endpoint.
pub fn decode_event(src: &[u8]) -> Result<Event> {
    let header = decode_header(src)?;
    if header.length as usize != src.len() {
        return Err(WireError::Length {
            declared: header.length as usize,
            transferred: src.len(),
        });
    }
    if header.kind != ContainerType::Event as u16 {
        return Err(WireError::ContainerType {
            expected: ContainerType::Event as u16,
            found: header.kind,
        });
    }
    Ok(Event {
        code: header.code,
        transaction_id: header.transaction_id,
        params: decode_params(&src[HEADER_SIZE..])?,
    })
}
