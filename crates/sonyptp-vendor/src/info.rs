use sonyptp_wire::{Arena, ArrayRef, Decoder, DECODE_ARENA_CAPACITY};

use crate::error::Result;

/// GetSDIOExtDeviceInfo dataset: the vendor properties and controls the
/// camera exposes in PC remote mode.
#[derive(Debug)]
pub struct ExtDeviceInfo {
    arena: Arena,
    pub version: u16,
    properties: ArrayRef,
    controls: ArrayRef,
}

impl ExtDeviceInfo {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut arena = Arena::with_capacity(DECODE_ARENA_CAPACITY);
        let mut d = Decoder::new(payload, &mut arena);
        let version = d.read_u16("extension version")?;
        let properties = d.u16_array("vendor properties")?;
        let controls = d.u16_array("vendor controls")?;
        Ok(Self {
            arena,
            version,
            properties,
            controls,
        })
    }

    /// Readable and settable property codes.
    pub fn properties(&self) -> Vec<u16> {
        self.properties
            .resolve_u16(&self.arena)
            .unwrap_or_default()
    }

    /// Codes accepted by SetControlDeviceB as button presses.
    pub fn controls(&self) -> Vec<u16> {
        self.controls
            .resolve_u16(&self.arena)
            .unwrap_or_default()
    }

    pub fn supports_property(&self, code: u16) -> bool {
        self.properties().contains(&code)
    }

    pub fn supports_control(&self, code: u16) -> bool {
        self.controls().contains(&code)
    }
}
