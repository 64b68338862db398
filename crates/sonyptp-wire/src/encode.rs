use bytes::{BufMut, Bytes, BytesMut};

use crate::dataset::DescriptorLayout;
use crate::error::{Result, WireError};
use crate::value::{DataType, Scalar};

/// Longest string a 1-byte unit count can carry, terminator included.
pub const MAX_STRING_UNITS: usize = 255;

/// Form of a scalar descriptor to encode.
#[derive(Debug, Clone, Copy)]
pub enum FormSpec<'a> {
    None,
    Range { min: Scalar, max: Scalar, step: Scalar },
    Enum(&'a [Scalar]),
}

/// A scalar property descriptor to encode.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSpec<'a> {
    pub code: u16,
    pub writable: bool,
    pub factory_default: Scalar,
    pub current: Scalar,
    pub form: FormSpec<'a>,
}

/// Builds little-endian payloads for outbound data phases.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.put_u8(value);
        self
    }

    pub fn put_u16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16_le(value);
        self
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32_le(value);
        self
    }

    pub fn put_scalar(&mut self, value: &Scalar) -> &mut Self {
        value.put_le(&mut self.buf);
        self
    }

    /// Write a counted UTF-16 string. Non-empty strings carry a NUL unit
    /// that is included in the count.
    pub fn put_string(&mut self, value: &str) -> Result<&mut Self> {
        let units: Vec<u16> = value.encode_utf16().collect();
        if units.is_empty() {
            self.buf.put_u8(0);
            return Ok(self);
        }
        if units.len() + 1 > MAX_STRING_UNITS {
            return Err(WireError::PayloadTooLarge {
                size: units.len() * 2,
            });
        }
        self.buf.put_u8((units.len() + 1) as u8);
        for unit in units {
            self.buf.put_u16_le(unit);
        }
        self.buf.put_u16_le(0);
        Ok(self)
    }

    pub fn put_u16_array(&mut self, values: &[u16]) -> &mut Self {
        self.buf.put_u32_le(values.len() as u32);
        for &value in values {
            self.buf.put_u16_le(value);
        }
        self
    }

    pub fn put_array(&mut self, values: &[Scalar]) -> &mut Self {
        self.buf.put_u32_le(values.len() as u32);
        for value in values {
            value.put_le(&mut self.buf);
        }
        self
    }

    /// Write one scalar property descriptor.
    pub fn put_descriptor(&mut self, spec: &DescriptorSpec<'_>, layout: DescriptorLayout) -> &mut Self {
        let ty = DataType::Scalar(spec.current.scalar_type());
        self.put_u16(spec.code).put_u16(ty.code());
        self.put_u8(u8::from(spec.writable));
        if layout == DescriptorLayout::Vendor {
            self.put_u8(1);
        }
        self.put_scalar(&spec.factory_default)
            .put_scalar(&spec.current);
        match spec.form {
            FormSpec::None => {
                self.put_u8(0);
            }
            FormSpec::Range { min, max, step } => {
                self.put_u8(1)
                    .put_scalar(&min)
                    .put_scalar(&max)
                    .put_scalar(&step);
            }
            FormSpec::Enum(values) => {
                self.put_u8(2).put_u16(values.len() as u16);
                for value in values {
                    self.put_scalar(value);
                }
            }
        }
        self
    }

    /// Write a descriptor list in the vendor layout: count, reserved word,
    /// then each descriptor.
    pub fn put_descriptor_list(&mut self, specs: &[DescriptorSpec<'_>]) -> &mut Self {
        self.put_u32(specs.len() as u32).put_u32(0);
        for spec in specs {
            self.put_descriptor(spec, DescriptorLayout::Vendor);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}
