use crate::arena::Arena;
use crate::error::{Result, WireError};
use crate::value::{ArrayRef, DataType, PropertyValue, Scalar, ScalarType, StrRef};

macro_rules! int_readers {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self, field: &'static str) -> Result<$ty> {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(self.take(std::mem::size_of::<$ty>(), field)?);
                Ok(<$ty>::from_le_bytes(raw))
            }
        )*
    };
}

/// Cursor over a little-endian payload that stores variable-length fields
/// in an [`Arena`].
///
/// Every read names its field so a truncated payload reports exactly where
/// it ran out.
pub struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    arena: &'a mut Arena,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8], arena: &'a mut Arena) -> Self {
        Self {
            input,
            pos: 0,
            arena,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    pub fn arena(&self) -> &Arena {
        &*self.arena
    }

    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(WireError::Truncated {
                field,
                needed: n,
                remaining,
            });
        }
        let input: &'a [u8] = self.input;
        let bytes = &input[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize, field: &'static str) -> Result<()> {
        self.take(n, field).map(|_| ())
    }

    int_readers! {
        read_u8 => u8,
        read_i8 => i8,
        read_u16 => u16,
        read_i16 => i16,
        read_u32 => u32,
        read_i32 => i32,
        read_u64 => u64,
        read_i64 => i64,
        read_u128 => u128,
        read_i128 => i128,
    }

    /// Read one integer of the given type.
    pub fn scalar(&mut self, ty: ScalarType, field: &'static str) -> Result<Scalar> {
        Ok(match ty {
            ScalarType::Int8 => Scalar::Int8(self.read_i8(field)?),
            ScalarType::Uint8 => Scalar::Uint8(self.read_u8(field)?),
            ScalarType::Int16 => Scalar::Int16(self.read_i16(field)?),
            ScalarType::Uint16 => Scalar::Uint16(self.read_u16(field)?),
            ScalarType::Int32 => Scalar::Int32(self.read_i32(field)?),
            ScalarType::Uint32 => Scalar::Uint32(self.read_u32(field)?),
            ScalarType::Int64 => Scalar::Int64(self.read_i64(field)?),
            ScalarType::Uint64 => Scalar::Uint64(self.read_u64(field)?),
            ScalarType::Int128 => Scalar::Int128(self.read_i128(field)?),
            ScalarType::Uint128 => Scalar::Uint128(self.read_u128(field)?),
        })
    }

    /// Read a counted UTF-16 string: 1-byte unit count, then the units.
    ///
    /// A NUL unit is appended in the arena after the copied units.
    pub fn string(&mut self, field: &'static str) -> Result<StrRef> {
        let units = self.read_u8(field)?;
        let bytes = self.take(units as usize * 2, field)?;
        let span = self.arena.append_zeroed(bytes.len() + 2)?;
        if let Some(dst) = self.arena.slice_mut(span) {
            dst[..bytes.len()].copy_from_slice(bytes);
        }
        Ok(StrRef { span, units })
    }

    /// Read a counted array: 4-byte element count, then the elements.
    pub fn array(&mut self, elem: ScalarType, field: &'static str) -> Result<ArrayRef> {
        let count = self.read_u32(field)?;
        let needed = (count as usize)
            .checked_mul(elem.width())
            .unwrap_or(usize::MAX);
        let bytes = self.take(needed, field)?;
        let span = self.arena.append(bytes)?;
        ArrayRef::new(elem, count, span)
    }

    pub fn u16_array(&mut self, field: &'static str) -> Result<ArrayRef> {
        self.array(ScalarType::Uint16, field)
    }

    /// Read a value whose shape is given by `ty`.
    pub fn value(&mut self, ty: DataType, field: &'static str) -> Result<PropertyValue> {
        Ok(match ty {
            DataType::Scalar(elem) => PropertyValue::Scalar(self.scalar(elem, field)?),
            DataType::Array(elem) => PropertyValue::Array(self.array(elem, field)?),
            DataType::String => PropertyValue::Str(self.string(field)?),
        })
    }
}
