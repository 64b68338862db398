//! Typed property values.
//!
//! A 16-bit type code selects the shape of a value: one of ten integer
//! widths, a counted array of one of them (code | [`ARRAY_FLAG`]), or a
//! UTF-16 string ([`STRING_CODE`]). Scalars are held inline; arrays and
//! strings point into the owning [`Arena`].

use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::arena::{Arena, Span};
use crate::error::{Result, WireError};

/// Type code flag marking a counted array.
pub const ARRAY_FLAG: u16 = 0x4000;

/// Type code of a UTF-16 string.
pub const STRING_CODE: u16 = 0xFFFF;

/// Integer element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Int128,
    Uint128,
}

impl ScalarType {
    /// Wire type code.
    pub const fn code(self) -> u16 {
        match self {
            ScalarType::Int8 => 0x0001,
            ScalarType::Uint8 => 0x0002,
            ScalarType::Int16 => 0x0003,
            ScalarType::Uint16 => 0x0004,
            ScalarType::Int32 => 0x0005,
            ScalarType::Uint32 => 0x0006,
            ScalarType::Int64 => 0x0007,
            ScalarType::Uint64 => 0x0008,
            ScalarType::Int128 => 0x0009,
            ScalarType::Uint128 => 0x000A,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0x0001 => ScalarType::Int8,
            0x0002 => ScalarType::Uint8,
            0x0003 => ScalarType::Int16,
            0x0004 => ScalarType::Uint16,
            0x0005 => ScalarType::Int32,
            0x0006 => ScalarType::Uint32,
            0x0007 => ScalarType::Int64,
            0x0008 => ScalarType::Uint64,
            0x0009 => ScalarType::Int128,
            0x000A => ScalarType::Uint128,
            _ => return None,
        })
    }

    /// Encoded width in bytes.
    pub const fn width(self) -> usize {
        match self {
            ScalarType::Int8 | ScalarType::Uint8 => 1,
            ScalarType::Int16 | ScalarType::Uint16 => 2,
            ScalarType::Int32 | ScalarType::Uint32 => 4,
            ScalarType::Int64 | ScalarType::Uint64 => 8,
            ScalarType::Int128 | ScalarType::Uint128 => 16,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            ScalarType::Int8
                | ScalarType::Int16
                | ScalarType::Int32
                | ScalarType::Int64
                | ScalarType::Int128
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Int8 => "INT8",
            ScalarType::Uint8 => "UINT8",
            ScalarType::Int16 => "INT16",
            ScalarType::Uint16 => "UINT16",
            ScalarType::Int32 => "INT32",
            ScalarType::Uint32 => "UINT32",
            ScalarType::Int64 => "INT64",
            ScalarType::Uint64 => "UINT64",
            ScalarType::Int128 => "INT128",
            ScalarType::Uint128 => "UINT128",
        }
    }

    /// Read one little-endian element. `bytes` must be exactly `width()` long.
    pub(crate) fn read_le(self, bytes: &[u8]) -> Option<Scalar> {
        fn arr<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
            bytes.try_into().ok()
        }
        Some(match self {
            ScalarType::Int8 => Scalar::Int8(i8::from_le_bytes(arr(bytes)?)),
            ScalarType::Uint8 => Scalar::Uint8(u8::from_le_bytes(arr(bytes)?)),
            ScalarType::Int16 => Scalar::Int16(i16::from_le_bytes(arr(bytes)?)),
            ScalarType::Uint16 => Scalar::Uint16(u16::from_le_bytes(arr(bytes)?)),
            ScalarType::Int32 => Scalar::Int32(i32::from_le_bytes(arr(bytes)?)),
            ScalarType::Uint32 => Scalar::Uint32(u32::from_le_bytes(arr(bytes)?)),
            ScalarType::Int64 => Scalar::Int64(i64::from_le_bytes(arr(bytes)?)),
            ScalarType::Uint64 => Scalar::Uint64(u64::from_le_bytes(arr(bytes)?)),
            ScalarType::Int128 => Scalar::Int128(i128::from_le_bytes(arr(bytes)?)),
            ScalarType::Uint128 => Scalar::Uint128(u128::from_le_bytes(arr(bytes)?)),
        })
    }
}

/// Shape of a property value, derived from its type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    Scalar(ScalarType),
    Array(ScalarType),
    String,
}

impl DataType {
    pub fn from_code(code: u16) -> Result<Self> {
        if code == STRING_CODE {
            return Ok(DataType::String);
        }
        let (elem, array) = if code & ARRAY_FLAG != 0 {
            (code & !ARRAY_FLAG, true)
        } else {
            (code, false)
        };
        let elem = ScalarType::from_code(elem).ok_or(WireError::UnsupportedType { code })?;
        Ok(if array {
            DataType::Array(elem)
        } else {
            DataType::Scalar(elem)
        })
    }

    pub fn code(self) -> u16 {
        match self {
            DataType::Scalar(elem) => elem.code(),
            DataType::Array(elem) => elem.code() | ARRAY_FLAG,
            DataType::String => STRING_CODE,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Scalar(elem) => f.write_str(elem.name()),
            DataType::Array(elem) => write!(f, "A{}", elem.name()),
            DataType::String => f.write_str("STRING"),
        }
    }
}

/// One integer of any supported width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scalar {
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Int128(i128),
    Uint128(u128),
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::Int8(_) => ScalarType::Int8,
            Scalar::Uint8(_) => ScalarType::Uint8,
            Scalar::Int16(_) => ScalarType::Int16,
            Scalar::Uint16(_) => ScalarType::Uint16,
            Scalar::Int32(_) => ScalarType::Int32,
            Scalar::Uint32(_) => ScalarType::Uint32,
            Scalar::Int64(_) => ScalarType::Int64,
            Scalar::Uint64(_) => ScalarType::Uint64,
            Scalar::Int128(_) => ScalarType::Int128,
            Scalar::Uint128(_) => ScalarType::Uint128,
        }
    }

    /// Widen to `i128`. Only `Uint128` values above `i128::MAX` fail.
    pub fn to_i128(&self) -> Option<i128> {
        Some(match *self {
            Scalar::Int8(v) => v.into(),
            Scalar::Uint8(v) => v.into(),
            Scalar::Int16(v) => v.into(),
            Scalar::Uint16(v) => v.into(),
            Scalar::Int32(v) => v.into(),
            Scalar::Uint32(v) => v.into(),
            Scalar::Int64(v) => v.into(),
            Scalar::Uint64(v) => v.into(),
            Scalar::Int128(v) => v,
            Scalar::Uint128(v) => i128::try_from(v).ok()?,
        })
    }

    /// Build a scalar of type `ty` from `value`, if it fits.
    pub fn from_i128(ty: ScalarType, value: i128) -> Option<Self> {
        Some(match ty {
            ScalarType::Int8 => Scalar::Int8(value.try_into().ok()?),
            ScalarType::Uint8 => Scalar::Uint8(value.try_into().ok()?),
            ScalarType::Int16 => Scalar::Int16(value.try_into().ok()?),
            ScalarType::Uint16 => Scalar::Uint16(value.try_into().ok()?),
            ScalarType::Int32 => Scalar::Int32(value.try_into().ok()?),
            ScalarType::Uint32 => Scalar::Uint32(value.try_into().ok()?),
            ScalarType::Int64 => Scalar::Int64(value.try_into().ok()?),
            ScalarType::Uint64 => Scalar::Uint64(value.try_into().ok()?),
            ScalarType::Int128 => Scalar::Int128(value),
            ScalarType::Uint128 => Scalar::Uint128(value.try_into().ok()?),
        })
    }

    pub fn as_u16(&self) -> Option<u16> {
        match *self {
            Scalar::Uint16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Scalar::Uint32(v) => Some(v),
            _ => None,
        }
    }

    /// Append the little-endian encoding to `dst`.
    pub fn put_le(&self, dst: &mut BytesMut) {
        match *self {
            Scalar::Int8(v) => dst.put_i8(v),
            Scalar::Uint8(v) => dst.put_u8(v),
            Scalar::Int16(v) => dst.put_i16_le(v),
            Scalar::Uint16(v) => dst.put_u16_le(v),
            Scalar::Int32(v) => dst.put_i32_le(v),
            Scalar::Uint32(v) => dst.put_u32_le(v),
            Scalar::Int64(v) => dst.put_i64_le(v),
            Scalar::Uint64(v) => dst.put_u64_le(v),
            Scalar::Int128(v) => dst.put_i128_le(v),
            Scalar::Uint128(v) => dst.put_u128_le(v),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Scalar::Int8(v) => write!(f, "{v}"),
            Scalar::Uint8(v) => write!(f, "{v} ({v:02X}h)"),
            Scalar::Int16(v) => write!(f, "{v}"),
            Scalar::Uint16(v) => write!(f, "{v} ({v:04X}h)"),
            Scalar::Int32(v) => write!(f, "{v}"),
            Scalar::Uint32(v) => write!(f, "{v} ({v:08X}h)"),
            Scalar::Int64(v) => write!(f, "{v}"),
            Scalar::Uint64(v) => write!(f, "{v} ({v:016X}h)"),
            Scalar::Int128(v) => write!(f, "{v}"),
            Scalar::Uint128(v) => write!(f, "{v} ({v:032X}h)"),
        }
    }
}

/// A counted UTF-16 string stored in an arena.
///
/// `span` covers the code units plus one appended NUL unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrRef {
    pub span: Span,
    pub units: u8,
}

impl StrRef {
    /// Decode the string, dropping any NUL terminators. `None` if the span
    /// does not lie inside `arena`.
    pub fn resolve(&self, arena: &Arena) -> Option<String> {
        let units = self.code_units(arena)?;
        let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
        Some(
            char::decode_utf16(units[..end].iter().copied())
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
        )
    }

    /// Raw code units, without the appended terminator.
    pub fn code_units(&self, arena: &Arena) -> Option<Vec<u16>> {
        Some(
            arena
                .slice(self.span)?
                .chunks_exact(2)
                .take(self.units as usize)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        )
    }
}

/// A counted array of little-endian elements stored in an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayRef {
    pub elem: ScalarType,
    pub count: u32,
    pub span: Span,
}

impl ArrayRef {
    /// Build a reference, checking that the span matches `count` elements.
    pub fn new(elem: ScalarType, count: u32, span: Span) -> Result<Self> {
        let expected = (count as usize).checked_mul(elem.width());
        if expected != Some(span.len) {
            return Err(WireError::Length {
                declared: expected.unwrap_or(usize::MAX),
                transferred: span.len,
            });
        }
        Ok(Self { elem, count, span })
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The elements, or `None` if the span does not lie inside `arena`.
    pub fn resolve(&self, arena: &Arena) -> Option<Vec<Scalar>> {
        Some(
            arena
                .slice(self.span)?
                .chunks_exact(self.elem.width())
                .filter_map(|chunk| self.elem.read_le(chunk))
                .collect(),
        )
    }

    /// Elements as `u16`. `None` for any other element type or a span
    /// outside `arena`.
    pub fn resolve_u16(&self, arena: &Arena) -> Option<Vec<u16>> {
        if self.elem != ScalarType::Uint16 {
            return None;
        }
        Some(
            arena
                .slice(self.span)?
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        )
    }
}

/// A decoded value whose shape follows its type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyValue {
    Scalar(Scalar),
    Array(ArrayRef),
    Str(StrRef),
}

impl PropertyValue {
    pub fn data_type(&self) -> DataType {
        match self {
            PropertyValue::Scalar(v) => DataType::Scalar(v.scalar_type()),
            PropertyValue::Array(a) => DataType::Array(a.elem),
            PropertyValue::Str(_) => DataType::String,
        }
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            PropertyValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Render the value for display, resolving arena parts.
    pub fn display(&self, arena: &Arena) -> Option<String> {
        Some(match self {
            PropertyValue::Scalar(v) => v.to_string(),
            PropertyValue::Array(a) => {
                let items: Vec<String> =
                    a.resolve(arena)?.iter().map(|v| v.to_string()).collect();
                format!("[{}]", items.join(", "))
            }
            PropertyValue::Str(s) => format!("\"{}\"", s.resolve(arena)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_map_to_shapes() {
        assert_eq!(
            DataType::from_code(0x0004).unwrap(),
            DataType::Scalar(ScalarType::Uint16)
        );
        assert_eq!(
            DataType::from_code(0x4006).unwrap(),
            DataType::Array(ScalarType::Uint32)
        );
        assert_eq!(DataType::from_code(0xFFFF).unwrap(), DataType::String);
        assert!(matches!(
            DataType::from_code(0x000B),
            Err(WireError::UnsupportedType { code: 0x000B })
        ));
        assert!(matches!(
            DataType::from_code(0x0000),
            Err(WireError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn codes_survive_the_table() {
        for code in 1..=0x0Au16 {
            let ty = ScalarType::from_code(code).unwrap();
            assert_eq!(ty.code(), code);
            assert_eq!(DataType::Array(ty).code(), code | ARRAY_FLAG);
        }
    }

    #[test]
    fn widths_follow_type() {
        assert_eq!(ScalarType::Int8.width(), 1);
        assert_eq!(ScalarType::Uint16.width(), 2);
        assert_eq!(ScalarType::Int32.width(), 4);
        assert_eq!(ScalarType::Uint64.width(), 8);
        assert_eq!(ScalarType::Uint128.width(), 16);
    }

    #[test]
    fn widening_handles_extremes() {
        assert_eq!(Scalar::Int8(-5).to_i128(), Some(-5));
        assert_eq!(Scalar::Uint64(u64::MAX).to_i128(), Some(u64::MAX as i128));
        assert_eq!(Scalar::Uint128(u128::MAX).to_i128(), None);
        assert_eq!(
            Scalar::from_i128(ScalarType::Uint16, 0x1_0000),
            None
        );
        assert_eq!(
            Scalar::from_i128(ScalarType::Int16, -2),
            Some(Scalar::Int16(-2))
        );
    }

    #[test]
    fn array_ref_rejects_mismatched_span() {
        assert!(ArrayRef::new(ScalarType::Uint32, 2, Span::new(0, 8)).is_ok());
        assert!(matches!(
            ArrayRef::new(ScalarType::Uint32, 2, Span::new(0, 6)),
            Err(WireError::Length { .. })
        ));
    }

    #[test]
    fn string_resolves_without_terminator() {
        let mut arena = Arena::with_capacity(0);
        let mut raw = Vec::new();
        for unit in "Sony".encode_utf16().chain([0, 0]) {
            raw.extend_from_slice(&unit.to_le_bytes());
        }
        let span = arena.append(&raw).unwrap();
        let s = StrRef { span, units: 5 };
        assert_eq!(s.resolve(&arena).as_deref(), Some("Sony"));
        assert_eq!(s.code_units(&arena).map(|u| u.len()), Some(5));
    }

    #[test]
    fn span_from_another_arena_does_not_resolve() {
        let mut big = Arena::with_capacity(0);
        big.append(&[0; 32]).unwrap();
        let span = big.append(&[1, 0, 2, 0]).unwrap();
        let s = StrRef { span, units: 2 };
        let a = ArrayRef::new(ScalarType::Uint16, 2, span).unwrap();

        let small = Arena::with_capacity(0);
        assert_eq!(s.resolve(&small), None);
        assert_eq!(a.resolve_u16(&small), None);
        assert_eq!(PropertyValue::Array(a).display(&small), None);
        assert_eq!(a.resolve_u16(&big), Some(vec![1, 2]));
    }

    #[test]
    fn wrong_element_type_does_not_resolve_as_u16() {
        let mut arena = Arena::with_capacity(0);
        let span = arena.append(&[1, 0, 0, 0]).unwrap();
        let a = ArrayRef::new(ScalarType::Uint32, 1, span).unwrap();
        assert_eq!(a.resolve_u16(&arena), None);
        assert_eq!(a.resolve(&arena), Some(vec![Scalar::Uint32(1)]));
    }
}
