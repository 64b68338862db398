//! Fixed-order PTP datasets.
//!
//! Each decoded record owns one [`Arena`] holding all of its strings and
//! arrays; the record itself keeps only offsets. Decoding is all-or-nothing:
//! on any error the arena is dropped and no record is returned.

use crate::arena::Arena;
use crate::decode::Decoder;
use crate::error::{Result, WireError};
use crate::value::{ArrayRef, DataType, PropertyValue, Scalar, StrRef};

/// Starting size of a per-record decode arena.
pub const DECODE_ARENA_CAPACITY: usize = 64;

/// GetDeviceInfo dataset.
///
/// Strings and arrays are spans into the private arena, so the accessors
/// always resolve.
#[derive(Debug)]
pub struct DeviceInfo {
    arena: Arena,
    pub standard_version: u16,
    pub vendor_extension_id: u32,
    pub vendor_extension_version: u16,
    vendor_extension_desc: StrRef,
    pub functional_mode: u16,
    operations: ArrayRef,
    events: ArrayRef,
    properties: ArrayRef,
    capture_formats: ArrayRef,
    image_formats: ArrayRef,
    manufacturer: StrRef,
    model: StrRef,
    device_version: StrRef,
    serial_number: StrRef,
}

impl DeviceInfo {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut arena = Arena::with_capacity(DECODE_ARENA_CAPACITY);
        let mut d = Decoder::new(payload, &mut arena);

        let standard_version = d.read_u16("standard version")?;
        let vendor_extension_id = d.read_u32("vendor extension id")?;
        let vendor_extension_version = d.read_u16("vendor extension version")?;
        let vendor_extension_desc = d.string("vendor extension description")?;
        let functional_mode = d.read_u16("functional mode")?;
        let operations = d.u16_array("operations supported")?;
        let events = d.u16_array("events supported")?;
        let properties = d.u16_array("device properties supported")?;
        let capture_formats = d.u16_array("capture formats")?;
        let image_formats = d.u16_array("image formats")?;
        let manufacturer = d.string("manufacturer")?;
        let model = d.string("model")?;
        let device_version = d.string("device version")?;
        let serial_number = d.string("serial number")?;

        Ok(Self {
            arena,
            standard_version,
            vendor_extension_id,
            vendor_extension_version,
            vendor_extension_desc,
            functional_mode,
            operations,
            events,
            properties,
            capture_formats,
            image_formats,
            manufacturer,
            model,
            device_version,
            serial_number,
        })
    }

    pub fn vendor_extension_desc(&self) -> String {
        self.vendor_extension_desc
            .resolve(&self.arena)
            .unwrap_or_default()
    }

    pub fn operations(&self) -> Vec<u16> {
        self.operations
            .resolve_u16(&self.arena)
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<u16> {
        self.events
            .resolve_u16(&self.arena)
            .unwrap_or_default()
    }

    pub fn properties(&self) -> Vec<u16> {
        self.properties
            .resolve_u16(&self.arena)
            .unwrap_or_default()
    }

    pub fn capture_formats(&self) -> Vec<u16> {
        self.capture_formats
            .resolve_u16(&self.arena)
            .unwrap_or_default()
    }

    pub fn image_formats(&self) -> Vec<u16> {
        self.image_formats
            .resolve_u16(&self.arena)
            .unwrap_or_default()
    }

    pub fn manufacturer(&self) -> String {
        self.manufacturer
            .resolve(&self.arena)
            .unwrap_or_default()
    }

    pub fn model(&self) -> String {
        self.model
            .resolve(&self.arena)
            .unwrap_or_default()
    }

    pub fn device_version(&self) -> String {
        self.device_version
            .resolve(&self.arena)
            .unwrap_or_default()
    }

    pub fn serial_number(&self) -> String {
        self.serial_number
            .resolve(&self.arena)
            .unwrap_or_default()
    }

    pub fn supports_operation(&self, code: u16) -> bool {
        self.operations().contains(&code)
    }

    pub fn supports_property(&self, code: u16) -> bool {
        self.properties().contains(&code)
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }
}

/// GetObjectInfo dataset. Like [`DeviceInfo`], its strings resolve
/// against the arena it owns.
#[derive(Debug)]
pub struct ObjectInfo {
    arena: Arena,
    pub storage_id: u32,
    pub object_format: u16,
    pub protection_status: u16,
    pub compressed_size: u32,
    pub thumb_format: u16,
    pub thumb_compressed_size: u32,
    pub thumb_width: u32,
    pub thumb_height: u32,
    pub image_width: u32,
    pub image_height: u32,
    pub image_bit_depth: u32,
    pub parent_object: u32,
    pub association_type: u16,
    pub association_desc: u32,
    pub sequence_number: u32,
    filename: StrRef,
    capture_date: StrRef,
    modification_date: StrRef,
    keywords: StrRef,
}

impl ObjectInfo {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut arena = Arena::with_capacity(DECODE_ARENA_CAPACITY);
        let mut d = Decoder::new(payload, &mut arena);

        let storage_id = d.read_u32("storage id")?;
        let object_format = d.read_u16("object format")?;
        let protection_status = d.read_u16("protection status")?;
        let compressed_size = d.read_u32("compressed size")?;
        let thumb_format = d.read_u16("thumb format")?;
        let thumb_compressed_size = d.read_u32("thumb compressed size")?;
        let thumb_width = d.read_u32("thumb width")?;
        let thumb_height = d.read_u32("thumb height")?;
        let image_width = d.read_u32("image width")?;
        let image_height = d.read_u32("image height")?;
        let image_bit_depth = d.read_u32("image bit depth")?;
        let parent_object = d.read_u32("parent object")?;
        let association_type = d.read_u16("association type")?;
        let association_desc = d.read_u32("association description")?;
        let sequence_number = d.read_u32("sequence number")?;
        let filename = d.string("filename")?;
        let capture_date = d.string("capture date")?;
        let modification_date = d.string("modification date")?;
        let keywords = d.string("keywords")?;

        Ok(Self {
            arena,
            storage_id,
            object_format,
            protection_status,
            compressed_size,
            thumb_format,
            thumb_compressed_size,
            thumb_width,
            thumb_height,
            image_width,
            image_height,
            image_bit_depth,
            parent_object,
            association_type,
            association_desc,
            sequence_number,
            filename,
            capture_date,
            modification_date,
            keywords,
        })
    }

    pub fn filename(&self) -> String {
        self.filename
            .resolve(&self.arena)
            .unwrap_or_default()
    }

    pub fn capture_date(&self) -> String {
        self.capture_date
            .resolve(&self.arena)
            .unwrap_or_default()
    }

    pub fn modification_date(&self) -> String {
        self.modification_date
            .resolve(&self.arena)
            .unwrap_or_default()
    }

    pub fn keywords(&self) -> String {
        self.keywords
            .resolve(&self.arena)
            .unwrap_or_default()
    }
}

/// Descriptor wire layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorLayout {
    /// PIMA GetDevicePropDesc: one descriptor.
    Standard,
    /// Vendor bulk property data: a count and a reserved word, then
    /// descriptors carrying one extra byte after the get/set flag.
    Vendor,
}

/// Allowed values of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Form {
    None,
    Range {
        min: PropertyValue,
        max: PropertyValue,
        step: PropertyValue,
    },
    Enum(Vec<PropertyValue>),
}

/// One device property: metadata plus factory default and current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub code: u16,
    pub data_type: DataType,
    pub writable: bool,
    /// The extra vendor byte, absent in the standard layout.
    pub reserved: Option<u8>,
    pub factory_default: PropertyValue,
    pub current: PropertyValue,
    pub form: Form,
}

impl PropertyDescriptor {
    /// Current value if it is a scalar.
    pub fn current_scalar(&self) -> Option<Scalar> {
        self.current.as_scalar()
    }

    /// Scalar enum values, if the form is an enumeration.
    pub fn enum_scalars(&self) -> Option<Vec<Scalar>> {
        match &self.form {
            Form::Enum(values) => Some(values.iter().filter_map(|v| v.as_scalar()).collect()),
            _ => None,
        }
    }
}

fn decode_descriptor(d: &mut Decoder<'_>, layout: DescriptorLayout) -> Result<PropertyDescriptor> {
    let code = d.read_u16("property code")?;
    let data_type = DataType::from_code(d.read_u16("data type")?)?;
    let writable = d.read_u8("get/set flag")? != 0;
    let reserved = match layout {
        DescriptorLayout::Standard => None,
        DescriptorLayout::Vendor => Some(d.read_u8("reserved")?),
    };
    let factory_default = d.value(data_type, "factory default")?;
    let current = d.value(data_type, "current value")?;

    let form = match d.read_u8("form flag")? {
        0 => Form::None,
        1 => Form::Range {
            min: d.value(data_type, "range minimum")?,
            max: d.value(data_type, "range maximum")?,
            step: d.value(data_type, "range step")?,
        },
        2 => {
            let count = d.read_u16("enum count")?;
            let mut values = Vec::new();
            for _ in 0..count {
                values.push(d.value(data_type, "enum value")?);
            }
            Form::Enum(values)
        }
        flag => return Err(WireError::UnknownForm { flag }),
    };

    Ok(PropertyDescriptor {
        code,
        data_type,
        writable,
        reserved,
        factory_default,
        current,
        form,
    })
}

/// A set of property descriptors sharing one arena.
///
/// [`refill`](Self::refill) reuses the arena's capacity, so polling the same
/// device repeatedly does not reallocate.
#[derive(Debug)]
pub struct PropertyList {
    arena: Arena,
    descriptors: Vec<PropertyDescriptor>,
}

impl Default for PropertyList {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyList {
    pub fn new() -> Self {
        Self {
            arena: Arena::with_capacity(DECODE_ARENA_CAPACITY),
            descriptors: Vec::new(),
        }
    }

    pub fn decode(payload: &[u8], layout: DescriptorLayout) -> Result<Self> {
        let mut list = Self::new();
        list.refill(payload, layout)?;
        Ok(list)
    }

    /// Replace the contents with a fresh decode. Empty on error.
    pub fn refill(&mut self, payload: &[u8], layout: DescriptorLayout) -> Result<()> {
        self.arena.clear();
        self.descriptors.clear();
        let result = Self::decode_into(payload, layout, &mut self.arena, &mut self.descriptors);
        if result.is_err() {
            self.arena.clear();
            self.descriptors.clear();
        }
        result
    }

    fn decode_into(
        payload: &[u8],
        layout: DescriptorLayout,
        arena: &mut Arena,
        out: &mut Vec<PropertyDescriptor>,
    ) -> Result<()> {
        let mut d = Decoder::new(payload, arena);
        match layout {
            DescriptorLayout::Standard => out.push(decode_descriptor(&mut d, layout)?),
            DescriptorLayout::Vendor => {
                let count = d.read_u32("descriptor count")?;
                d.skip(4, "descriptor list reserved")?;
                for _ in 0..count {
                    out.push(decode_descriptor(&mut d, layout)?);
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, code: u16) -> Option<&PropertyDescriptor> {
        self.descriptors.iter().find(|p| p.code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Render a descriptor's current value for display.
    pub fn display_current(&self, code: u16) -> Option<String> {
        self.get(code).and_then(|p| p.current.display(&self.arena))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{DescriptorSpec, Encoder, FormSpec};
    use crate::value::ScalarType;

    fn iso_spec(values: &[Scalar]) -> DescriptorSpec<'_> {
        DescriptorSpec {
            code: 0xD21E,
            writable: true,
            factory_default: Scalar::Uint32(100),
            current: Scalar::Uint32(400),
            form: FormSpec::Enum(values),
        }
    }

    #[test]
    fn standard_descriptor_with_range() {
        let mut enc = Encoder::new();
        enc.put_descriptor(
            &DescriptorSpec {
                code: 0x5001,
                writable: false,
                factory_default: Scalar::Uint8(100),
                current: Scalar::Uint8(60),
                form: FormSpec::Range {
                    min: Scalar::Uint8(0),
                    max: Scalar::Uint8(100),
                    step: Scalar::Uint8(20),
                },
            },
            DescriptorLayout::Standard,
        );

        let list = PropertyList::decode(enc.as_slice(), DescriptorLayout::Standard).unwrap();
        let desc = list.get(0x5001).unwrap();
        assert_eq!(desc.data_type, DataType::Scalar(ScalarType::Uint8));
        assert!(!desc.writable);
        assert_eq!(desc.reserved, None);
        assert_eq!(desc.current_scalar(), Some(Scalar::Uint8(60)));
        assert_eq!(
            desc.form,
            Form::Range {
                min: PropertyValue::Scalar(Scalar::Uint8(0)),
                max: PropertyValue::Scalar(Scalar::Uint8(100)),
                step: PropertyValue::Scalar(Scalar::Uint8(20)),
            }
        );
    }

    #[test]
    fn vendor_list_decodes_every_descriptor() {
        let isos = [
            Scalar::Uint32(100),
            Scalar::Uint32(200),
            Scalar::Uint32(400),
        ];
        let mut enc = Encoder::new();
        enc.put_descriptor_list(&[
            iso_spec(&isos),
            DescriptorSpec {
                code: 0xD215,
                writable: false,
                factory_default: Scalar::Uint16(0),
                current: Scalar::Uint16(0x8002),
                form: FormSpec::None,
            },
        ]);

        let list = PropertyList::decode(enc.as_slice(), DescriptorLayout::Vendor).unwrap();
        assert_eq!(list.len(), 2);
        let iso = list.get(0xD21E).unwrap();
        assert_eq!(iso.reserved, Some(1));
        assert_eq!(iso.enum_scalars().unwrap(), isos.to_vec());
        assert_eq!(
            list.get(0xD215).unwrap().current_scalar(),
            Some(Scalar::Uint16(0x8002))
        );
    }

    #[test]
    fn refill_reuses_capacity_and_clears_on_error() {
        let isos = [Scalar::Uint32(100); 64];
        let mut enc = Encoder::new();
        enc.put_descriptor_list(&[iso_spec(&isos)]);
        let payload = enc.freeze();

        let mut list = PropertyList::new();
        list.refill(&payload, DescriptorLayout::Vendor).unwrap();
        let capacity = list.arena().capacity();
        list.refill(&payload, DescriptorLayout::Vendor).unwrap();
        assert_eq!(list.arena().capacity(), capacity);

        let err = list
            .refill(&payload[..payload.len() - 1], DescriptorLayout::Vendor)
            .unwrap_err();
        assert!(matches!(err, WireError::Truncated { field: "enum value", .. }));
        assert!(list.is_empty());
        assert!(list.arena().is_empty());
    }

    #[test]
    fn unknown_form_flag_is_rejected() {
        let mut enc = Encoder::new();
        enc.put_u16(0x5001)
            .put_u16(0x0002)
            .put_u8(0)
            .put_u8(1)
            .put_u8(1)
            .put_u8(7);
        assert!(matches!(
            PropertyList::decode(enc.as_slice(), DescriptorLayout::Standard),
            Err(WireError::UnknownForm { flag: 7 })
        ));
    }

    #[test]
    fn string_property_resolves_through_list_arena() {
        let mut enc = Encoder::new();
        enc.put_u16(0x501E).put_u16(0xFFFF).put_u8(1);
        enc.put_string("").unwrap();
        enc.put_string("Ansel").unwrap();
        enc.put_u8(0);

        let list = PropertyList::decode(enc.as_slice(), DescriptorLayout::Standard).unwrap();
        assert_eq!(list.display_current(0x501E).unwrap(), "\"Ansel\"");
    }
}
