//! PTP wire format: containers, datasets and the decode arena.
//!
//! Every exchange with the camera is a little-endian container:
//! - A 4-byte total length, header included
//! - A 2-byte container type (command, data, response, event)
//! - A 2-byte operation, response or event code
//! - A 4-byte transaction id
//!
//! Variable-length fields of decoded datasets (strings, arrays) live in an
//! [`Arena`] owned by the record and are addressed by offset, so a growing
//! arena never invalidates a decoded record.

pub mod arena;
pub mod codes;
pub mod container;
pub mod dataset;
pub mod decode;
pub mod encode;
pub mod error;
pub mod reader;
pub mod value;
pub mod writer;

pub use arena::{Arena, Relocation, Snapshot, Span, GROWTH_SLACK};
pub use container::{
    decode_event, decode_header, decode_params, encode_command, encode_data, encode_params,
    ContainerConfig, ContainerHeader, ContainerType, Event, Params, Response,
    DEFAULT_STAGING_SIZE, HEADER_SIZE, MAX_PARAMS, MAX_PARAM_CONTAINER,
};
pub use dataset::{
    DescriptorLayout, DeviceInfo, Form, ObjectInfo, PropertyDescriptor, PropertyList,
    DECODE_ARENA_CAPACITY,
};
pub use decode::Decoder;
pub use encode::{DescriptorSpec, Encoder, FormSpec, MAX_STRING_UNITS};
pub use error::{ArenaError, Result, WireError};
pub use reader::ContainerReader;
pub use value::{ArrayRef, DataType, PropertyValue, Scalar, ScalarType, StrRef};
pub use writer::{ContainerWriter, SEND_ATTEMPTS};
