//! Standard PIMA 15740 operations.

use bytes::Bytes;
use sonyptp_transport::UsbTransport;
use sonyptp_wire::codes::operation;
use sonyptp_wire::{
    Arena, Decoder, DescriptorLayout, DeviceInfo, ObjectInfo, PropertyList, Scalar, ScalarType,
};

use crate::error::Result;
use crate::session::{DataPhase, Request, Session};

/// Storage id matching every store.
pub const ALL_STORAGES: u32 = 0xFFFF_FFFF;

/// Object handle of the root folder, or "any parent" in GetObjectHandles.
pub const ROOT_PARENT: u32 = 0xFFFF_FFFF;

fn decode_u32_array(payload: &[u8], field: &'static str) -> Result<Vec<u32>> {
    let mut arena = Arena::with_capacity(payload.len());
    let array = Decoder::new(payload, &mut arena).array(ScalarType::Uint32, field)?;
    Ok(array
        .resolve(&arena)
        .unwrap_or_default()
        .iter()
        .filter_map(Scalar::as_u32)
        .collect())
}

impl<T: UsbTransport + 'static> Session<T> {
    fn read(&mut self, code: u16, params: &[u32]) -> Result<Bytes> {
        let reply = self.transact(&Request::with_params(code, params), DataPhase::In)?;
        Ok(reply.into_data())
    }

    fn run(&mut self, code: u16, params: &[u32]) -> Result<()> {
        self.transact(&Request::with_params(code, params), DataPhase::None)
            .map(|_| ())
    }

    pub fn get_device_info(&mut self) -> Result<DeviceInfo> {
        let data = self.read(operation::GET_DEVICE_INFO, &[])?;
        Ok(DeviceInfo::decode(&data)?)
    }

    pub fn get_storage_ids(&mut self) -> Result<Vec<u32>> {
        let data = self.read(operation::GET_STORAGE_IDS, &[])?;
        decode_u32_array(&data, "storage ids")
    }

    /// Handles of objects in `storage_id`, optionally filtered by format and
    /// parent. Zero format means any format.
    pub fn get_object_handles(
        &mut self,
        storage_id: u32,
        format: u16,
        parent: u32,
    ) -> Result<Vec<u32>> {
        let data = self.read(
            operation::GET_OBJECT_HANDLES,
            &[storage_id, u32::from(format), parent],
        )?;
        decode_u32_array(&data, "object handles")
    }

    pub fn get_object_info(&mut self, handle: u32) -> Result<ObjectInfo> {
        let data = self.read(operation::GET_OBJECT_INFO, &[handle])?;
        Ok(ObjectInfo::decode(&data)?)
    }

    /// Raw object bytes. The payload is opaque to the session.
    pub fn get_object(&mut self, handle: u32) -> Result<Bytes> {
        self.read(operation::GET_OBJECT, &[handle])
    }

    pub fn get_thumb(&mut self, handle: u32) -> Result<Bytes> {
        self.read(operation::GET_THUMB, &[handle])
    }

    pub fn delete_object(&mut self, handle: u32, format: u16) -> Result<()> {
        self.run(operation::DELETE_OBJECT, &[handle, u32::from(format)])
    }

    pub fn initiate_capture(&mut self, storage_id: u32, format: u16) -> Result<()> {
        self.run(operation::INITIATE_CAPTURE, &[storage_id, u32::from(format)])
    }

    pub fn get_device_prop_desc(&mut self, code: u16) -> Result<PropertyList> {
        let data = self.read(operation::GET_DEVICE_PROP_DESC, &[u32::from(code)])?;
        Ok(PropertyList::decode(&data, DescriptorLayout::Standard)?)
    }

    /// Raw current value. Its shape depends on the property's data type.
    pub fn get_device_prop_value(&mut self, code: u16) -> Result<Bytes> {
        self.read(operation::GET_DEVICE_PROP_VALUE, &[u32::from(code)])
    }

    pub fn set_device_prop_value(&mut self, code: u16, value: &[u8]) -> Result<()> {
        self.transact(
            &Request::with_params(operation::SET_DEVICE_PROP_VALUE, &[u32::from(code)]),
            DataPhase::Out(value),
        )
        .map(|_| ())
    }

    pub fn reset_device(&mut self) -> Result<()> {
        self.run(operation::RESET_DEVICE, &[])
    }

    pub fn power_down(&mut self) -> Result<()> {
        self.run(operation::POWER_DOWN, &[])
    }
}
