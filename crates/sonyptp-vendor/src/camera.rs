use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use sonyptp_session::{DataPhase, Event, Request, Session, SessionConfig};
use sonyptp_transport::UsbTransport;
use sonyptp_wire::codes::property as pima_property;
use sonyptp_wire::{
    DataType, DescriptorLayout, Encoder, ObjectInfo, PropertyDescriptor, PropertyList, Scalar,
};
use tracing::{debug, info};

use crate::capture::{PendingSource, PendingStatus};
use crate::codes::{button, event, operation, property, EXT_INFO_VERSION};
use crate::converge::{converge, ConvergeConfig, Direction, PropertyAccess, Target};
use crate::error::{ControlError, Result};
use crate::info::ExtDeviceInfo;
use crate::shutter::ShutterSpeed;

/// A Sony camera in PC remote mode.
///
/// Wraps a [`Session`] and keeps the last vendor property snapshot. Every
/// read that needs a fresh value refreshes the snapshot first.
pub struct SonyCamera<T: UsbTransport + 'static> {
    session: Session<T>,
    properties: PropertyList,
    converge: ConvergeConfig,
}

impl<T: UsbTransport + 'static> SonyCamera<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self::from_session(Session::new(transport))
    }

    pub fn with_config(transport: Arc<T>, config: SessionConfig) -> Self {
        Self::from_session(Session::with_config(transport, config))
    }

    pub fn from_session(session: Session<T>) -> Self {
        Self {
            session,
            properties: PropertyList::new(),
            converge: ConvergeConfig::default(),
        }
    }

    pub fn with_converge_config(mut self, config: ConvergeConfig) -> Self {
        self.converge = config;
        self
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    /// Open the session if needed and run the vendor handshake.
    pub fn connect(&mut self) -> Result<ExtDeviceInfo> {
        if !self.session.is_open() {
            self.session.open()?;
        }
        self.handshake()
    }

    /// SDIOConnect phases 1 and 2, the extended device info twice, then
    /// phase 3. The camera ignores remote control until this completes.
    pub fn handshake(&mut self) -> Result<ExtDeviceInfo> {
        self.sdio_connect(1)?;
        self.sdio_connect(2)?;
        self.ext_device_info()?;
        let info = self.ext_device_info()?;
        self.sdio_connect(3)?;
        info!(
            version = info.version,
            properties = info.properties().len(),
            "vendor handshake complete"
        );
        Ok(info)
    }

    pub fn sdio_connect(&mut self, phase: u32) -> Result<()> {
        debug!(phase, "SDIOConnect");
        self.session.transact(
            &Request::with_params(operation::SDIO_CONNECT, &[phase, 0, 0]),
            DataPhase::None,
        )?;
        Ok(())
    }

    pub fn ext_device_info(&mut self) -> Result<ExtDeviceInfo> {
        let reply = self.session.transact(
            &Request::with_params(operation::GET_SDIO_EXT_DEVICE_INFO, &[EXT_INFO_VERSION]),
            DataPhase::In,
        )?;
        ExtDeviceInfo::decode(&reply.into_data())
    }

    /// Fetch every vendor property into the snapshot.
    pub fn refresh_properties(&mut self) -> Result<&PropertyList> {
        let reply = self.session.transact(
            &Request::new(operation::GET_ALL_DEVICE_PROP_DATA),
            DataPhase::In,
        )?;
        self.properties
            .refill(&reply.into_data(), DescriptorLayout::Vendor)?;
        Ok(&self.properties)
    }

    /// The last snapshot, possibly stale.
    pub fn properties(&self) -> &PropertyList {
        &self.properties
    }

    /// A property from the last snapshot.
    pub fn property(&self, code: u16) -> Result<&PropertyDescriptor> {
        self.properties
            .get(code)
            .ok_or(ControlError::NotFound { code })
    }

    fn fresh_scalar(&mut self, code: u16) -> Result<Scalar> {
        self.refresh_properties()?;
        let desc = self.property(code)?;
        if !matches!(desc.data_type, DataType::Scalar(_)) {
            return Err(ControlError::PropertyType {
                code,
                found: desc.data_type,
            });
        }
        desc.current_scalar()
            .ok_or(ControlError::MissingValue { code })
    }

    fn set_control(&mut self, op: u16, code: u16, value: Scalar) -> Result<()> {
        let mut payload = Encoder::new();
        payload.put_scalar(&value);
        debug!(op, code, %value, "set control");
        self.session.transact(
            &Request::with_params(op, &[u32::from(code)]),
            DataPhase::Out(payload.as_slice()),
        )?;
        Ok(())
    }

    /// Set a property value directly.
    pub fn set_control_a(&mut self, code: u16, value: Scalar) -> Result<()> {
        self.set_control(operation::SET_CONTROL_DEVICE_A, code, value)
    }

    /// Press a control or step a property.
    pub fn set_control_b(&mut self, code: u16, value: Scalar) -> Result<()> {
        self.set_control(operation::SET_CONTROL_DEVICE_B, code, value)
    }

    /// Move a property one representable value up or down.
    pub fn adjust_property(&mut self, code: u16, direction: Direction) -> Result<()> {
        self.set_control_b(code, Scalar::Int8(direction.delta()))
    }

    pub fn pending_status(&mut self) -> Result<PendingStatus> {
        let code = property::PENDING_IMAGES;
        match self.fresh_scalar(code)? {
            Scalar::Uint16(raw) => Ok(PendingStatus::from_raw(raw)),
            other => Err(ControlError::PropertyType {
                code,
                found: DataType::Scalar(other.scalar_type()),
            }),
        }
    }

    /// Battery charge as the camera reports it.
    pub fn battery_level(&mut self) -> Result<i64> {
        let code = property::BATTERY_LEVEL;
        let value = self.fresh_scalar(code)?;
        value
            .to_i128()
            .and_then(|v| i64::try_from(v).ok())
            .ok_or(ControlError::PropertyType {
                code,
                found: DataType::Scalar(value.scalar_type()),
            })
    }

    /// Select single or continuous shooting; see [`drive_mode`](crate::codes::drive_mode).
    pub fn set_drive_mode(&mut self, mode: u16) -> Result<()> {
        self.set_control_a(pima_property::STILL_CAPTURE_MODE, Scalar::Uint16(mode))
    }

    /// Half-press for focus, then full press.
    pub fn press_shutter(&mut self) -> Result<()> {
        self.set_control_b(property::CTRL_AF_LOCK, Scalar::Uint16(button::PRESS))?;
        self.set_control_b(property::CTRL_SHUTTER, Scalar::Uint16(button::PRESS))
    }

    /// Release in the reverse order of [`press_shutter`](Self::press_shutter).
    pub fn release_shutter(&mut self) -> Result<()> {
        self.set_control_b(property::CTRL_SHUTTER, Scalar::Uint16(button::RELEASE))?;
        self.set_control_b(property::CTRL_AF_LOCK, Scalar::Uint16(button::RELEASE))
    }

    /// Fetch an object's info and bytes. Fetching
    /// [`CAPTURE_HANDLE`](crate::codes::CAPTURE_HANDLE) pops the oldest
    /// pending capture.
    pub fn transfer_object(&mut self, handle: u32) -> Result<(ObjectInfo, Bytes)> {
        let info = self.session.get_object_info(handle)?;
        let data = self.session.get_object(handle)?;
        debug!(handle, size = data.len(), "object transferred");
        Ok((info, data))
    }

    /// Deliver events to `callback` instead of the `wait_*` methods.
    pub fn register_event_callback(
        &mut self,
        callback: impl Fn(&Event) + Send + Sync + 'static,
    ) -> Result<()> {
        self.session.register_event_callback(callback)?;
        Ok(())
    }

    fn wait_for(&mut self, code: u16, timeout: Duration) -> Result<Option<u32>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            let Some(ev) = self.session.wait_event(Some(remaining))? else {
                return Ok(None);
            };
            if ev.code != code {
                debug!(code = ev.code, "skipping event");
                continue;
            }
            return ev
                .params
                .get(0)
                .map(Some)
                .ok_or(ControlError::MissingEventParam { code });
        }
    }

    /// Wait for ObjectAdded and return the new handle. `None` on timeout.
    pub fn wait_object(&mut self, timeout: Duration) -> Result<Option<u32>> {
        self.wait_for(event::OBJECT_ADDED, timeout)
    }

    /// Wait for PropertyChanged and return the property code. `None` on
    /// timeout.
    pub fn wait_property(&mut self, timeout: Duration) -> Result<Option<u16>> {
        Ok(self
            .wait_for(event::PROPERTY_CHANGED, timeout)?
            .map(|raw| (raw & 0xFFFF) as u16))
    }

    fn converge_to(&mut self, code: u16, target: Target) -> Result<Scalar> {
        let config = self.converge.clone();
        converge(self, code, target, &config)
    }

    /// Step the shutter speed to `target`.
    pub fn set_shutter_speed(&mut self, target: ShutterSpeed) -> Result<ShutterSpeed> {
        let code = property::SHUTTER_SPEED;
        match self.converge_to(code, Target::Shutter(target))? {
            Scalar::Uint32(raw) => Ok(ShutterSpeed::from_raw(raw)),
            other => Err(type_mismatch(code, other)),
        }
    }

    /// Step ISO to `target`.
    pub fn set_iso(&mut self, target: u32) -> Result<u32> {
        let code = property::ISO;
        let value = self.converge_to(code, Target::Numeric(target.into()))?;
        value.as_u32().ok_or_else(|| type_mismatch(code, value))
    }

    /// Step the aperture to `target`, in hundredths (f/5.6 is 560).
    pub fn set_f_number(&mut self, target: u16) -> Result<u16> {
        let code = pima_property::F_NUMBER;
        let value = self.converge_to(code, Target::Numeric(target.into()))?;
        value.as_u16().ok_or_else(|| type_mismatch(code, value))
    }

    /// Close the session. The property snapshot is dropped with it.
    pub fn close(&mut self) -> Result<()> {
        self.properties = PropertyList::new();
        self.session.close()?;
        Ok(())
    }
}

fn type_mismatch(code: u16, value: Scalar) -> ControlError {
    ControlError::PropertyType {
        code,
        found: DataType::Scalar(value.scalar_type()),
    }
}

impl<T: UsbTransport + 'static> PropertyAccess for SonyCamera<T> {
    fn current(&mut self, code: u16) -> Result<Scalar> {
        self.fresh_scalar(code)
    }

    fn step(&mut self, code: u16, direction: Direction) -> Result<()> {
        self.adjust_property(code, direction)
    }
}

impl<T: UsbTransport + 'static> PendingSource for SonyCamera<T> {
    fn pending_status(&mut self) -> Result<PendingStatus> {
        SonyCamera::pending_status(self)
    }
}
