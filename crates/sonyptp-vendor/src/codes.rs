//! Sony vendor extension codes.
//!
//! Name lookups fall back to the PIMA tables in [`sonyptp_wire::codes`], so
//! one call names any code a Sony camera reports.

use sonyptp_wire::codes as pima;

/// USB vendor id of Sony Corporation.
pub const SONY_VENDOR_ID: u16 = 0x054C;

/// USB product id of the ILCE-6000 in PC remote mode.
pub const ILCE_6000_PRODUCT_ID: u16 = 0x094E;

/// Handle of the most recent capture, held in camera memory until fetched.
pub const CAPTURE_HANDLE: u32 = 0xFFFF_C001;

/// Protocol version passed to GetSDIOExtDeviceInfo.
pub const EXT_INFO_VERSION: u32 = 200;

/// Vendor operation codes.
pub mod operation {
    pub const SDIO_CONNECT: u16 = 0x9201;
    pub const GET_SDIO_EXT_DEVICE_INFO: u16 = 0x9202;
    pub const GET_DEVICE_PROP_DESC: u16 = 0x9203;
    pub const SET_CONTROL_DEVICE_A: u16 = 0x9205;
    pub const SET_CONTROL_DEVICE_B: u16 = 0x9207;
    pub const GET_ALL_DEVICE_PROP_DATA: u16 = 0x9209;
}

/// Vendor event codes.
pub mod event {
    pub const OBJECT_ADDED: u16 = 0xC201;
    pub const PROPERTY_CHANGED: u16 = 0xC203;
}

/// Vendor device property codes.
pub mod property {
    pub const DPC_COMPENSATION: u16 = 0xD200;
    pub const D_RANGE_OPTIMIZE: u16 = 0xD201;
    pub const IMAGE_SIZE: u16 = 0xD203;
    pub const SHUTTER_SPEED: u16 = 0xD20D;
    pub const COLOR_TEMP: u16 = 0xD20F;
    pub const CC_FILTER: u16 = 0xD210;
    pub const ASPECT_RATIO: u16 = 0xD211;
    /// Pending image count in the low 15 bits, ready flag in the top bit.
    pub const PENDING_IMAGES: u16 = 0xD215;
    pub const EXPOSE_INDEX: u16 = 0xD216;
    pub const BATTERY_LEVEL: u16 = 0xD218;
    pub const PICTURE_EFFECT: u16 = 0xD21B;
    pub const AB_FILTER: u16 = 0xD21C;
    pub const ISO: u16 = 0xD21E;
    pub const CTRL_AF_LOCK: u16 = 0xD2C1;
    pub const CTRL_SHUTTER: u16 = 0xD2C2;
    pub const CTRL_AE_LOCK: u16 = 0xD2C3;
    pub const CTRL_STILL_IMAGE: u16 = 0xD2C7;
    pub const CTRL_MOVIE: u16 = 0xD2C8;
}

/// Values written to the `CTRL_*` button properties.
pub mod button {
    pub const RELEASE: u16 = 0x0001;
    pub const PRESS: u16 = 0x0002;
}

/// Still capture mode values, including the Sony continuous speeds.
pub mod drive_mode {
    pub const SINGLE: u16 = 0x0001;
    pub const CONTINUOUS_HIGH: u16 = 0x0002;
    pub const CONTINUOUS_MID: u16 = 0x8015;
    pub const CONTINUOUS_LOW: u16 = 0x8012;
}

/// Returns a human-readable name for a PIMA or vendor operation code.
pub fn operation_name(code: u16) -> &'static str {
    use operation::*;
    match code {
        SDIO_CONNECT => "SDIOConnect",
        GET_SDIO_EXT_DEVICE_INFO => "GetSDIOExtDeviceInfo",
        GET_DEVICE_PROP_DESC => "GetDevicePropDesc (Sony)",
        SET_CONTROL_DEVICE_A => "SetControlDeviceA",
        SET_CONTROL_DEVICE_B => "SetControlDeviceB",
        GET_ALL_DEVICE_PROP_DATA => "GetAllDevicePropData",
        _ => pima::operation_name(code),
    }
}

/// Returns a human-readable name for a PIMA or vendor event code.
pub fn event_name(code: u16) -> &'static str {
    match code {
        event::OBJECT_ADDED => "ObjectAdded (Sony)",
        event::PROPERTY_CHANGED => "PropertyChanged (Sony)",
        _ => pima::event_name(code),
    }
}

/// Returns a human-readable name for a PIMA or vendor property code.
pub fn property_name(code: u16) -> &'static str {
    use property::*;
    match code {
        DPC_COMPENSATION => "DPC Compensation",
        D_RANGE_OPTIMIZE => "D-Range Optimize",
        IMAGE_SIZE => "Image Size",
        SHUTTER_SPEED => "Shutter Speed",
        COLOR_TEMP => "Color Temperature",
        CC_FILTER => "CC Filter",
        ASPECT_RATIO => "Aspect Ratio",
        PENDING_IMAGES => "Pending Images",
        EXPOSE_INDEX => "Exposure Index",
        BATTERY_LEVEL => "Battery Level",
        PICTURE_EFFECT => "Picture Effect",
        AB_FILTER => "AB Filter",
        ISO => "ISO",
        CTRL_AF_LOCK => "AF Lock (control)",
        CTRL_SHUTTER => "Shutter (control)",
        CTRL_AE_LOCK => "AE Lock (control)",
        CTRL_STILL_IMAGE => "Still Image (control)",
        CTRL_MOVIE => "Movie (control)",
        _ => pima::property_name(code),
    }
}
