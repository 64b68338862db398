//! Standard PIMA 15740 codes.
//!
//! Vendor extensions allocate their own ranges (0x9000 operations,
//! 0xC000 events, 0xD000 properties) and fall back to these tables for
//! naming.

/// Operation codes.
pub mod operation {
    pub const GET_DEVICE_INFO: u16 = 0x1001;
    pub const OPEN_SESSION: u16 = 0x1002;
    pub const CLOSE_SESSION: u16 = 0x1003;
    pub const GET_STORAGE_IDS: u16 = 0x1004;
    pub const GET_STORAGE_INFO: u16 = 0x1005;
    pub const GET_NUM_OBJECTS: u16 = 0x1006;
    pub const GET_OBJECT_HANDLES: u16 = 0x1007;
    pub const GET_OBJECT_INFO: u16 = 0x1008;
    pub const GET_OBJECT: u16 = 0x1009;
    pub const GET_THUMB: u16 = 0x100A;
    pub const DELETE_OBJECT: u16 = 0x100B;
    pub const SEND_OBJECT_INFO: u16 = 0x100C;
    pub const SEND_OBJECT: u16 = 0x100D;
    pub const INITIATE_CAPTURE: u16 = 0x100E;
    pub const FORMAT_STORE: u16 = 0x100F;
    pub const RESET_DEVICE: u16 = 0x1010;
    pub const SELF_TEST: u16 = 0x1011;
    pub const SET_OBJECT_PROTECTION: u16 = 0x1012;
    pub const POWER_DOWN: u16 = 0x1013;
    pub const GET_DEVICE_PROP_DESC: u16 = 0x1014;
    pub const GET_DEVICE_PROP_VALUE: u16 = 0x1015;
    pub const SET_DEVICE_PROP_VALUE: u16 = 0x1016;
    pub const RESET_DEVICE_PROP_VALUE: u16 = 0x1017;
    pub const TERMINATE_OPEN_CAPTURE: u16 = 0x1018;
    pub const MOVE_OBJECT: u16 = 0x1019;
    pub const COPY_OBJECT: u16 = 0x101A;
    pub const GET_PARTIAL_OBJECT: u16 = 0x101B;
    pub const INITIATE_OPEN_CAPTURE: u16 = 0x101C;
}

/// Response codes.
pub mod response {
    pub const UNDEFINED: u16 = 0x2000;
    pub const OK: u16 = 0x2001;
    pub const GENERAL_ERROR: u16 = 0x2002;
    pub const SESSION_NOT_OPEN: u16 = 0x2003;
    pub const INVALID_TRANSACTION_ID: u16 = 0x2004;
    pub const OPERATION_NOT_SUPPORTED: u16 = 0x2005;
    pub const PARAMETER_NOT_SUPPORTED: u16 = 0x2006;
    pub const INCOMPLETE_TRANSFER: u16 = 0x2007;
    pub const INVALID_STORAGE_ID: u16 = 0x2008;
    pub const INVALID_OBJECT_HANDLE: u16 = 0x2009;
    pub const DEVICE_PROP_NOT_SUPPORTED: u16 = 0x200A;
    pub const INVALID_OBJECT_FORMAT_CODE: u16 = 0x200B;
    pub const STORE_FULL: u16 = 0x200C;
    pub const OBJECT_WRITE_PROTECTED: u16 = 0x200D;
    pub const STORE_READ_ONLY: u16 = 0x200E;
    pub const ACCESS_DENIED: u16 = 0x200F;
    pub const NO_THUMBNAIL_PRESENT: u16 = 0x2010;
    pub const SELF_TEST_FAILED: u16 = 0x2011;
    pub const PARTIAL_DELETION: u16 = 0x2012;
    pub const STORE_NOT_AVAILABLE: u16 = 0x2013;
    pub const SPECIFICATION_BY_FORMAT_UNSUPPORTED: u16 = 0x2014;
    pub const NO_VALID_OBJECT_INFO: u16 = 0x2015;
    pub const INVALID_CODE_FORMAT: u16 = 0x2016;
    pub const UNKNOWN_VENDOR_CODE: u16 = 0x2017;
    pub const CAPTURE_ALREADY_TERMINATED: u16 = 0x2018;
    pub const DEVICE_BUSY: u16 = 0x2019;
    pub const INVALID_PARENT_OBJECT: u16 = 0x201A;
    pub const INVALID_DEVICE_PROP_FORMAT: u16 = 0x201B;
    pub const INVALID_DEVICE_PROP_VALUE: u16 = 0x201C;
    pub const INVALID_PARAMETER: u16 = 0x201D;
    pub const SESSION_ALREADY_OPEN: u16 = 0x201E;
    pub const TRANSACTION_CANCELLED: u16 = 0x201F;
    pub const SPECIFICATION_OF_DESTINATION_UNSUPPORTED: u16 = 0x2020;
}

/// Event codes.
pub mod event {
    pub const UNDEFINED: u16 = 0x4000;
    pub const CANCEL_TRANSACTION: u16 = 0x4001;
    pub const OBJECT_ADDED: u16 = 0x4002;
    pub const OBJECT_REMOVED: u16 = 0x4003;
    pub const STORE_ADDED: u16 = 0x4004;
    pub const STORE_REMOVED: u16 = 0x4005;
    pub const DEVICE_PROP_CHANGED: u16 = 0x4006;
    pub const OBJECT_INFO_CHANGED: u16 = 0x4007;
    pub const DEVICE_INFO_CHANGED: u16 = 0x4008;
    pub const REQUEST_OBJECT_TRANSFER: u16 = 0x4009;
    pub const STORE_FULL: u16 = 0x400A;
    pub const DEVICE_RESET: u16 = 0x400B;
    pub const STORAGE_INFO_CHANGED: u16 = 0x400C;
    pub const CAPTURE_COMPLETE: u16 = 0x400D;
    pub const UNREPORTED_STATUS: u16 = 0x400E;
}

/// Device property codes.
pub mod property {
    pub const UNDEFINED: u16 = 0x5000;
    pub const BATTERY_LEVEL: u16 = 0x5001;
    pub const FUNCTIONAL_MODE: u16 = 0x5002;
    pub const IMAGE_SIZE: u16 = 0x5003;
    pub const COMPRESSION_SETTING: u16 = 0x5004;
    pub const WHITE_BALANCE: u16 = 0x5005;
    pub const RGB_GAIN: u16 = 0x5006;
    pub const F_NUMBER: u16 = 0x5007;
    pub const FOCAL_LENGTH: u16 = 0x5008;
    pub const FOCUS_DISTANCE: u16 = 0x5009;
    pub const FOCUS_MODE: u16 = 0x500A;
    pub const EXPOSURE_METERING_MODE: u16 = 0x500B;
    pub const FLASH_MODE: u16 = 0x500C;
    pub const EXPOSURE_TIME: u16 = 0x500D;
    pub const EXPOSURE_PROGRAM_MODE: u16 = 0x500E;
    pub const EXPOSURE_INDEX: u16 = 0x500F;
    pub const EXPOSURE_BIAS_COMPENSATION: u16 = 0x5010;
    pub const DATE_TIME: u16 = 0x5011;
    pub const CAPTURE_DELAY: u16 = 0x5012;
    pub const STILL_CAPTURE_MODE: u16 = 0x5013;
    pub const CONTRAST: u16 = 0x5014;
    pub const SHARPNESS: u16 = 0x5015;
    pub const DIGITAL_ZOOM: u16 = 0x5016;
    pub const EFFECT_MODE: u16 = 0x5017;
    pub const BURST_NUMBER: u16 = 0x5018;
    pub const BURST_INTERVAL: u16 = 0x5019;
    pub const TIMELAPSE_NUMBER: u16 = 0x501A;
    pub const TIMELAPSE_INTERVAL: u16 = 0x501B;
    pub const FOCUS_METERING_MODE: u16 = 0x501C;
    pub const UPLOAD_URL: u16 = 0x501D;
    pub const ARTIST: u16 = 0x501E;
    pub const COPYRIGHT_INFO: u16 = 0x501F;
}

/// Values of the still capture mode property.
pub mod capture_mode {
    pub const UNDEFINED: u16 = 0x0000;
    pub const NORMAL: u16 = 0x0001;
    pub const BURST: u16 = 0x0002;
    pub const TIMELAPSE: u16 = 0x0003;
}

/// Data type codes. Array types are the element code with bit 14 set.
pub mod data_type {
    pub const UNDEFINED: u16 = 0x0000;
    pub const INT8: u16 = 0x0001;
    pub const UINT8: u16 = 0x0002;
    pub const INT16: u16 = 0x0003;
    pub const UINT16: u16 = 0x0004;
    pub const INT32: u16 = 0x0005;
    pub const UINT32: u16 = 0x0006;
    pub const INT64: u16 = 0x0007;
    pub const UINT64: u16 = 0x0008;
    pub const INT128: u16 = 0x0009;
    pub const UINT128: u16 = 0x000A;
    pub const ARRAY: u16 = 0x4000;
    pub const STRING: u16 = 0xFFFF;
}

/// Returns a human-readable name for an operation code.
pub fn operation_name(code: u16) -> &'static str {
    use operation::*;
    match code {
        GET_DEVICE_INFO => "GetDeviceInfo",
        OPEN_SESSION => "OpenSession",
        CLOSE_SESSION => "CloseSession",
        GET_STORAGE_IDS => "GetStorageIDs",
        GET_STORAGE_INFO => "GetStorageInfo",
        GET_NUM_OBJECTS => "GetNumObjects",
        GET_OBJECT_HANDLES => "GetObjectHandles",
        GET_OBJECT_INFO => "GetObjectInfo",
        GET_OBJECT => "GetObject",
        GET_THUMB => "GetThumb",
        DELETE_OBJECT => "DeleteObject",
        SEND_OBJECT_INFO => "SendObjectInfo",
        SEND_OBJECT => "SendObject",
        INITIATE_CAPTURE => "InitiateCapture",
        FORMAT_STORE => "FormatStore",
        RESET_DEVICE => "ResetDevice",
        SELF_TEST => "SelfTest",
        SET_OBJECT_PROTECTION => "SetObjectProtection",
        POWER_DOWN => "PowerDown",
        GET_DEVICE_PROP_DESC => "GetDevicePropDesc",
        GET_DEVICE_PROP_VALUE => "GetDevicePropValue",
        SET_DEVICE_PROP_VALUE => "SetDevicePropValue",
        RESET_DEVICE_PROP_VALUE => "ResetDevicePropValue",
        TERMINATE_OPEN_CAPTURE => "TerminateOpenCapture",
        MOVE_OBJECT => "MoveObject",
        COPY_OBJECT => "CopyObject",
        GET_PARTIAL_OBJECT => "GetPartialObject",
        INITIATE_OPEN_CAPTURE => "InitiateOpenCapture",
        0x9000..=0x9FFF => "Vendor",
        _ => "Unknown",
    }
}

/// Returns a human-readable name for a response code.
pub fn response_name(code: u16) -> &'static str {
    use response::*;
    match code {
        UNDEFINED => "Undefined",
        OK => "OK",
        GENERAL_ERROR => "GeneralError",
        SESSION_NOT_OPEN => "SessionNotOpen",
        INVALID_TRANSACTION_ID => "InvalidTransactionID",
        OPERATION_NOT_SUPPORTED => "OperationNotSupported",
        PARAMETER_NOT_SUPPORTED => "ParameterNotSupported",
        INCOMPLETE_TRANSFER => "IncompleteTransfer",
        INVALID_STORAGE_ID => "InvalidStorageID",
        INVALID_OBJECT_HANDLE => "InvalidObjectHandle",
        DEVICE_PROP_NOT_SUPPORTED => "DevicePropNotSupported",
        INVALID_OBJECT_FORMAT_CODE => "InvalidObjectFormatCode",
        STORE_FULL => "StoreFull",
        OBJECT_WRITE_PROTECTED => "ObjectWriteProtected",
        STORE_READ_ONLY => "StoreReadOnly",
        ACCESS_DENIED => "AccessDenied",
        NO_THUMBNAIL_PRESENT => "NoThumbnailPresent",
        SELF_TEST_FAILED => "SelfTestFailed",
        PARTIAL_DELETION => "PartialDeletion",
        STORE_NOT_AVAILABLE => "StoreNotAvailable",
        SPECIFICATION_BY_FORMAT_UNSUPPORTED => "SpecificationByFormatUnsupported",
        NO_VALID_OBJECT_INFO => "NoValidObjectInfo",
        INVALID_CODE_FORMAT => "InvalidCodeFormat",
        UNKNOWN_VENDOR_CODE => "UnknownVendorCode",
        CAPTURE_ALREADY_TERMINATED => "CaptureAlreadyTerminated",
        DEVICE_BUSY => "DeviceBusy",
        INVALID_PARENT_OBJECT => "InvalidParentObject",
        INVALID_DEVICE_PROP_FORMAT => "InvalidDevicePropFormat",
        INVALID_DEVICE_PROP_VALUE => "InvalidDevicePropValue",
        INVALID_PARAMETER => "InvalidParameter",
        SESSION_ALREADY_OPEN => "SessionAlreadyOpen",
        TRANSACTION_CANCELLED => "TransactionCancelled",
        SPECIFICATION_OF_DESTINATION_UNSUPPORTED => "SpecificationOfDestinationUnsupported",
        0xA000..=0xAFFF => "Vendor",
        _ => "Unknown",
    }
}

/// Returns a human-readable name for an event code.
pub fn event_name(code: u16) -> &'static str {
    use event::*;
    match code {
        UNDEFINED => "Undefined",
        CANCEL_TRANSACTION => "CancelTransaction",
        OBJECT_ADDED => "ObjectAdded",
        OBJECT_REMOVED => "ObjectRemoved",
        STORE_ADDED => "StoreAdded",
        STORE_REMOVED => "StoreRemoved",
        DEVICE_PROP_CHANGED => "DevicePropChanged",
        OBJECT_INFO_CHANGED => "ObjectInfoChanged",
        DEVICE_INFO_CHANGED => "DeviceInfoChanged",
        REQUEST_OBJECT_TRANSFER => "RequestObjectTransfer",
        STORE_FULL => "StoreFull",
        DEVICE_RESET => "DeviceReset",
        STORAGE_INFO_CHANGED => "StorageInfoChanged",
        CAPTURE_COMPLETE => "CaptureComplete",
        UNREPORTED_STATUS => "UnreportedStatus",
        0xC000..=0xCFFF => "Vendor",
        _ => "Unknown",
    }
}

/// Returns a human-readable name for a device property code.
pub fn property_name(code: u16) -> &'static str {
    use property::*;
    match code {
        UNDEFINED => "Undefined",
        BATTERY_LEVEL => "Battery level",
        FUNCTIONAL_MODE => "Functional mode",
        IMAGE_SIZE => "Image size",
        COMPRESSION_SETTING => "Compression setting",
        WHITE_BALANCE => "White balance",
        RGB_GAIN => "RGB gain",
        F_NUMBER => "F number",
        FOCAL_LENGTH => "Focal length",
        FOCUS_DISTANCE => "Focus distance",
        FOCUS_MODE => "Focus mode",
        EXPOSURE_METERING_MODE => "Exposure metering mode",
        FLASH_MODE => "Flash mode",
        EXPOSURE_TIME => "Exposure time",
        EXPOSURE_PROGRAM_MODE => "Exposure program mode",
        EXPOSURE_INDEX => "Exposure index",
        EXPOSURE_BIAS_COMPENSATION => "Exposure bias compensation",
        DATE_TIME => "Date/Time",
        CAPTURE_DELAY => "Capture delay",
        STILL_CAPTURE_MODE => "Still capture mode",
        CONTRAST => "Contrast",
        SHARPNESS => "Sharpness",
        DIGITAL_ZOOM => "Digital zoom",
        EFFECT_MODE => "Effect mode",
        BURST_NUMBER => "Burst number",
        BURST_INTERVAL => "Burst interval",
        TIMELAPSE_NUMBER => "Timelapse number",
        TIMELAPSE_INTERVAL => "Timelapse interval",
        FOCUS_METERING_MODE => "Focus metering mode",
        UPLOAD_URL => "Upload URL",
        ARTIST => "Artist",
        COPYRIGHT_INFO => "Copyright info",
        0xD000..=0xDFFF => "Vendor",
        _ => "Unknown",
    }
}

/// Returns a human-readable name for a data type code.
pub fn type_name(code: u16) -> &'static str {
    use data_type::*;
    match code {
        UNDEFINED => "UNDEF",
        INT8 => "INT8",
        UINT8 => "UINT8",
        INT16 => "INT16",
        UINT16 => "UINT16",
        INT32 => "INT32",
        UINT32 => "UINT32",
        INT64 => "INT64",
        UINT64 => "UINT64",
        INT128 => "INT128",
        UINT128 => "UINT128",
        c if c == ARRAY | INT8 => "AINT8",
        c if c == ARRAY | UINT8 => "AUINT8",
        c if c == ARRAY | INT16 => "AINT16",
        c if c == ARRAY | UINT16 => "AUINT16",
        c if c == ARRAY | INT32 => "AINT32",
        c if c == ARRAY | UINT32 => "AUINT32",
        c if c == ARRAY | INT64 => "AINT64",
        c if c == ARRAY | UINT64 => "AUINT64",
        c if c == ARRAY | INT128 => "AINT128",
        c if c == ARRAY | UINT128 => "AUINT128",
        STRING => "STR",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_names() {
        assert_eq!(operation_name(operation::GET_DEVICE_INFO), "GetDeviceInfo");
        assert_eq!(response_name(response::OK), "OK");
        assert_eq!(event_name(event::OBJECT_ADDED), "ObjectAdded");
        assert_eq!(property_name(property::STILL_CAPTURE_MODE), "Still capture mode");
        assert_eq!(type_name(data_type::UINT16), "UINT16");
        assert_eq!(type_name(data_type::ARRAY | data_type::UINT16), "AUINT16");
        assert_eq!(type_name(data_type::STRING), "STR");
        assert_eq!(type_name(0x4000), "Unknown");
    }

    #[test]
    fn vendor_ranges_are_labelled() {
        assert_eq!(operation_name(0x9201), "Vendor");
        assert_eq!(event_name(0xC201), "Vendor");
        assert_eq!(property_name(0xD20D), "Vendor");
        assert_eq!(response_name(0x0042), "Unknown");
    }
}
