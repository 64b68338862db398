//! Sony PTP vendor extension.
//!
//! [`SonyCamera`] runs the PC remote handshake over a PTP session, reads the
//! vendor property block, presses the virtual shutter buttons and fetches
//! captures. Settings that the camera only exposes as relative steps are
//! driven to absolute targets by [`converge`].

pub mod camera;
pub mod capture;
pub mod codes;
pub mod converge;
pub mod error;
pub mod info;
pub mod shutter;

pub use camera::SonyCamera;
pub use capture::{
    wait_for_pending, CaptureSignal, PendingSource, PendingStatus, PendingStrategy, Wake,
};
pub use codes::{CAPTURE_HANDLE, ILCE_6000_PRODUCT_ID, SONY_VENDOR_ID};
pub use converge::{
    converge, ConvergeConfig, ConvergeState, Convergence, Direction, PropertyAccess, Target,
};
pub use error::{ControlError, Result};
pub use info::ExtDeviceInfo;
pub use shutter::ShutterSpeed;
