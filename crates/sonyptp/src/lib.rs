//! Host-side control of Sony cameras over PTP.
//!
//! # Crate Structure
//!
//! - [`transport`]: the USB seam and an in-memory device double
//! - [`wire`]: decode arena, dataset decoders and the container codec
//! - [`session`]: sessions, transactions and event delivery
//! - [`vendor`]: the Sony handshake, controls and property convergence
//! - [`logging`]: stderr subscriber setup (behind `logging` feature)

/// Re-export transport types.
pub mod transport {
    pub use sonyptp_transport::*;
}

/// Re-export wire types.
pub mod wire {
    pub use sonyptp_wire::*;
}

/// Re-export session types.
pub mod session {
    pub use sonyptp_session::*;
}

/// Re-export vendor types.
pub mod vendor {
    pub use sonyptp_vendor::*;
}

#[cfg(feature = "logging")]
pub mod logging;

pub use sonyptp_vendor::SonyCamera;
