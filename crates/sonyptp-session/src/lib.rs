//! PTP transaction engine.
//!
//! A transaction is one command container, at most one data phase in a
//! single direction, and one response, all sharing a session-scoped
//! transaction id. [`Session`] owns that id together with the staging buffer,
//! so transactions run one at a time; [`SharedSession`] serializes callers on
//! different threads.
//!
//! Events arrive on the interrupt endpoint either through
//! [`Session::wait_event`] or, once a callback is registered, through an
//! [`EventPool`] of self-resubmitting reads.

pub mod config;
pub mod error;
pub mod events;
pub mod pima;
pub mod session;
pub mod shared;

pub use config::{SessionConfig, DEFAULT_EVENT_SLOTS};
pub use error::{Result, SessionError};
pub use events::{EventCallback, EventPool};
pub use pima::{ALL_STORAGES, ROOT_PARENT};
pub use session::{DataPhase, Reply, Request, Session, SessionState, INITIAL_TRANSACTION_ID};
pub use shared::SharedSession;
pub use sonyptp_wire::{Event, Params};
