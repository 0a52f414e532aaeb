//! Core session, dispatch and device-state logic for the pet-feeder hub.

mod connection;
mod error;
mod frame;
pub mod handlers;
mod router;
mod session;
mod store;

pub use connection::{CLOSE_UNSUPPORTED_DATA, ConnectionHandle, Outbound, RESPONSE_TERMINATOR};
pub use error::FeederError;
pub use frame::decode_frame;
pub use router::{Reply, RouteContext, RouteError, RouteHandler, RouteResult, Router};
pub use session::{Session, SessionKey, SessionRegistry};
pub use store::{DEFAULT_HISTORY_LIMIT, DeviceStore};

/// Result type for feeder operations.
pub type Result<T> = std::result::Result<T, FeederError>;
