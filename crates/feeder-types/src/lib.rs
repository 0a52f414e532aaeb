//! Shared types for the pet-feeder hub.

mod auth;
mod device;
mod envelope;

pub use auth::*;
pub use device::*;
pub use envelope::*;
