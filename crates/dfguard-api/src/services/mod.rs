//! Outbound service clients.

pub mod identity;

pub use identity::{IdentityClient, IdentityError};
