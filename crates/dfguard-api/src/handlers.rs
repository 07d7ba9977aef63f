//! Request handlers.

pub mod health;
pub mod predict;
pub mod register;

pub use health::*;
pub use predict::*;
pub use register::*;
