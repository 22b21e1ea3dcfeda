//! Connection lifecycle and the event loop that drives it.

pub mod lifecycle;
pub mod listener;

pub use lifecycle::{Phase, Server};
