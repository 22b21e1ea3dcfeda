//! Status panel - single-threaded HTTP server for a button and joystick panel
//!
//! Serves live input readings as JSON and an index page that is streamed in
//! bounded chunks through a transport with a small send buffer.

pub mod config;
pub mod error;
pub mod http;
pub mod sensors;
pub mod server;
pub mod transport;
