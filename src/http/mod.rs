//! HTTP side of the panel server.
//!
//! Deliberately minimal: only the request line is read, every response
//! carries `Connection: close`, and there is no transfer encoding. Large
//! bodies are split into chunks on the write path only.
//!
//! # Submodules
//!
//! - **`parser`** / **`request`**: request-line parsing, used for logging
//! - **`router`**: the static route table and the single-write handlers
//! - **`response`**: response representation with builder pattern
//! - **`page`**: the index page rendered for `GET /`
//! - **`connection`**: per-connection send progress ([`ConnectionState`])
//! - **`sender`**: chunked transmission of a [`ConnectionState`] body
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │  Accepted   │ ← receive callback armed
//!        └──────┬──────┘
//!               │ request bytes
//!               ▼
//!        ┌──────────────────┐   /status, /joystick, 404
//!        │    Receiving     │ ─────────────────────────┐
//!        └──────┬───────────┘                          │
//!               │ GET /                                │
//!               ▼                                      │
//!        ┌──────────────────┐                          │
//!        │    Responding    │ ← re-entered per ack     │
//!        └──────┬───────────┘                          │
//!               │ last chunk written                   │
//!               ▼                                      ▼
//!        ┌──────────────────────────────────────────────────┐
//!        │   Closed   (also reached on error or peer close) │
//!        └──────────────────────────────────────────────────┘
//! ```
//!
//! A new request on a `Responding` connection goes back through
//! `Receiving` and restarts the transfer with a fresh body.

pub mod connection;
pub mod page;
pub mod parser;
pub mod request;
pub mod response;
pub mod router;
pub mod sender;

pub use connection::{Body, ConnectionState};
pub use router::Route;
pub use sender::{Progress, pump};
