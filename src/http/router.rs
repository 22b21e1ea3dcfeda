//! Route table.
//!
//! Requests are matched by literal prefix on the raw inbound bytes, in table
//! order; the first match wins. `"GET / "` keeps its trailing space so that
//! only the root path selects the page.

use serde::Serialize;

use crate::error::ServerError;
use crate::http::response::Response;
use crate::sensors::{Axis, Button, Sensors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Button states as JSON, one write.
    Status,
    /// Joystick position as JSON, one write.
    Joystick,
    /// The index page, sent in chunks.
    Index,
    NotFound,
}

const ROUTES: &[(&[u8], Route)] = &[
    (b"GET /status", Route::Status),
    (b"GET /joystick", Route::Joystick),
    (b"GET / ", Route::Index),
];

/// Picks the route for a raw request.
pub fn resolve(request: &[u8]) -> Route {
    ROUTES
        .iter()
        .find(|(prefix, _)| request.starts_with(prefix))
        .map(|&(_, route)| route)
        .unwrap_or(Route::NotFound)
}

impl Route {
    /// Whether the reply is streamed by the chunked sender.
    pub fn is_chunked(&self) -> bool {
        matches!(self, Route::Index)
    }

    /// Builds a single-write reply, sampling sensors now.
    ///
    /// Returns `None` for chunked routes.
    pub fn respond<S: Sensors + ?Sized>(&self, sensors: &S) -> Result<Option<Response>, ServerError> {
        let response = match self {
            Route::Status => {
                let payload = ButtonStatus {
                    botao_a_press: sensors.is_pressed(Button::A),
                    botao_b_press: sensors.is_pressed(Button::B),
                };
                Response::json(serde_json::to_vec(&payload)?)
            }
            Route::Joystick => {
                let payload = JoystickPosition {
                    joystick_x: sensors.read_axis(Axis::X),
                    joystick_y: sensors.read_axis(Axis::Y),
                };
                Response::json(serde_json::to_vec(&payload)?)
            }
            Route::NotFound => Response::not_found(),
            Route::Index => return Ok(None),
        };
        Ok(Some(response))
    }
}

/// Body of `GET /status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ButtonStatus {
    pub botao_a_press: bool,
    pub botao_b_press: bool,
}

/// Body of `GET /joystick`. Both axes are in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoystickPosition {
    pub joystick_x: u8,
    pub joystick_y: u8,
}
