mod common;

use common::FixedSensors;
use status_panel::http::router::{Route, resolve};
use status_panel::http::response::StatusCode;

#[test]
fn test_resolve_routes_in_order() {
    assert_eq!(resolve(b"GET /status HTTP/1.1\r\n\r\n"), Route::Status);
    assert_eq!(resolve(b"GET /joystick HTTP/1.1\r\n\r\n"), Route::Joystick);
    assert_eq!(resolve(b"GET / HTTP/1.1\r\n\r\n"), Route::Index);
    assert_eq!(resolve(b"GET /nope HTTP/1.1\r\n\r\n"), Route::NotFound);
}

#[test]
fn test_root_needs_trailing_space() {
    assert_eq!(resolve(b"GET /"), Route::NotFound);
    assert_eq!(resolve(b"GET /favicon.ico HTTP/1.1"), Route::NotFound);
}

#[test]
fn test_match_is_anchored_at_start() {
    assert_eq!(resolve(b"xGET /status HTTP/1.1"), Route::NotFound);
    assert_eq!(resolve(b"HEAD /status HTTP/1.1"), Route::NotFound);
}

#[test]
fn test_only_index_is_chunked() {
    assert!(Route::Index.is_chunked());
    assert!(!Route::Status.is_chunked());
    assert!(!Route::Joystick.is_chunked());
    assert!(!Route::NotFound.is_chunked());
}

#[test]
fn test_status_payload() {
    let sensors = FixedSensors::default();
    sensors.b.set(true);

    let response = Route::Status.respond(&sensors).unwrap().unwrap();

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.header("Content-Type"), Some("application/json"));
    let json: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(json, serde_json::json!({"botao_a_press": false, "botao_b_press": true}));
}

#[test]
fn test_joystick_payload() {
    let sensors = FixedSensors::default();
    sensors.x.set(0);
    sensors.y.set(73);

    let response = Route::Joystick.respond(&sensors).unwrap().unwrap();

    let json: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(json, serde_json::json!({"joystick_x": 0, "joystick_y": 73}));
}

#[test]
fn test_not_found_has_empty_body() {
    let response = Route::NotFound
        .respond(&FixedSensors::default())
        .unwrap()
        .unwrap();

    assert_eq!(response.status, StatusCode::NotFound);
    assert!(response.body.is_empty());
    assert_eq!(response.header("Content-Length"), Some("0"));
}

#[test]
fn test_index_has_no_single_write_reply() {
    assert!(Route::Index.respond(&FixedSensors::default()).unwrap().is_none());
}
