use std::net::SocketAddr;
use std::time::Duration;

use status_panel::config::Limits;
use status_panel::http::page::render_index;
use status_panel::sensors::{Axis, Button, Sensors};
use status_panel::server::listener::serve;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

struct Pressed;

impl Sensors for Pressed {
    fn read_axis(&self, axis: Axis) -> u8 {
        match axis {
            Axis::X => 25,
            Axis::Y => 75,
        }
    }

    fn is_pressed(&self, button: Button) -> bool {
        button == Button::A
    }
}

async fn start(send_buffer: usize) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, Limits::default(), send_buffer, Pressed));
    addr
}

async fn fetch(addr: SocketAddr, request: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(request).await?;

    let mut response = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("server did not close the connection")?;
    Ok(response)
}

#[tokio::test]
async fn test_index_page_over_socket() {
    let addr = start(2920).await;

    let response = fetch(addr, b"GET / HTTP/1.1\r\nHost: panel\r\n\r\n")
        .await
        .unwrap();

    assert_eq!(response, render_index().unwrap());
}

#[tokio::test]
async fn test_index_page_with_one_chunk_send_buffer() {
    let addr = start(512).await;

    let response = fetch(addr, b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

    assert_eq!(response, render_index().unwrap());
}

#[tokio::test]
async fn test_status_over_socket() {
    let addr = start(2920).await;

    let response = fetch(addr, b"GET /status HTTP/1.1\r\n\r\n").await.unwrap();
    let response = String::from_utf8(response).unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with("{\"botao_a_press\":true,\"botao_b_press\":false}"));
}

#[tokio::test]
async fn test_joystick_over_socket() {
    let addr = start(2920).await;

    let response = fetch(addr, b"GET /joystick HTTP/1.1\r\n\r\n").await.unwrap();
    let response = String::from_utf8(response).unwrap();

    assert!(response.ends_with("{\"joystick_x\":25,\"joystick_y\":75}"));
}

#[tokio::test]
async fn test_not_found_over_socket() {
    let addr = start(2920).await;

    let response = fetch(addr, b"GET /missing HTTP/1.1\r\n\r\n").await.unwrap();

    assert_eq!(
        response,
        b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec()
    );
}

#[tokio::test]
async fn test_oversized_request_gets_no_reply() {
    let addr = start(2920).await;

    let mut request = b"GET /status HTTP/1.1\r\n".to_vec();
    request.resize(1024, b'a');

    // an abort may surface as a reset instead of a clean EOF
    match fetch(addr, &request).await {
        Ok(response) => assert!(response.is_empty()),
        Err(_) => {}
    }
}

#[tokio::test]
async fn test_server_survives_client_that_hangs_up() {
    let addr = start(512).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    drop(stream);

    let response = fetch(addr, b"GET /status HTTP/1.1\r\n\r\n").await.unwrap();
    assert!(response.starts_with(b"HTTP/1.1 200 OK"));
}
