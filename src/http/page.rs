use crate::error::ServerError;
use crate::http::response::Response;

/// Page served on `GET /`. It polls `/status` and `/joystick` every second.
pub const INDEX_HTML: &str = include_str!("index.html");

/// Size of the buffer the page is rendered into.
pub const PAGE_BUFFER_LEN: usize = 4096;

const _: () = assert!(INDEX_HTML.len() <= PAGE_BUFFER_LEN);

/// Renders the full index response, head included, into a freshly
/// allocated buffer.
pub fn render_index() -> Result<Vec<u8>, ServerError> {
    let response = Response::html(INDEX_HTML);

    let mut buf = Vec::new();
    buf.try_reserve_exact(response.head_len() + response.body.len())?;
    response.write_into(&mut buf);
    Ok(buf)
}
