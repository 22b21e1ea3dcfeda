use crate::http::request::{Method, RequestLine};

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    InvalidRequest,
    InvalidMethod,
    InvalidUtf8,
}

/// Parses the request line at the start of `buf`.
///
/// The line ends at the first CRLF, or at the end of the buffer when the
/// client sent a bare line. Everything after it is ignored.
pub fn parse_request_line(buf: &[u8]) -> Result<RequestLine, ParseError> {
    let line_end = find_line_end(buf).unwrap_or(buf.len());
    let line = std::str::from_utf8(&buf[..line_end]).map_err(|_| ParseError::InvalidUtf8)?;

    if line.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parts = line.split_whitespace();

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let path = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    if parts.next().is_some() {
        return Err(ParseError::InvalidRequest);
    }

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;

    Ok(RequestLine {
        method,
        path: path.to_string(),
        version: version.to_string(),
    })
}

fn find_line_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
