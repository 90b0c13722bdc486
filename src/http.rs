use crate::error::{Error, Result};

const MAX_HEADERS: usize = 64;

/// The parts of an HTTP/1.x request head the fixture cares about. Owned so
/// the read buffer can be advanced past the head right away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub target: String,
    pub keep_alive: bool,
    /// Length of a `Content-Length` body that follows the head and has to be
    /// skipped before the next request.
    pub body_len: usize,
    /// Bytes taken by the request line and headers, including the blank line.
    pub head_len: usize,
}

impl RequestHead {
    pub fn is_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("HEAD")
    }
}

/// Parses a request head from the start of `buf`.
///
/// Returns `Ok(None)` while the head is incomplete and still within
/// `max_head_bytes`.
pub fn parse_head(buf: &[u8], max_head_bytes: usize) -> Result<Option<RequestHead>> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    let status = req.parse(buf)?;

    let httparse::Status::Complete(head_len) = status else {
        if buf.len() > max_head_bytes {
            return Err(Error::HeadTooLarge {
                limit: max_head_bytes,
            });
        }
        return Ok(None);
    };
    if head_len > max_head_bytes {
        return Err(Error::HeadTooLarge {
            limit: max_head_bytes,
        });
    }

    let (Some(method), Some(target), Some(version)) = (req.method, req.path, req.version) else {
        return Err(Error::InvalidHttpRequest(httparse::Error::Token));
    };

    let mut body_len = None;
    let mut connection_close = None;
    for header in req.headers.iter() {
        if header.name.eq_ignore_ascii_case("Content-Length") {
            let len = parse_content_length(header.value)?;
            if body_len.is_some_and(|seen| seen != len) {
                return Err(Error::InvalidContentLength);
            }
            body_len = Some(len);
        } else if header.name.eq_ignore_ascii_case("Transfer-Encoding") {
            return Err(Error::UnsupportedTransferEncoding);
        } else if header.name.eq_ignore_ascii_case("Connection") {
            if has_token(header.value, "close") {
                connection_close = Some(true);
            } else if has_token(header.value, "keep-alive") {
                connection_close.get_or_insert(false);
            }
        }
    }

    let keep_alive = match (version, connection_close) {
        (_, Some(close)) => !close,
        (1, None) => true,
        (_, None) => false,
    };

    Ok(Some(RequestHead {
        method: method.to_string(),
        target: target.to_string(),
        keep_alive,
        body_len: body_len.unwrap_or(0),
        head_len,
    }))
}

fn parse_content_length(value: &[u8]) -> Result<usize> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .ok_or(Error::InvalidContentLength)
}

fn has_token(value: &[u8], token: &str) -> bool {
    String::from_utf8_lossy(value)
        .split(',')
        .any(|part| part.trim().eq_ignore_ascii_case(token))
}
