use std::borrow::Cow;

use bytes::{BufMut, BytesMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub code: u16,
    pub reason: &'static str,
}

impl Status {
    pub const OK: Status = Status::new(200, "OK");
    pub const BAD_REQUEST: Status = Status::new(400, "Bad Request");
    pub const REQUEST_HEADER_FIELDS_TOO_LARGE: Status =
        Status::new(431, "Request Header Fields Too Large");

    const fn new(code: u16, reason: &'static str) -> Self {
        Self { code, reason }
    }
}

/// Ordered response headers.
///
/// `set` behaves like PHP's `header()`: it replaces an earlier header with
/// the same (case-insensitive) name in place, otherwise appends. Values are
/// stored and written as raw bytes. Nothing here strips CR or LF or checks
/// the encoding, so a value containing them produces extra header lines on
/// the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(Cow<'static, str>, Vec<u8>)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Vec<u8>>) {
        let name = name.into();
        let value = value.into();
        match self
            .0
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => *slot = (name, value),
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.0
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_ref(), value.as_slice()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Status line, headers and body.
    Full,
    /// Answer to a `HEAD` request: the body is left out, its length is not.
    HeadOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Bare response for a request that could not be parsed.
    pub fn transport_error(status: Status) -> Self {
        let mut response = Self::new(status);
        response.headers.set("Content-Type", "text/plain");
        response.body = format!("{} {}\n", status.code, status.reason).into_bytes();
        response
    }

    /// Writes the response onto `out` exactly as stored. `Content-Length` is
    /// always derived from the body; `Connection: close` is added when the
    /// connection will not be reused.
    pub fn encode(&self, out: &mut BytesMut, encoding: Encoding, keep_alive: bool) {
        out.reserve(HEAD_RESERVE + self.body.len());
        out.put_slice(b"HTTP/1.1 ");
        out.put_slice(self.status.code.to_string().as_bytes());
        out.put_u8(b' ');
        out.put_slice(self.status.reason.as_bytes());
        out.put_slice(CRLF);

        for (name, value) in self.headers.iter() {
            put_header(out, name.as_bytes(), value);
        }
        put_header(out, b"Content-Length", self.body.len().to_string().as_bytes());
        if !keep_alive {
            put_header(out, b"Connection", b"close");
        }
        out.put_slice(CRLF);

        if encoding == Encoding::Full {
            out.put_slice(&self.body);
        }
    }
}

fn put_header(out: &mut BytesMut, name: &[u8], value: &[u8]) {
    out.put_slice(name);
    out.put_slice(b": ");
    out.put_slice(value);
    out.put_slice(CRLF);
}

const CRLF: &[u8] = b"\r\n";
const HEAD_RESERVE: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(response: &Response, encoding: Encoding, keep_alive: bool) -> String {
        let mut out = BytesMut::new();
        response.encode(&mut out, encoding, keep_alive);
        String::from_utf8(out.to_vec()).unwrap()
    }

    #[test]
    fn set_replaces_case_insensitively_in_place() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/html");
        headers.set("X-Appear", "APPEAR");
        headers.set("content-type", "text/plain");
        let collected: Vec<_> = headers.iter().collect();
        assert_eq!(
            collected,
            vec![
                ("content-type", &b"text/plain"[..]),
                ("X-Appear", &b"APPEAR"[..])
            ]
        );
        assert_eq!(headers.get("CONTENT-TYPE"), Some(&b"text/plain"[..]));
    }

    #[test]
    fn encodes_status_headers_and_body() {
        let mut response = Response::new(Status::OK);
        response.headers.set("X-Custom", "test");
        response.body = b"hello".to_vec();
        assert_eq!(
            encode(&response, Encoding::Full, true),
            "HTTP/1.1 200 OK\r\nX-Custom: test\r\nContent-Length: 5\r\n\r\nhello"
        );
    }

    #[test]
    fn head_only_keeps_length_and_closes() {
        let mut response = Response::new(Status::OK);
        response.body = b"hello".to_vec();
        assert_eq!(
            encode(&response, Encoding::HeadOnly, false),
            "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn header_values_are_written_verbatim() {
        let mut response = Response::new(Status::OK);
        response.headers.set("X-Custom", "a\r\nX-Injected: yes");
        let encoded = encode(&response, Encoding::Full, true);
        assert!(encoded.contains("\r\nX-Custom: a\r\nX-Injected: yes\r\n"));
    }

    #[test]
    fn non_utf8_bytes_are_written_verbatim() {
        let mut response = Response::new(Status::OK);
        response.headers.set("X-Custom", &b"a\xFFb"[..]);
        response.body = b"Reflect\xFE".to_vec();
        let mut out = BytesMut::new();
        response.encode(&mut out, Encoding::Full, true);
        assert_eq!(
            &out[..],
            &b"HTTP/1.1 200 OK\r\nX-Custom: a\xFFb\r\nContent-Length: 8\r\n\r\nReflect\xFE"[..]
        );
    }

    #[test]
    fn transport_error_body() {
        let response = Response::transport_error(Status::BAD_REQUEST);
        assert_eq!(response.body, b"400 Bad Request\n");
        assert_eq!(response.headers.get("content-type"), Some(&b"text/plain"[..]));
    }
}
