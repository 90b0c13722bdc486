//! The fixture page.
//!
//! Every recognized query parameter is mapped onto response headers or a
//! labeled `<div>` of the HTML body. Values flow through as raw bytes: the
//! `X-Custom` header and the `reflect` section are the injection points a
//! scanner is expected to find, so they must stay unescaped.

use rand::Rng;

use crate::{
    query::FixtureQuery,
    random::{rand_string, RANDOM_LEN},
    response::{Response, Status},
};

/// Builds the fixture response for one request. Never fails; missing or odd
/// parameters fall back to the empty branch.
pub fn respond<R: Rng + ?Sized>(query: &FixtureQuery, rng: &mut R) -> Response {
    let mut response = Response::new(Status::OK);
    response.headers.set("Content-Type", DEFAULT_CONTENT_TYPE);

    let mut body = Vec::with_capacity(BODY_CAPACITY);

    if let Some(crlf) = query.crlf() {
        if !has_quote(crlf) {
            body.extend_from_slice(HEADER_APPEAR_MARKER.as_bytes());
            response.headers.set("X-Deleted", "true");
            response.headers.set("X-Appear", "APPEAR");
        } else {
            response.headers.set("X-Appear", "false");
        }

        response.headers.set("Content-Type", "text/plain");
        response.headers.set("X-Custom", crlf);
        response
            .headers
            .set("Cache-Control", "no-cache, must-revalidate");
    }

    push_page_head(&mut body);
    body.extend_from_slice(PAGE_STATIC_SECTIONS.as_bytes());

    let random = match query.randomness() {
        Some(_) => rand_string(rng, RANDOM_LEN),
        None => String::new(),
    };
    push_section(&mut body, "dynamic", random.as_bytes());
    push_section(&mut body, "reflect", &reflect(query.reflect()));
    push_section(&mut body, "disappear", &disappear(query.disappear()));

    body.extend_from_slice(PAGE_TAIL.as_bytes());
    response.body = body;
    response
}

fn reflect(value: Option<&[u8]>) -> Vec<u8> {
    match value {
        Some(value) => [&b"Reflect"[..], value].concat(),
        None => b"reflect parameter is missing".to_vec(),
    }
}

fn disappear(value: Option<&[u8]>) -> Vec<u8> {
    let Some(value) = value else {
        return Vec::new();
    };
    let mut result = b"<p>disappear result: ".to_vec();
    if !has_quote(value) {
        result.extend_from_slice(b"APPEAR");
    }
    result.extend_from_slice(b"</p>");
    result
}

fn has_quote(value: &[u8]) -> bool {
    value.contains(&b'"')
}

fn push_page_head(body: &mut Vec<u8>) {
    for part in [
        "<html>\n<head>\n<title>",
        TITLE,
        "</title>\n</head>\n<body>\n<h1>",
        TITLE,
        "</h1>\n<h3>",
        DESCRIPTION,
        "</h3>\n\n",
    ] {
        body.extend_from_slice(part.as_bytes());
    }
}

fn push_section(body: &mut Vec<u8>, class: &str, content: &[u8]) {
    body.extend_from_slice(b"<div class=\"");
    body.extend_from_slice(class.as_bytes());
    body.extend_from_slice(b"\">\n");
    if !content.is_empty() {
        body.extend_from_slice(content);
        body.push(b'\n');
    }
    body.extend_from_slice(b"</div>\n\n");
}

pub const TITLE: &str = "Firefly testserver";
pub const DESCRIPTION: &str = "dynamic black box testing";

const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=UTF-8";
const HEADER_APPEAR_MARKER: &str = "HEADER => APPEAR";
const BODY_CAPACITY: usize = 1024;

const PAGE_STATIC_SECTIONS: &str = "<!-- vulnerabilities -->
<div class=\"xss\">
</div>

<div class=\"ssti\">
</div>

<div class=\"sqli\">
</div>

<div class=\"crlf\">
</div>

<!-- behaviors -->
<div class=\"transformation\">
</div>

<!-- dynamic content -->
";

const PAGE_TAIL: &str = "</body>\n</html>\n";
