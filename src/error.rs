use std::io;

/// Transport-level failures. The fixture responder itself never fails; these
/// only end the connection they occurred on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid http request: {0}")]
    InvalidHttpRequest(#[from] httparse::Error),
    #[error("request head too large (> {limit} bytes)")]
    HeadTooLarge { limit: usize },
    #[error("invalid Content-Length header")]
    InvalidContentLength,
    #[error("unsupported request body framing (Transfer-Encoding)")]
    UnsupportedTransferEncoding,
}

impl Error {
    /// Status line to answer with before closing, if the peer is still worth
    /// talking to.
    pub fn status(&self) -> Option<crate::response::Status> {
        use crate::response::Status;
        match self {
            Error::Io(_) => None,
            Error::HeadTooLarge { .. } => Some(Status::REQUEST_HEADER_FIELDS_TOO_LARGE),
            Error::InvalidHttpRequest(_)
            | Error::InvalidContentLength
            | Error::UnsupportedTransferEncoding => Some(Status::BAD_REQUEST),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
