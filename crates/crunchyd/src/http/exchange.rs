//! Conversions between `tiny_http` requests and plugin-facing types.

use std::io::{self, Cursor, Read};
use std::net::SocketAddr;

use crunchy_plugins::{Response, Status};
use thiserror::Error;
use tiny_http::Header;

/// Errors raised while reading a request body.
#[derive(Debug, Error)]
pub(crate) enum BodyError {
    #[error("failed to read request body: {source}")]
    Io {
        #[source]
        source: io::Error,
    },
    #[error("request body of {length} bytes exceeds the {limit} byte limit")]
    TooLarge { length: usize, limit: usize },
    #[error("request body ended after {received} of {expected} bytes")]
    Incomplete { expected: usize, received: usize },
}

impl BodyError {
    /// Status sent back to the client for this error.
    pub(crate) const fn status(&self) -> Status {
        match self {
            Self::TooLarge { .. } => Status::PAYLOAD_TOO_LARGE,
            Self::Io { .. } | Self::Incomplete { .. } => Status::BAD_REQUEST,
        }
    }
}

/// Received request: its head plus a reader over the unread body.
pub(crate) struct Incoming<'a> {
    pub(crate) method: String,
    pub(crate) url: String,
    /// Lower-cased names with trimmed values, in arrival order.
    pub(crate) headers: Vec<(String, String)>,
    /// Declared `Content-Length`, if any.
    pub(crate) content_length: Option<usize>,
    pub(crate) peer: Option<SocketAddr>,
    pub(crate) body: &'a mut dyn Read,
}

impl<'a> Incoming<'a> {
    pub(crate) fn from_request(request: &'a mut tiny_http::Request) -> Self {
        let method = request.method().to_string();
        let url = request.url().to_owned();
        let headers = request
            .headers()
            .iter()
            .map(|header| {
                (
                    header.field.to_string().to_ascii_lowercase(),
                    header.value.as_str().trim().to_owned(),
                )
            })
            .collect();
        let content_length = request.body_length();
        let peer = request.remote_addr().copied();
        Self {
            method,
            url,
            headers,
            content_length,
            peer,
            body: request.as_reader(),
        }
    }

    /// First value of `name`, matched case-insensitively.
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl std::fmt::Debug for Incoming<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Incoming")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("content_length", &self.content_length)
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

/// Reads exactly the declared body; an absent length means an empty body.
pub(crate) fn read_body(
    body: &mut dyn Read,
    declared: Option<usize>,
    limit: usize,
) -> Result<Vec<u8>, BodyError> {
    let Some(length) = declared else {
        return Ok(Vec::new());
    };
    if length > limit {
        return Err(BodyError::TooLarge { length, limit });
    }
    let mut bytes = Vec::with_capacity(length);
    let expected = u64::try_from(length).unwrap_or(u64::MAX);
    body.take(expected)
        .read_to_end(&mut bytes)
        .map_err(|source| BodyError::Io { source })?;
    if bytes.len() < length {
        return Err(BodyError::Incomplete {
            expected: length,
            received: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Converts `response` for `tiny_http`.
///
/// `tiny_http` owns `Content-Length` and connection persistence, so
/// handler-supplied values for them are dropped, as are headers that are not
/// valid ASCII or contain line breaks.
pub(crate) fn into_wire(response: &Response) -> tiny_http::Response<Cursor<Vec<u8>>> {
    let mut wire = tiny_http::Response::from_data(response.body().to_vec())
        .with_status_code(response.status().code());
    for (name, value) in response.headers() {
        if is_managed(name) || has_line_break(name) || has_line_break(value) {
            continue;
        }
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            wire.add_header(header);
        }
    }
    wire
}

fn is_managed(name: &str) -> bool {
    name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("connection")
}

fn has_line_break(text: &str) -> bool {
    text.contains(['\r', '\n'])
}
