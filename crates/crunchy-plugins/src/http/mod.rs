//! HTTP request and response values exchanged with route handlers.
//!
//! These are plain data: the server parses bytes into a [`Request`] and
//! serialises a [`Response`]; handlers never touch the socket.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::page::PageId;

/// Request methods the server dispatches.
///
/// Both are routed identically: inputs travel in the query string or the
/// body regardless of method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl Method {
    /// Canonical upper-case token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a method token is not `GET` or `POST`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported method '{0}'")]
pub struct UnsupportedMethod(pub String);

impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            other => Err(UnsupportedMethod(other.to_owned())),
        }
    }
}

/// Response status code with its reason phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(u16);

impl Status {
    /// `200 OK`
    pub const OK: Self = Self(200);
    /// `204 No Content`: feature disabled or nothing to return.
    pub const NO_CONTENT: Self = Self(204);
    /// `400 Bad Request`
    pub const BAD_REQUEST: Self = Self(400);
    /// `401 Unauthorized`
    pub const UNAUTHORIZED: Self = Self(401);
    /// `404 Not Found`
    pub const NOT_FOUND: Self = Self(404);
    /// `413 Payload Too Large`
    pub const PAYLOAD_TOO_LARGE: Self = Self(413);
    /// `500 Internal Server Error`
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);
    /// `501 Not Implemented`
    pub const NOT_IMPLEMENTED: Self = Self(501);

    /// Wraps an arbitrary status code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Numeric code.
    #[must_use]
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Reason phrase for the status line.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self.0 {
            200 => "OK",
            204 => "No Content",
            400 => "Bad Request",
            401 => "Unauthorized",
            404 => "Not Found",
            413 => "Payload Too Large",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason())
    }
}

/// One parsed request.
///
/// Header names are stored lower-cased; query arguments keep the last value
/// seen for a repeated key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: String,
    args: HashMap<String, String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    peer: Option<SocketAddr>,
}

impl Request {
    /// Creates a request with no arguments, headers, or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            args: HashMap::new(),
            headers: Vec::new(),
            body: Vec::new(),
            peer: None,
        }
    }

    /// Sets a query argument, replacing an earlier value for the same key.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Appends a header; the name is lower-cased.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Records the remote address.
    #[must_use]
    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Replaces the path, used when canonicalising resource families.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Percent-decoded path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query argument by key.
    #[must_use]
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }

    /// All query arguments.
    #[must_use]
    pub const fn args(&self) -> &HashMap<String, String> {
        &self.args
    }

    /// Correlation id of the originating element.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.arg("uid")
    }

    /// Page identity derived from [`Request::uid`].
    #[must_use]
    pub fn page_id(&self) -> Option<PageId> {
        self.uid().and_then(PageId::from_uid)
    }

    /// First header value for `name`, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Remote address, when known.
    #[must_use]
    pub const fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }
}

/// Response produced by a route handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    /// Creates a response with `status` and `body`.
    pub fn new(status: Status, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// `200` with `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(Status::OK, body)
    }

    /// `204` with an empty body.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(Status::NO_CONTENT, Vec::new())
    }

    /// `404` with a short plain-text body.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(Status::NOT_FOUND, "not found").with_content_type("text/plain; charset=utf-8")
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the `Content-Type` header, replacing an earlier one.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
        self.with_header("Content-Type", content_type)
    }

    /// Status code.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header value for `name`, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
