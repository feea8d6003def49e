//! Responses as seen by the worker.

use std::borrow::Cow;

/// A buffered HTTP response, from the network or from a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Header pairs in arrival order.
    pub headers: Vec<(String, String)>,
    /// Full body.
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Create a response with no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The terminal fallback when neither network nor cache can answer.
    pub fn service_unavailable() -> Self {
        Self::new(503, "Service Unavailable")
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_header("cache-control", "no-store")
    }

    /// First value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the status is 2xx.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the response may be written to a cache.
    ///
    /// Partial content is excluded: a 206 body is not the resource.
    pub fn is_cacheable(&self) -> bool {
        self.is_ok() && self.status != 206
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
