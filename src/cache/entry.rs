//! Cache entry and metadata types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::worker::FetchResponse;

/// A cached response, as recorded in its metadata file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Name of the cache holding this entry.
    pub cache_name: String,
    /// Request key (absolute URL without fragment).
    pub url: String,
    /// Response status.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Identifies the body file written alongside this metadata.
    pub body_id: String,
    /// Bookkeeping.
    pub metadata: CacheMetadata,
}

/// Bookkeeping for a cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When this entry was written.
    pub cached_at: DateTime<Utc>,
    /// ETag from the response, if any.
    pub etag: Option<String>,
    /// Body size in bytes.
    pub size_bytes: u64,
}

impl CacheEntry {
    /// Describe a response about to be stored.
    pub fn new(
        cache_name: impl Into<String>,
        url: impl Into<String>,
        response: &FetchResponse,
        body_id: impl Into<String>,
    ) -> Self {
        Self {
            cache_name: cache_name.into(),
            url: url.into(),
            status: response.status,
            headers: response.headers.clone(),
            body_id: body_id.into(),
            metadata: CacheMetadata {
                cached_at: Utc::now(),
                etag: response.header("etag").map(String::from),
                size_bytes: response.body.len() as u64,
            },
        }
    }

    /// Get the age of this entry.
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.metadata.cached_at)
    }

    /// Rebuild the response around a body read from disk.
    pub fn into_response(self, body: Vec<u8>) -> FetchResponse {
        FetchResponse {
            status: self.status,
            headers: self.headers,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_records_response_shape() {
        let response = FetchResponse::new(200, "body { color: red }")
            .with_header("content-type", "text/css")
            .with_header("ETag", "\"abc123\"");

        let entry = CacheEntry::new(
            "v1-runtime",
            "http://localhost:8000/css/styles.css",
            &response,
            "1a2b",
        );

        assert_eq!(entry.cache_name, "v1-runtime");
        assert_eq!(entry.status, 200);
        assert_eq!(entry.metadata.size_bytes, 19);
        assert_eq!(entry.metadata.etag, Some("\"abc123\"".to_string()));
    }

    #[test]
    fn into_response_restores_headers() {
        let response = FetchResponse::new(200, "x").with_header("content-type", "image/png");
        let entry = CacheEntry::new("v1-precache", "http://h/a.png", &response, "1a2b");

        let restored = entry.into_response(b"x".to_vec());
        assert_eq!(restored, response);
    }

    #[test]
    fn cache_entry_age() {
        let response = FetchResponse::new(200, "");
        let entry = CacheEntry::new("v1-runtime", "http://h/", &response, "1a2b");

        // Age should be very small (< 1 second)
        assert!(entry.age().num_seconds() < 1);
    }
}
