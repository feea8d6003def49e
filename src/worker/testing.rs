//! In-memory network for worker tests.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::network::Network;
use super::request::FetchRequest;
use super::response::FetchResponse;

const ORIGIN: &str = "http://localhost:8000";

/// Serves canned responses by URL and can be switched offline.
pub(crate) struct FakeNetwork {
    routes: Mutex<HashMap<String, FetchResponse>>,
    calls: Mutex<Vec<String>>,
    online: AtomicBool,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            online: AtomicBool::new(true),
        }
    }

    /// Serve `response` for a path on the test origin, or a full URL.
    pub fn route(&self, path_or_url: &str, response: FetchResponse) {
        let url = if path_or_url.starts_with('/') {
            format!("{ORIGIN}{path_or_url}")
        } else {
            path_or_url.to_string()
        };
        self.routes.lock().unwrap().insert(url, response);
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of fetches made for a URL, online or not.
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

impl Network for FakeNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let url = request.cache_key();
        self.calls.lock().unwrap().push(url.clone());

        if !self.online.load(Ordering::SeqCst) {
            bail!("offline");
        }

        let response = self.routes.lock().unwrap().get(&url).cloned();
        Ok(response.unwrap_or_else(|| FetchResponse::new(404, "not found")))
    }
}
