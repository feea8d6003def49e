//! Intercepted requests and how each is routed.

use reqwest::{Method, Url};
use std::fmt;

/// Extensions answered from the cache first, from any origin.
const STATIC_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "avif", "svg", "ico", "woff", "woff2", "ttf", "otf",
    "eot",
];

/// Same-origin extensions served stale while a fresh copy is fetched.
const REVALIDATED_EXTENSIONS: &[&str] = &["js", "mjs", "css"];

/// How the page initiated a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Top-level page navigation.
    Navigate,
    /// Script, stylesheet, image or any other resource a page loads.
    Subresource,
}

/// A request the worker may intercept.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    /// `Accept` header, if the page sent one.
    pub accept: Option<String>,
}

impl FetchRequest {
    /// A plain subresource GET.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            mode: RequestMode::Subresource,
            accept: None,
        }
    }

    /// A page navigation.
    pub fn navigate(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            mode: RequestMode::Navigate,
            accept: Some("text/html".to_string()),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Navigations are requests in navigate mode, or GETs that ask for HTML.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
            || (self.method == Method::GET
                && self
                    .accept
                    .as_deref()
                    .is_some_and(|a| a.contains("text/html")))
    }

    /// Key used to store and find this request in a cache.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }

    /// Lowercased extension of the last path segment.
    pub fn extension(&self) -> Option<String> {
        let segment = self.url.path_segments()?.next_back()?;
        let (stem, ext) = segment.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Whether the request targets `origin`'s scheme, host and port.
    pub fn is_same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }
}

/// The caching strategy applied to an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Not a GET: forwarded untouched, never cached.
    PassThrough,
    /// Pages: network, then cache, then the offline page.
    NetworkFirst,
    /// Same-origin scripts and stylesheets.
    StaleWhileRevalidate,
    /// Images and fonts.
    CacheFirst,
    /// Any other GET.
    NetworkOnly,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass-through",
            Self::NetworkFirst => "network-first",
            Self::StaleWhileRevalidate => "stale-while-revalidate",
            Self::CacheFirst => "cache-first",
            Self::NetworkOnly => "network-only",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pick the strategy for a request against the site's origin.
///
/// Rules apply in order: non-GET, navigation, same-origin script or
/// stylesheet, image or font from anywhere, then everything else.
pub fn classify(request: &FetchRequest, origin: &Url) -> Strategy {
    if request.method != Method::GET {
        return Strategy::PassThrough;
    }

    if request.is_navigation() {
        return Strategy::NetworkFirst;
    }

    let ext = request.extension();
    let ext = ext.as_deref();

    if request.is_same_origin(origin) && ext.is_some_and(|e| REVALIDATED_EXTENSIONS.contains(&e))
    {
        return Strategy::StaleWhileRevalidate;
    }

    if ext.is_some_and(|e| STATIC_EXTENSIONS.contains(&e)) {
        return Strategy::CacheFirst;
    }

    Strategy::NetworkOnly
}
