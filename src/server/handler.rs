//! The static file request handler.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{ALLOW, CACHE_CONTROL, CONTENT_TYPE, LOCATION},
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use super::assets::CacheControl;
use super::resolve::{resolve, strip_query, ResolvedPath};
use super::state::ServeState;

const HTML: &str = "text/html; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";

/// Body used when the configured 404 document is unavailable.
pub const FALLBACK_NOT_FOUND: &str = "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>404 Not Found</title></head>\
<body><h1>404 Not Found</h1><p>The page you are looking for does not exist.</p><p><a href=\"/\">Back to the home page</a></p></body></html>\n";

enum ReadError {
    NotFound,
    Directory(PathBuf),
    Escaped(PathBuf),
    Io(std::io::Error),
}

/// Axum entry point: every path on the router ends up here.
pub async fn serve_static(
    State(state): State<Arc<ServeState>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        debug!("{} {} not allowed", method, uri);
        return method_not_allowed();
    }

    // HEAD shares the GET response; hyper drops the body but keeps Content-Length.
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    handle(&state, target).await
}

/// Produce the response for a raw request target (`path?query`).
pub async fn handle(state: &ServeState, target: &str) -> Response {
    let resolved = match resolve(&state.root, target, &state.index) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!("Rejected {}: {}", target, e);
            return forbidden();
        }
    };

    match read_under_root(&state.root, &resolved.file).await {
        Ok(contents) => {
            debug!("200 {} ({} bytes)", resolved.request_path, contents.len());
            found(state, &resolved, contents)
        }
        Err(ReadError::NotFound) => {
            debug!("404 {}", resolved.request_path);
            not_found(state).await
        }
        Err(ReadError::Directory(_)) => {
            let location = format!("{}/", strip_query(target).trim_end_matches('/'));
            debug!("301 {} -> {}", target, location);
            redirect(&location)
        }
        Err(ReadError::Escaped(path)) => {
            warn!(
                "Rejected {}: resolves outside the root to {}",
                target,
                path.display()
            );
            forbidden()
        }
        Err(ReadError::Io(e)) => {
            error!("Failed to read {}: {}", resolved.file.display(), e);
            internal_error()
        }
    }
}

/// Canonicalize `file`, confirm it is still inside `root`, then read it.
async fn read_under_root(root: &Path, file: &Path) -> Result<Vec<u8>, ReadError> {
    let canonical = tokio::fs::canonicalize(file)
        .await
        .map_err(classify_io)?;

    if !canonical.starts_with(root) {
        return Err(ReadError::Escaped(canonical));
    }

    let metadata = tokio::fs::metadata(&canonical).await.map_err(classify_io)?;
    if metadata.is_dir() {
        return Err(ReadError::Directory(canonical));
    }

    tokio::fs::read(&canonical).await.map_err(classify_io)
}

fn classify_io(e: std::io::Error) -> ReadError {
    match e.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => ReadError::NotFound,
        _ => ReadError::Io(e),
    }
}

fn found(state: &ServeState, resolved: &ResolvedPath, contents: Vec<u8>) -> Response {
    let asset = state.assets.classify(Path::new(&resolved.request_path));

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(asset.content_type));

    let policy = if state.is_no_cache(&resolved.request_path) {
        headers.insert(
            HeaderName::from_static("service-worker-allowed"),
            HeaderValue::from_static("/"),
        );
        CacheControl::Revalidate
    } else {
        asset.cache_control()
    };

    for (name, value) in policy.headers() {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }

    (StatusCode::OK, headers, contents).into_response()
}

async fn not_found(state: &ServeState) -> Response {
    let page = state.root.join(&state.not_found);

    let body = match tokio::fs::read(&page).await {
        Ok(contents) => contents,
        Err(e) => {
            debug!("No custom 404 page at {}: {}", page.display(), e);
            FALLBACK_NOT_FOUND.as_bytes().to_vec()
        }
    };

    (
        StatusCode::NOT_FOUND,
        [
            (CONTENT_TYPE, HeaderValue::from_static(HTML)),
            (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        body,
    )
        .into_response()
}

fn forbidden() -> Response {
    plain(StatusCode::FORBIDDEN, "403 Forbidden")
}

fn internal_error() -> Response {
    plain(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

fn method_not_allowed() -> Response {
    let mut response = plain(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
    response
}

fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (
            StatusCode::MOVED_PERMANENTLY,
            [(LOCATION, value)],
            Body::empty(),
        )
            .into_response(),
        Err(_) => forbidden(),
    }
}

fn plain(status: StatusCode, body: &'static str) -> Response {
    (
        status,
        [
            (CONTENT_TYPE, HeaderValue::from_static(TEXT)),
            (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerSettings;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, ServeState) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("public");
        fs::create_dir_all(root.join("images")).unwrap();
        fs::create_dir_all(root.join("en")).unwrap();
        fs::write(root.join("index.html"), "<h1>Trattoria</h1>").unwrap();
        fs::write(root.join("en").join("index.html"), "<h1>English</h1>").unwrap();
        fs::write(root.join("images").join("gallery-1.webp"), b"RIFF").unwrap();
        fs::write(root.join("sw.js"), "self.addEventListener('fetch', () => {});").unwrap();

        let settings = ServerSettings {
            root,
            ..ServerSettings::default()
        };
        let state = ServeState::from_settings(&settings).unwrap();
        (temp, state)
    }

    fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn root_serves_index_without_caching() {
        let (_temp, state) = site();
        let response = handle(&state, "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header(&response, "cache-control"),
            Some("no-cache, no-store, must-revalidate")
        );
        assert_eq!(header(&response, "pragma"), Some("no-cache"));
        assert_eq!(header(&response, "expires"), Some("0"));
    }

    #[tokio::test]
    async fn image_is_cached_for_a_year() {
        let (_temp, state) = site();
        let response = handle(&state, "/images/gallery-1.webp").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "content-type"), Some("image/webp"));
        assert_eq!(
            header(&response, "cache-control"),
            Some("public, max-age=31536000, immutable")
        );
    }

    #[tokio::test]
    async fn worker_script_is_never_cached() {
        let (_temp, state) = site();
        let response = handle(&state, "/sw.js").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header(&response, "cache-control"),
            Some("no-cache, no-store, must-revalidate")
        );
        assert_eq!(header(&response, "service-worker-allowed"), Some("/"));
    }

    #[tokio::test]
    async fn traversal_is_forbidden() {
        let (_temp, state) = site();
        let response = handle(&state, "/../../etc/passwd").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_file_uses_inline_page_without_custom_404() {
        let (_temp, state) = site();
        let response = handle(&state, "/nope.css").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(header(&response, "cache-control"), Some("no-cache"));
        assert_eq!(header(&response, "content-type"), Some(HTML));
    }

    #[tokio::test]
    async fn directory_without_slash_redirects() {
        let (_temp, state) = site();
        let response = handle(&state, "/en?lang=en").await;

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(header(&response, "location"), Some("/en/"));
    }

    #[tokio::test]
    async fn directory_with_slash_serves_its_index() {
        let (_temp, state) = site();
        let response = handle(&state, "/en/").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn every_known_extension_gets_its_type_and_lifetime() {
        let (_temp, state) = site();

        for (ext, asset) in state.assets.iter() {
            let name = format!("asset{}", ext);
            fs::write(state.root.join(&name), b"x").unwrap();

            let response = handle(&state, &format!("/{}", name)).await;

            assert_eq!(response.status(), StatusCode::OK, "{}", ext);
            assert_eq!(
                header(&response, "content-type"),
                Some(asset.content_type),
                "{}",
                ext
            );

            if asset.max_age == 0 {
                assert_eq!(
                    header(&response, "cache-control"),
                    Some("no-cache, no-store, must-revalidate"),
                    "{}",
                    ext
                );
                assert_eq!(header(&response, "pragma"), Some("no-cache"), "{}", ext);
                assert_eq!(header(&response, "expires"), Some("0"), "{}", ext);
            } else {
                let expected = format!("public, max-age={}, immutable", asset.max_age);
                assert_eq!(
                    header(&response, "cache-control"),
                    Some(expected.as_str()),
                    "{}",
                    ext
                );
            }
        }
    }

    #[tokio::test]
    async fn unreadable_path_is_a_generic_500() {
        let (_temp, state) = site();
        // Longer than any filesystem's name limit.
        let target = format!("/{}.html", "a".repeat(300));

        let response = handle(&state, &target).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(header(&response, "content-type"), Some(TEXT));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"500 Internal Server Error");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_out_of_root_is_forbidden() {
        let (temp, state) = site();
        let secret = temp.path().join("secret.txt");
        fs::write(&secret, "do not serve").unwrap();
        std::os::unix::fs::symlink(&secret, state.root.join("leak.txt")).unwrap();

        let response = handle(&state, "/leak.txt").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
