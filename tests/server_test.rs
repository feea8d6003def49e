//! Integration tests for the static file server over real HTTP.

use std::fs;
use std::sync::Arc;

use larder::config::ServerSettings;
use larder::server::{self, ServeState};
use tempfile::TempDir;
use tokio::net::TcpListener;

struct Site {
    _temp: TempDir,
    base: String,
    client: reqwest::Client,
}

async fn start(with_custom_404: bool) -> Site {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("public");
    fs::create_dir_all(root.join("images")).unwrap();
    fs::create_dir_all(root.join("js")).unwrap();
    fs::write(root.join("index.html"), "<h1>Le Bistro</h1>").unwrap();
    fs::write(root.join("sw.js"), "self.addEventListener('fetch', () => {});").unwrap();
    fs::write(root.join("js/main.js"), "console.log('menu');").unwrap();
    fs::write(root.join("images/gallery-1.webp"), [0x52, 0x49, 0x46, 0x46]).unwrap();
    fs::write(root.join("menu.json"), "{\"dishes\":[]}").unwrap();
    if with_custom_404 {
        fs::write(root.join("404.html"), "<h1>Lost in the kitchen</h1>").unwrap();
    }

    let settings = ServerSettings {
        root,
        ..ServerSettings::default()
    };
    let state = ServeState::from_settings(&settings).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(server::run(
        Arc::new(state),
        listener,
        std::future::pending(),
    ));

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    Site {
        _temp: temp,
        base,
        client,
    }
}

impl Site {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }
}

fn header<'a>(response: &'a reqwest::Response, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn home_page_is_served_uncached() {
    let site = start(true).await;
    let response = site.get("/").await;

    assert_eq!(response.status(), 200);
    assert_eq!(header(&response, "content-type"), "text/html; charset=utf-8");
    assert_eq!(
        header(&response, "cache-control"),
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(response.text().await.unwrap(), "<h1>Le Bistro</h1>");
}

#[tokio::test]
async fn images_are_immutable_for_a_year() {
    let site = start(true).await;
    let response = site.get("/images/gallery-1.webp").await;

    assert_eq!(response.status(), 200);
    assert_eq!(header(&response, "content-type"), "image/webp");
    assert_eq!(
        header(&response, "cache-control"),
        "public, max-age=31536000, immutable"
    );
}

#[tokio::test]
async fn query_strings_are_ignored_for_lookup() {
    let site = start(true).await;
    let response = site.get("/js/main.js?v=3").await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        header(&response, "content-type"),
        "application/javascript; charset=utf-8"
    );
}

#[tokio::test]
async fn worker_script_is_revalidated_and_scoped_to_root() {
    let site = start(true).await;
    let response = site.get("/sw.js").await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        header(&response, "cache-control"),
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(header(&response, "service-worker-allowed"), "/");
}

#[tokio::test]
async fn encoded_traversal_is_forbidden() {
    let site = start(true).await;
    let response = site.get("/..%2f..%2fetc%2fpasswd").await;

    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn missing_file_serves_custom_404() {
    let site = start(true).await;
    let response = site.get("/specials.html").await;

    assert_eq!(response.status(), 404);
    assert_eq!(header(&response, "cache-control"), "no-cache");
    assert!(response.text().await.unwrap().contains("Lost in the kitchen"));
}

#[tokio::test]
async fn missing_file_without_custom_404_uses_inline_page() {
    let site = start(false).await;
    let response = site.get("/specials.html").await;

    assert_eq!(response.status(), 404);
    assert!(response.text().await.unwrap().contains("404 Not Found"));
}

#[tokio::test]
async fn directory_without_slash_redirects() {
    let site = start(true).await;
    let response = site.get("/images").await;

    assert_eq!(response.status(), 301);
    assert_eq!(header(&response, "location"), "/images/");
}

#[tokio::test]
async fn head_has_headers_but_no_body() {
    let site = start(true).await;
    let get_length = site.get("/menu.json").await.bytes().await.unwrap().len();
    let response = site.client.head(site.url("/menu.json")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(header(&response, "content-type"), "application/json");
    assert_eq!(header(&response, "content-length"), get_length.to_string());
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn other_methods_are_rejected() {
    let site = start(true).await;
    let response = site.client.post(site.url("/")).send().await.unwrap();

    assert_eq!(response.status(), 405);
    assert_eq!(header(&response, "allow"), "GET, HEAD");
}

#[tokio::test]
async fn server_keeps_serving_after_errors() {
    let site = start(true).await;

    for _ in 0..3 {
        assert_eq!(site.get("/nope").await.status(), 404);
        assert_eq!(site.get("/..%2fsecret").await.status(), 403);
    }
    assert_eq!(site.get("/").await.status(), 200);
}
