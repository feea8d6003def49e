//! MIME types and cache lifetimes by file extension.
//!
//! Both tables are fixed. Lookups are case-insensitive on the extension;
//! unknown extensions fall back to `application/octet-stream` and one day
//! of caching.

use std::collections::HashMap;
use std::path::Path;

/// Content type for extensions missing from the table.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Cache lifetime for extensions missing from the table (one day).
pub const DEFAULT_MAX_AGE: u64 = 86_400;

/// One year, for fingerprinted or cache-busted assets.
pub const ONE_YEAR: u64 = 31_536_000;

const ONE_DAY: u64 = 86_400;

/// `(extension, content type, max-age seconds)`
const STANDARD_ASSETS: &[(&str, &str, u64)] = &[
    // Documents are always revalidated
    (".html", "text/html; charset=utf-8", 0),
    (".htm", "text/html; charset=utf-8", 0),
    // Styles and scripts carry cache-busting query strings
    (".css", "text/css; charset=utf-8", ONE_YEAR),
    (".js", "application/javascript; charset=utf-8", ONE_YEAR),
    (".mjs", "application/javascript; charset=utf-8", ONE_YEAR),
    // Data
    (".json", "application/json", ONE_DAY),
    (".webmanifest", "application/manifest+json", ONE_DAY),
    (".xml", "application/xml", ONE_DAY),
    (".txt", "text/plain; charset=utf-8", ONE_DAY),
    // Images and icons
    (".png", "image/png", ONE_YEAR),
    (".jpg", "image/jpeg", ONE_YEAR),
    (".jpeg", "image/jpeg", ONE_YEAR),
    (".gif", "image/gif", ONE_YEAR),
    (".webp", "image/webp", ONE_YEAR),
    (".avif", "image/avif", ONE_YEAR),
    (".svg", "image/svg+xml", ONE_YEAR),
    (".ico", "image/x-icon", ONE_YEAR),
    // Fonts
    (".woff", "font/woff", ONE_YEAR),
    (".woff2", "font/woff2", ONE_YEAR),
    (".ttf", "font/ttf", ONE_YEAR),
    (".otf", "font/otf", ONE_YEAR),
    (".eot", "application/vnd.ms-fontobject", ONE_YEAR),
    // Media
    (".mp4", "video/mp4", ONE_YEAR),
    (".webm", "video/webm", ONE_YEAR),
    (".mp3", "audio/mpeg", ONE_YEAR),
    (".wav", "audio/wav", ONE_YEAR),
    (".pdf", "application/pdf", ONE_DAY),
];

/// What the server knows about one file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetType {
    /// Value for the `Content-Type` header.
    pub content_type: &'static str,
    /// Cache lifetime in seconds; zero means "always revalidate".
    pub max_age: u64,
}

impl AssetType {
    /// The `Cache-Control` policy for this asset type.
    pub fn cache_control(&self) -> CacheControl {
        CacheControl::from_max_age(self.max_age)
    }
}

/// Immutable extension lookup table, built once at startup.
#[derive(Debug, Clone)]
pub struct AssetTable {
    types: HashMap<&'static str, AssetType>,
}

impl AssetTable {
    /// The site's standard table.
    pub fn standard() -> Self {
        let types = STANDARD_ASSETS
            .iter()
            .map(|&(ext, content_type, max_age)| {
                (
                    ext,
                    AssetType {
                        content_type,
                        max_age,
                    },
                )
            })
            .collect();

        Self { types }
    }

    /// Look up an extension (with or without the leading dot, any case).
    pub fn get(&self, extension: &str) -> Option<AssetType> {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.types.get(format!(".{}", ext).as_str()).copied()
    }

    /// Classify a path, falling back to the defaults for unknown extensions.
    pub fn classify(&self, path: &Path) -> AssetType {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.get(e))
            .unwrap_or(AssetType {
                content_type: DEFAULT_CONTENT_TYPE,
                max_age: DEFAULT_MAX_AGE,
            })
    }

    /// Iterate over all `(extension, type)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, AssetType)> + '_ {
        self.types.iter().map(|(ext, ty)| (*ext, *ty))
    }
}

impl Default for AssetTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Response caching policy derived from a max-age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheControl {
    /// Never reuse without revalidating (`max-age` of zero).
    Revalidate,
    /// Cache for the given number of seconds without revalidation.
    Immutable(u64),
}

impl CacheControl {
    /// Build the policy for a lifetime in seconds.
    pub fn from_max_age(max_age: u64) -> Self {
        if max_age == 0 {
            Self::Revalidate
        } else {
            Self::Immutable(max_age)
        }
    }

    /// Header pairs to attach to a successful response.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Revalidate => vec![
                (
                    "cache-control",
                    "no-cache, no-store, must-revalidate".to_string(),
                ),
                ("pragma", "no-cache".to_string()),
                ("expires", "0".to_string()),
            ],
            Self::Immutable(secs) => vec![(
                "cache-control",
                format!("public, max-age={}, immutable", secs),
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webp_is_a_year_immutable_image() {
        let table = AssetTable::standard();
        let ty = table.classify(Path::new("images/gallery-1.webp"));
        assert_eq!(ty.content_type, "image/webp");
        assert_eq!(ty.max_age, ONE_YEAR);
    }

    #[test]
    fn html_is_never_cached() {
        let table = AssetTable::standard();
        let ty = table.classify(Path::new("index.html"));
        assert_eq!(ty.max_age, 0);
        assert_eq!(ty.cache_control(), CacheControl::Revalidate);
    }

    #[test]
    fn json_and_manifest_cache_for_a_day() {
        let table = AssetTable::standard();
        assert_eq!(table.get("json").unwrap().max_age, 86_400);
        assert_eq!(table.get(".webmanifest").unwrap().max_age, 86_400);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = AssetTable::standard();
        let ty = table.classify(Path::new("PHOTO.JPG"));
        assert_eq!(ty.content_type, "image/jpeg");
    }

    #[test]
    fn unknown_extension_uses_defaults() {
        let table = AssetTable::standard();
        let ty = table.classify(Path::new("archive.tar.zst"));
        assert_eq!(ty.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(ty.max_age, DEFAULT_MAX_AGE);
    }

    #[test]
    fn missing_extension_uses_defaults() {
        let table = AssetTable::standard();
        let ty = table.classify(Path::new("LICENSE"));
        assert_eq!(ty.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn every_entry_has_a_dotted_lowercase_key() {
        let table = AssetTable::standard();
        for (ext, _) in table.iter() {
            assert!(ext.starts_with('.'));
            assert_eq!(ext, ext.to_ascii_lowercase());
        }
    }

    #[test]
    fn revalidate_headers() {
        let headers = CacheControl::from_max_age(0).headers();
        assert_eq!(
            headers,
            vec![
                (
                    "cache-control",
                    "no-cache, no-store, must-revalidate".to_string()
                ),
                ("pragma", "no-cache".to_string()),
                ("expires", "0".to_string()),
            ]
        );
    }

    #[test]
    fn immutable_headers_carry_exact_duration() {
        let headers = CacheControl::from_max_age(31_536_000).headers();
        assert_eq!(
            headers,
            vec![(
                "cache-control",
                "public, max-age=31536000, immutable".to_string()
            )]
        );
    }
}
