//! Request path to filesystem path resolution.
//!
//! Resolution is purely lexical: no filesystem access happens here, so a
//! request that tries to climb out of the document root is rejected before
//! anything on disk is touched. The handler still canonicalizes the result
//! afterwards to catch symlinks that point outside the root.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a request path was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// `..` segments would leave the document root.
    #[error("path escapes the document root")]
    Traversal,

    /// The path contains bytes that can never name a file under the root.
    #[error("malformed path: {0}")]
    Malformed(&'static str),
}

/// A request path mapped under the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Absolute candidate path (not yet canonicalized).
    pub file: PathBuf,
    /// Normalized request path, always starting with `/`.
    pub request_path: String,
}

/// Strip the query string and fragment from a raw request target.
pub fn strip_query(raw: &str) -> &str {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    &raw[..end]
}

/// Resolve a raw request target against `root`.
///
/// `/` and paths ending in `/` map to `index` inside that directory.
pub fn resolve(root: &Path, raw: &str, index: &str) -> Result<ResolvedPath, ResolveError> {
    let path = strip_query(raw);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| ResolveError::Malformed("invalid percent-encoding"))?;

    if decoded.contains('\0') {
        return Err(ResolveError::Malformed("NUL byte"));
    }
    if decoded.contains('\\') {
        return Err(ResolveError::Malformed("backslash"));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ResolveError::Traversal);
                }
            }
            s => {
                if Path::new(s).is_absolute() || (cfg!(windows) && s.contains(':')) {
                    return Err(ResolveError::Malformed("absolute segment"));
                }
                segments.push(s);
            }
        }
    }

    let wants_directory = segments.is_empty() || decoded.ends_with('/');

    let mut request_path = String::from("/");
    request_path.push_str(&segments.join("/"));
    if wants_directory {
        if !request_path.ends_with('/') {
            request_path.push('/');
        }
        request_path.push_str(index);
        segments.push(index);
    }

    let file = segments.iter().fold(root.to_path_buf(), |acc, s| acc.join(s));

    Ok(ResolvedPath { file, request_path })
}
