//! Post catalog loading.
//!
//! The catalog is a sidecar JSON file listing the posts to embed:
//!
//! ```json
//! [
//!   { "title": "We're hiring", "image": "images/posts/hiring.jpg", "url": "https://…/embed/…" },
//!   { "title": "Launch recap", "image": "images/posts/launch.jpg", "url": "https://…/embed/…" }
//! ]
//! ```
//!
//! Order is preserved and duplicates are kept: the position in this list is
//! the post's identity.
//!
//! Loading never fails loudly. [`load_catalog`] logs whatever went wrong and
//! returns an empty list, because a broken catalog must not take the rest of
//! the page down with it. [`fetch_catalog`] is the fallible core for callers
//! (like the CLI `check` command) that do want the error.

use crate::types::PostDescriptor;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog not found: {0}")]
    NotFound(String),
    #[error("malformed catalog: {0}")]
    Malformed(String),
}

/// Something that can hand back the raw catalog body for a location.
///
/// `location` may carry a query string (the cache-busting nonce); sources
/// that have no notion of query strings ignore it.
pub trait CatalogSource {
    fn fetch(&self, location: &str) -> Result<String, CatalogError>;
}

/// Reads catalogs from a site root on disk.
#[derive(Debug, Clone)]
pub struct FsCatalog {
    root: PathBuf,
}

impl FsCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl CatalogSource for FsCatalog {
    fn fetch(&self, location: &str) -> Result<String, CatalogError> {
        let path = self.root.join(strip_query(location));
        if !path.is_file() {
            return Err(CatalogError::NotFound(path.display().to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }
}

/// Drop a `?query` and `#fragment` suffix from a location.
fn strip_query(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    &location[..end]
}

/// Append a `v=<nonce>` parameter so no intermediate cache serves a stale copy.
pub fn cache_busted(location: &str, nonce: u128) -> String {
    let sep = if location.contains('?') { '&' } else { '?' };
    format!("{location}{sep}v={nonce}")
}

/// Milliseconds since the epoch, used as the cache-busting nonce.
pub fn fresh_nonce() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Parse a catalog body.
///
/// The top level must be an array and every entry must carry string `title`,
/// `image` and `url` fields. One bad entry rejects the whole catalog rather
/// than silently shifting the positions of the rest.
pub fn parse_catalog(body: &str) -> Result<Vec<PostDescriptor>, CatalogError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let entries = value
        .as_array()
        .ok_or_else(|| CatalogError::Malformed("top level is not an array".into()))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            serde_json::from_value::<PostDescriptor>(entry.clone())
                .map_err(|e| CatalogError::Malformed(format!("entry {i}: {e}")))
        })
        .collect()
}

/// Fetch and parse a catalog, optionally cache-busted.
pub fn fetch_catalog(
    source: &dyn CatalogSource,
    location: &str,
    cache_bust: bool,
) -> Result<Vec<PostDescriptor>, CatalogError> {
    let url = if cache_bust {
        cache_busted(location, fresh_nonce())
    } else {
        location.to_string()
    };
    debug!(%url, "fetching post catalog");
    let body = source.fetch(&url)?;
    parse_catalog(&body)
}

/// Fetch and parse a catalog, logging and returning an empty list on failure.
pub fn load_catalog(
    source: &dyn CatalogSource,
    location: &str,
    cache_bust: bool,
) -> Vec<PostDescriptor> {
    match fetch_catalog(source, location, cache_bust) {
        Ok(posts) => {
            debug!(count = posts.len(), "post catalog loaded");
            posts
        }
        Err(e) => {
            warn!(location, error = %e, "could not load post catalog, rendering no posts");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordingCatalog;
    use tempfile::TempDir;

    const THREE_POSTS: &str = r#"[
        {"title": "One", "image": "a.jpg", "url": "https://embed/1"},
        {"title": "Two", "image": "b.jpg", "url": "https://embed/2"},
        {"title": "One", "image": "a.jpg", "url": "https://embed/1"}
    ]"#;

    #[test]
    fn parse_preserves_order_and_duplicates() {
        let posts = parse_catalog(THREE_POSTS).unwrap();
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two", "One"]);
    }

    #[test]
    fn parse_rejects_non_array() {
        let err = parse_catalog(r#"{"posts": []}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Malformed(_)));
    }

    #[test]
    fn parse_rejects_entry_missing_field() {
        let err = parse_catalog(r#"[{"title": "x", "image": "y"}]"#).unwrap_err();
        assert!(err.to_string().contains("entry 0"));
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(matches!(
            parse_catalog("[{"),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn cache_busted_appends_query() {
        assert_eq!(cache_busted("posts.json", 42), "posts.json?v=42");
        assert_eq!(cache_busted("posts.json?lang=en", 7), "posts.json?lang=en&v=7");
    }

    #[test]
    fn fetch_uses_cache_busted_location() {
        let source = RecordingCatalog::new("[]");
        fetch_catalog(&source, "posts.json", true).unwrap();
        fetch_catalog(&source, "posts.json", false).unwrap();

        let requested = source.requested();
        assert!(requested[0].starts_with("posts.json?v="));
        assert_eq!(requested[1], "posts.json");
    }

    #[test]
    fn fs_catalog_ignores_query() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("posts.json"), THREE_POSTS).unwrap();
        let source = FsCatalog::new(tmp.path());

        let posts = fetch_catalog(&source, "posts.json", true).unwrap();
        assert_eq!(posts.len(), 3);
    }

    #[test]
    fn load_catalog_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let source = FsCatalog::new(tmp.path());
        assert!(load_catalog(&source, "posts.json", true).is_empty());
    }

    #[test]
    fn load_catalog_malformed_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("posts.json"), r#"{"not": "a list"}"#).unwrap();
        let source = FsCatalog::new(tmp.path());
        assert!(load_catalog(&source, "posts.json", false).is_empty());
    }
}
