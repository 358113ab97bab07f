//! Shared test utilities for the embed-gallery test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut gallery = gallery(LoadPolicy::immediate());
//! gallery.render(sample_posts(3));
//! assert_eq!(count_ops(gallery.surface(), |op| matches!(op, SurfaceOp::Append(_))), 3);
//! ```

use std::cell::RefCell;
use std::path::Path;
use tempfile::TempDir;

use crate::catalog::{CatalogError, CatalogSource};
use crate::config::{GalleryConfig, LoadPolicy};
use crate::gallery::{Capabilities, EmbedGallery};
use crate::surface::{MemorySurface, SurfaceOp};
use crate::types::PostDescriptor;

// =========================================================================
// Fixtures
// =========================================================================

/// `n` posts titled "Post 1".."Post n", each with a distinct embed URL.
pub fn sample_posts(n: usize) -> Vec<PostDescriptor> {
    (1..=n)
        .map(|i| {
            PostDescriptor::new(
                &format!("Post {i}"),
                &format!("images/posts/{i:02}.jpg"),
                &format!("https://www.linkedin.com/embed/feed/update/urn:li:share:{i}"),
            )
        })
        .collect()
}

/// Catalog JSON for [`sample_posts`].
pub fn sample_catalog_json(n: usize) -> String {
    serde_json::to_string_pretty(&sample_posts(n)).unwrap()
}

/// Temp site root containing `posts.json` with `n` sample posts.
pub fn site_with_catalog(n: usize) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_catalog(tmp.path(), &sample_catalog_json(n));
    tmp
}

pub fn write_catalog(root: &Path, body: &str) {
    std::fs::write(root.join("posts.json"), body).unwrap();
}

/// Serves a fixed body and records every location it was asked for.
pub struct RecordingCatalog {
    body: String,
    requested: RefCell<Vec<String>>,
}

impl RecordingCatalog {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            requested: RefCell::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl CatalogSource for RecordingCatalog {
    fn fetch(&self, location: &str) -> Result<String, CatalogError> {
        self.requested.borrow_mut().push(location.to_string());
        Ok(self.body.clone())
    }
}

/// A gallery over an empty in-memory surface with the watcher available.
pub fn gallery(policy: LoadPolicy) -> EmbedGallery<MemorySurface> {
    EmbedGallery::with_policy(
        MemorySurface::new(),
        &GalleryConfig::default(),
        policy,
        Capabilities::default(),
    )
}

// =========================================================================
// Surface inspection
// =========================================================================

/// Number of recorded surface writes matching `pred`.
pub fn count_ops(surface: &MemorySurface, pred: impl Fn(&SurfaceOp) -> bool) -> usize {
    surface.ops().iter().filter(|op| pred(op)).count()
}
