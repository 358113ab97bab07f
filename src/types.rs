//! Shared types used across the catalog, scheduler, state machine and presenter.
//!
//! `PostDescriptor` is the only type that crosses the wire (the sidecar JSON
//! catalog). The rest are identifiers and geometry handed between the gallery
//! and its host.

use serde::{Deserialize, Serialize};

/// One post from the catalog.
///
/// Identity is the position in the catalog list, not any field here: two
/// descriptors with the same URL are still two cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDescriptor {
    /// Display title, used as the placeholder caption and fallback quotation.
    pub title: String,
    /// Preview image shown before the embed loads.
    #[serde(rename = "image")]
    pub preview_image_url: String,
    /// Embed URL loaded into the frame. Empty means "no embed configured".
    #[serde(rename = "url")]
    pub embed_url: String,
}

impl PostDescriptor {
    pub fn new(title: &str, preview_image_url: &str, embed_url: &str) -> Self {
        Self {
            title: title.to_string(),
            preview_image_url: preview_image_url.to_string(),
            embed_url: embed_url.to_string(),
        }
    }

    /// Whether this post has an embed source at all.
    pub fn has_embed(&self) -> bool {
        !self.embed_url.trim().is_empty()
    }
}

/// Position of a card in the rendered catalog (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub usize);

impl CardId {
    /// DOM id of the card's root element.
    pub fn dom_id(self) -> String {
        format!("post-{}", self.0)
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:0>3}", self.0 + 1)
    }
}

/// Identity of one frame instance. A retry always gets a new one, so
/// signals addressed to a discarded frame can be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u64);

/// Vertical extent of an element or of the viewport, in CSS pixels.
///
/// Only the vertical axis matters for lookahead: the carousel is scrolled
/// horizontally by the user, but cards enter the render region by page scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Grow the rect by `margin` on both edges.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            top: self.top - margin,
            height: self.height + 2.0 * margin,
        }
    }

    /// Edge contact counts as intersecting, matching a zero-area threshold.
    pub fn touches(&self, other: &Rect) -> bool {
        self.top <= other.bottom() && other.top <= self.bottom()
    }
}
