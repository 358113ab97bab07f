//! # Embed Gallery
//!
//! Lazy loader for a carousel of embedded social posts. A JSON catalog lists
//! the posts; each becomes a card that shows a preview image until the card
//! scrolls into view, then loads the provider's embed frame behind the
//! placeholder and fades the placeholder out once the frame is known good.
//! Frames that fail are retried, and a card that runs out of attempts shows a
//! static fallback with the post title and a link out.
//!
//! # Architecture: Sans-IO Core
//!
//! Nothing in the loader talks to a browser directly. The host forwards what
//! happened (an intersection batch, a frame signal, the clock moving) and the
//! gallery answers with writes against a [`surface::Surface`]:
//!
//! ```text
//! catalog ──► EmbedGallery::render ──► Surface (cards in placeholder state)
//!                  │
//! host events ─────┤  on_intersections / on_viewport
//!                  │  on_frame_load / on_frame_error
//!                  │  advance_to(now)
//!                  ▼
//!          scheduler ─► machine::transition ─► effects ─► present ─► Surface
//! ```
//!
//! Time is virtual. Stagger delays, retries and fades are entries in a
//! [`timers::TimerQueue`], so the full lifecycle of a card can be replayed in
//! a test in microseconds.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Fetches and validates the post catalog, with cache-busting |
//! | [`scheduler`] | Visibility watching and the staggered trigger queue |
//! | [`machine`] | Per-card load state machine: attempts, retries, success and failure |
//! | [`present`] | Card, placeholder and fallback markup; the fade-out |
//! | [`gallery`] | Wires the above together behind host event handlers |
//! | [`surface`] | The DOM boundary trait and an in-memory implementation |
//! | [`timers`] | Virtual-time timer queue |
//! | [`config`] | `config.toml` loading, validation and the timing policy |
//! | [`types`] | Shared types: post descriptors, card and frame ids, rects |
//! | [`chrome`] | Menu, hero slideshow, scroll-spy and carousel arrows |
//! | [`page`] | Static `index.html` rendering with Maud |
//! | [`simulate`] | Scripted host that runs a gallery to completion |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Cross-Origin Means Success
//!
//! A real embed is served from the provider's origin, so reading its document
//! is denied. A frame whose document *can* be read is the provider's error or
//! blank page served same-origin, and counts as a failed attempt. See
//! [`machine::FrameAccess`].
//!
//! ## Pure Transition Function
//!
//! [`machine::transition`] maps a state and an event to the states entered and
//! a list of effects. It has no access to the surface or the clock, which keeps
//! every retry edge case a table-driven unit test.
//!
//! ## Maud Over Template Engines
//!
//! Cards, fallbacks and the page shell are generated with
//! [Maud](https://maud.lambda.xyz/). All interpolation is auto-escaped, which
//! matters here because titles come straight from a JSON file.

pub mod catalog;
pub mod chrome;
pub mod config;
pub mod gallery;
pub mod machine;
pub mod output;
pub mod page;
pub mod present;
pub mod scheduler;
pub mod simulate;
pub mod surface;
pub mod timers;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
