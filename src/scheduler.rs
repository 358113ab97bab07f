//! Visibility scheduling.
//!
//! One shared watcher tracks every card that hasn't been triggered yet. The
//! first time a card's element reaches the watched region (the viewport grown
//! by the root margin) it is unregistered and gets a load trigger delayed by
//! its stagger slot:
//!
//! ```text
//! 1st card to become visible   →  trigger after 0 ms
//! 2nd                          →  300 ms
//! 3rd                          →  600 ms
//! ...
//! ```
//!
//! The stagger counter belongs to the scheduler and only ever grows; a card
//! that becomes visible long after the first batch still waits behind every
//! card that came before it. It resets only when a new scheduler is built.
//!
//! When the host has no intersection capability, registration triggers the
//! card immediately with no delay.

use crate::config::{LoadPolicy, ObserverConfig};
use crate::types::{CardId, Rect};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

/// A load trigger the gallery must fire after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub card: CardId,
    pub delay: Duration,
    /// Slot taken from the stagger counter; `None` when the watcher is unavailable.
    pub stagger_index: Option<u32>,
}

/// What a host intersection callback reports for one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry {
    pub card: CardId,
    pub is_intersecting: bool,
}

/// Monotonic counter handing out stagger slots.
#[derive(Debug, Default)]
pub struct StaggerCounter(u32);

impl StaggerCounter {
    /// Current value, then advance.
    pub fn next_index(&mut self) -> u32 {
        let index = self.0;
        self.0 += 1;
        index
    }

    pub fn issued(&self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
pub struct VisibilityScheduler {
    pending: BTreeSet<CardId>,
    counter: StaggerCounter,
    root_margin: f64,
    threshold: f64,
    policy: LoadPolicy,
    supported: bool,
    connected: bool,
}

impl VisibilityScheduler {
    /// `supported` is whether the host can report intersections at all.
    pub fn new(observer: &ObserverConfig, policy: LoadPolicy, supported: bool) -> Self {
        Self {
            pending: BTreeSet::new(),
            counter: StaggerCounter::default(),
            root_margin: observer.root_margin_px,
            threshold: observer.threshold,
            policy,
            supported,
            connected: true,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Start watching a card.
    ///
    /// Without intersection support the card is triggered right away and
    /// never enters the watch set.
    pub fn observe(&mut self, card: CardId) -> Option<Trigger> {
        if !self.connected {
            return None;
        }
        if !self.supported {
            debug!(%card, "no viewport watcher, triggering immediately");
            return Some(Trigger {
                card,
                delay: Duration::ZERO,
                stagger_index: None,
            });
        }
        self.pending.insert(card);
        None
    }

    /// Handle one batch of intersection entries, in the order reported.
    ///
    /// Entries for cards no longer watched (already triggered, or never
    /// registered) are ignored, which makes repeated scroll in/out harmless.
    pub fn on_intersections(&mut self, entries: &[IntersectionEntry]) -> Vec<Trigger> {
        let mut triggers = Vec::new();
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            if !self.pending.remove(&entry.card) {
                continue;
            }
            let index = self.counter.next_index();
            let delay = self.policy.stagger_delay(index);
            debug!(card = %entry.card, index, delay_ms = delay.as_millis() as u64, "card visible");
            triggers.push(Trigger {
                card: entry.card,
                delay,
                stagger_index: Some(index),
            });
        }
        triggers
    }

    /// Compute intersections from geometry and handle them.
    ///
    /// `layout` lists card rects in document order; only watched cards are
    /// considered.
    pub fn on_viewport(&mut self, viewport: Rect, layout: &[(CardId, Rect)]) -> Vec<Trigger> {
        if !self.connected || !self.supported {
            return Vec::new();
        }
        let region = viewport.expand(self.root_margin);
        let entries: Vec<IntersectionEntry> = layout
            .iter()
            .filter(|(card, _)| self.pending.contains(card))
            .map(|(card, rect)| IntersectionEntry {
                card: *card,
                is_intersecting: meets_threshold(rect, &region, self.threshold),
            })
            .collect();
        self.on_intersections(&entries)
    }

    pub fn is_watching(&self, card: CardId) -> bool {
        self.pending.contains(&card)
    }

    pub fn watched(&self) -> usize {
        self.pending.len()
    }

    pub fn stagger_issued(&self) -> u32 {
        self.counter.issued()
    }

    /// Stop watching everything. Later registrations and entries are ignored.
    pub fn disconnect(&mut self) {
        self.pending.clear();
        self.connected = false;
    }
}

/// Whether enough of `rect` lies inside `region`.
///
/// A zero threshold accepts edge contact; otherwise the visible fraction of
/// the element's height must reach the threshold.
fn meets_threshold(rect: &Rect, region: &Rect, threshold: f64) -> bool {
    if !rect.touches(region) {
        return false;
    }
    if threshold <= 0.0 {
        return true;
    }
    if rect.height <= 0.0 {
        return true;
    }
    let visible = rect.bottom().min(region.bottom()) - rect.top.max(region.top);
    visible / rect.height >= threshold
}
