//! The embed gallery: one instance per page.
//!
//! [`EmbedGallery`] owns everything the loader needs: the cards, the shared
//! visibility watcher with its stagger counter, the timer queue and the
//! surface it writes to. The host feeds it three kinds of input and it never
//! blocks on any of them:
//!
//! | Host input | Method |
//! |------------|--------|
//! | intersection callback | [`EmbedGallery::on_intersections`] / [`EmbedGallery::on_viewport`] |
//! | frame `load` / `error` | [`EmbedGallery::on_frame_load`] / [`EmbedGallery::on_frame_error`] |
//! | clock | [`EmbedGallery::advance_to`] |
//!
//! Frame signals are one-shot. The first signal for a frame consumes its
//! listener; a repeat, or a signal for a frame a retry already discarded,
//! is dropped without touching the card.
//!
//! Nothing here returns an error. Catalog and container problems are logged
//! and leave the gallery empty; exhausted retries end in the fallback card.

use crate::catalog::{self, CatalogSource};
use crate::config::{GalleryConfig, LoadPolicy};
use crate::machine::{Effect, EmbedCard, FrameAccess, LoadEvent, LoadState};
use crate::present::Presenter;
use crate::scheduler::{IntersectionEntry, Trigger, VisibilityScheduler};
use crate::surface::Surface;
use crate::timers::TimerQueue;
use crate::types::{CardId, FrameId, PostDescriptor, Rect};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GalleryTimer {
    Trigger(CardId),
    Retry(CardId),
    TeardownPlaceholder(CardId),
}

/// What the host environment can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether viewport-intersection callbacks are available.
    pub intersection_observer: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            intersection_observer: true,
        }
    }
}

pub struct EmbedGallery<S: Surface> {
    surface: S,
    policy: LoadPolicy,
    presenter: Presenter,
    scheduler: VisibilityScheduler,
    timers: TimerQueue<GalleryTimer>,
    cards: Vec<EmbedCard>,
    listening: HashMap<FrameId, CardId>,
    next_frame: u64,
    now: Duration,
    torn_down: bool,
}

impl<S: Surface> EmbedGallery<S> {
    pub fn new(surface: S, config: &GalleryConfig, caps: Capabilities) -> Self {
        Self::with_policy(surface, config, config.policy(), caps)
    }

    /// Like [`EmbedGallery::new`] but with an explicit policy, for
    /// deterministic tests.
    pub fn with_policy(
        surface: S,
        config: &GalleryConfig,
        policy: LoadPolicy,
        caps: Capabilities,
    ) -> Self {
        Self {
            surface,
            policy,
            presenter: Presenter::new(
                config.placeholder.style,
                config.fallback.clone(),
                policy.fade_duration,
            ),
            scheduler: VisibilityScheduler::new(
                &config.observer,
                policy,
                caps.intersection_observer,
            ),
            timers: TimerQueue::new(),
            cards: Vec::new(),
            listening: HashMap::new(),
            next_frame: 1,
            now: Duration::ZERO,
            torn_down: false,
        }
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Fetch the catalog and render it. Returns how many cards were rendered.
    pub fn load(&mut self, source: &dyn CatalogSource, location: &str, cache_bust: bool) -> usize {
        let posts = catalog::load_catalog(source, location, cache_bust);
        self.render(posts)
    }

    /// Append one card per post, in order, and start watching them.
    ///
    /// A missing container leaves the gallery empty. Calling this again adds
    /// cards after the existing ones.
    pub fn render(&mut self, posts: Vec<PostDescriptor>) -> usize {
        if self.torn_down {
            return 0;
        }
        let first = self.cards.len();
        for post in posts {
            let id = CardId(self.cards.len());
            let markup = self.presenter.card_markup(id, &post);
            if let Err(e) = self.surface.append_card(id, markup) {
                warn!(error = %e, "cannot render posts");
                break;
            }
            self.cards.push(EmbedCard::new(post));
        }

        let rendered = self.cards.len() - first;
        debug!(rendered, "cards rendered");
        for index in first..self.cards.len() {
            if let Some(trigger) = self.scheduler.observe(CardId(index)) {
                self.dispatch(trigger.card, LoadEvent::Trigger);
            }
        }
        rendered
    }

    // ========================================================================
    // Host input
    // ========================================================================

    /// Intersection callback. Returns the triggers that were scheduled.
    pub fn on_intersections(&mut self, entries: &[IntersectionEntry]) -> Vec<Trigger> {
        let triggers = self.scheduler.on_intersections(entries);
        self.schedule_triggers(&triggers);
        triggers
    }

    /// Geometry-based variant of [`EmbedGallery::on_intersections`].
    pub fn on_viewport(&mut self, viewport: Rect, layout: &[(CardId, Rect)]) -> Vec<Trigger> {
        let triggers = self.scheduler.on_viewport(viewport, layout);
        self.schedule_triggers(&triggers);
        triggers
    }

    /// A frame fired `load`; `access` is the result of reading its document.
    pub fn on_frame_load(&mut self, frame: FrameId, access: FrameAccess) {
        if let Some(card) = self.take_listener(frame) {
            self.dispatch(card, LoadEvent::Loaded(access));
        }
    }

    /// A frame fired `error`.
    pub fn on_frame_error(&mut self, frame: FrameId) {
        if let Some(card) = self.take_listener(frame) {
            self.dispatch(card, LoadEvent::Errored);
        }
    }

    /// Move the clock forward, firing every timer due by `now` in order.
    ///
    /// Timers scheduled while firing are themselves fired if they fall due
    /// before `now`.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some((due, timer)) = self.timers.pop_due(now) {
            self.now = self.now.max(due);
            match timer {
                GalleryTimer::Trigger(card) => self.dispatch(card, LoadEvent::Trigger),
                GalleryTimer::Retry(card) => self.dispatch(card, LoadEvent::RetryElapsed),
                GalleryTimer::TeardownPlaceholder(card) => {
                    self.presenter.finish_teardown(&mut self.surface, card)
                }
            }
        }
        self.now = self.now.max(now);
    }

    /// Fire timers until none are left. Frames still waiting for a signal
    /// stay waiting: there is no timeout on the signal itself.
    pub fn run_timers(&mut self) {
        while let Some(due) = self.timers.next_due() {
            self.advance_to(due);
        }
    }

    /// Disconnect the watcher and drop pending timers and listeners.
    pub fn teardown(&mut self) {
        self.scheduler.disconnect();
        self.timers.clear();
        self.listening.clear();
        self.torn_down = true;
        debug!("gallery torn down");
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn cards(&self) -> &[EmbedCard] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> Option<&EmbedCard> {
        self.cards.get(id.0)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn policy(&self) -> &LoadPolicy {
        &self.policy
    }

    pub fn next_timer_due(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    /// Frames currently waiting for their one load/error signal.
    pub fn awaiting_signal(&self) -> Vec<(CardId, FrameId)> {
        let mut waiting: Vec<(CardId, FrameId)> =
            self.listening.iter().map(|(f, c)| (*c, *f)).collect();
        waiting.sort();
        waiting
    }

    pub fn is_watching(&self, id: CardId) -> bool {
        self.scheduler.is_watching(id)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn schedule_triggers(&mut self, triggers: &[Trigger]) {
        if self.torn_down {
            return;
        }
        for trigger in triggers {
            self.timers
                .schedule(self.now + trigger.delay, GalleryTimer::Trigger(trigger.card));
        }
    }

    fn take_listener(&mut self, frame: FrameId) -> Option<CardId> {
        let card = self.listening.remove(&frame);
        if card.is_none() {
            debug!(frame = frame.0, "signal for a frame nobody listens to, dropped");
        }
        card
    }

    fn dispatch(&mut self, id: CardId, event: LoadEvent) {
        if self.torn_down {
            return;
        }
        let Some(card) = self.cards.get_mut(id.0) else {
            return;
        };
        let from = card.state();
        let step = card.apply(event, &self.policy);
        if step.is_ignored() {
            debug!(card = %id, state = %from, ?event, "event ignored");
            return;
        }
        debug!(card = %id, from = %from, to = %card.state(), ?event, "transition");
        for effect in step.effects {
            self.run_effect(id, effect);
        }
    }

    fn run_effect(&mut self, id: CardId, effect: Effect) {
        let card = &mut self.cards[id.0];
        match effect {
            Effect::CreateFrame { attempt } => {
                let frame = FrameId(self.next_frame);
                self.next_frame += 1;
                card.set_frame(Some(frame));
                self.listening.insert(frame, id);
                self.surface.attach_frame(id, frame, &card.post.embed_url);
                debug!(card = %id, attempt, frame = frame.0, "frame attached");
            }
            Effect::DiscardFrame => {
                if let Some(frame) = card.frame() {
                    card.set_frame(None);
                    self.listening.remove(&frame);
                    self.surface.detach_frame(id, frame);
                }
            }
            Effect::ScheduleRetry { delay } => {
                debug!(card = %id, delay_ms = delay.as_millis() as u64, "retry scheduled");
                self.timers
                    .schedule(self.now + delay, GalleryTimer::Retry(id));
            }
            Effect::Reveal => {
                if let Some(frame) = card.frame() {
                    info!(card = %id, attempts = card.attempts(), "embed loaded");
                    let wait = self.presenter.reveal(&mut self.surface, id, frame);
                    self.timers
                        .schedule(self.now + wait, GalleryTimer::TeardownPlaceholder(id));
                }
            }
            Effect::ShowFallback => {
                info!(card = %id, attempts = card.attempts(), "embed failed, showing fallback");
                let wait = self.presenter.fallback(&mut self.surface, id, &card.post);
                self.timers
                    .schedule(self.now + wait, GalleryTimer::TeardownPlaceholder(id));
            }
        }
    }
}

impl<S: Surface> EmbedGallery<S> {
    /// Count of cards in each terminal or non-terminal state, in a fixed order.
    pub fn summary(&self) -> GallerySummary {
        let mut summary = GallerySummary::default();
        for card in &self.cards {
            match card.state() {
                LoadState::Idle => summary.idle += 1,
                LoadState::Loading { .. } | LoadState::RetryPending { .. } => {
                    summary.in_flight += 1
                }
                LoadState::Success => summary.loaded += 1,
                LoadState::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GallerySummary {
    pub idle: usize,
    pub in_flight: usize,
    pub loaded: usize,
    pub failed: usize,
}
