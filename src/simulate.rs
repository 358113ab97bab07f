//! Scripted host for running a gallery end to end without a browser.
//!
//! A [`Simulation`] renders a catalog into a [`MemorySurface`], reports every
//! card as visible in one batch, and answers each frame the gallery attaches
//! with a scripted [`Outcome`] after a fixed latency. It then runs the clock
//! until nothing is left to happen and reports what every card went through.
//!
//! Outcomes are scripted per card and per attempt:
//!
//! ```text
//! 2:readable,denied   card 2: first attempt serves an error page, second loads
//! 4:error             card 4: every attempt errors
//! ```
//!
//! Cards without a script use the default outcome. A script shorter than the
//! number of attempts repeats its last entry.

use crate::catalog::CatalogSource;
use crate::config::{GalleryConfig, LoadPolicy};
use crate::gallery::{Capabilities, EmbedGallery};
use crate::machine::{FrameAccess, LoadState};
use crate::scheduler::IntersectionEntry;
use crate::surface::MemorySurface;
use crate::timers::TimerQueue;
use crate::types::{CardId, FrameId, PostDescriptor};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unknown outcome '{0}' (expected denied, readable, blank, error or silent)")]
    UnknownOutcome(String),
    #[error("invalid card script '{0}' (expected CARD:OUTCOME[,OUTCOME...])")]
    InvalidCardScript(String),
}

/// How the provider answers one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Genuine cross-origin embed.
    Denied,
    /// Same-origin error page with content.
    Readable,
    /// Same-origin blank page.
    Blank,
    /// Network error.
    Error,
    /// Never signals at all.
    Silent,
}

impl FromStr for Outcome {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "denied" | "ok" => Ok(Outcome::Denied),
            "readable" => Ok(Outcome::Readable),
            "blank" => Ok(Outcome::Blank),
            "error" => Ok(Outcome::Error),
            "silent" => Ok(Outcome::Silent),
            other => Err(ScriptError::UnknownOutcome(other.to_string())),
        }
    }
}

/// Per-card, per-attempt outcomes.
#[derive(Debug, Clone)]
pub struct Script {
    default: Outcome,
    cards: BTreeMap<usize, Vec<Outcome>>,
}

impl Default for Script {
    fn default() -> Self {
        Self::new(Outcome::Denied)
    }
}

impl Script {
    pub fn new(default: Outcome) -> Self {
        Self {
            default,
            cards: BTreeMap::new(),
        }
    }

    /// Script card `index` (0-based).
    pub fn card(mut self, index: usize, outcomes: Vec<Outcome>) -> Self {
        self.cards.insert(index, outcomes);
        self
    }

    /// Parse `CARD:OUTCOME[,OUTCOME...]`, with `CARD` 1-based as displayed.
    pub fn parse_card(&mut self, entry: &str) -> Result<(), ScriptError> {
        let invalid = || ScriptError::InvalidCardScript(entry.to_string());
        let (card, outcomes) = entry.split_once(':').ok_or_else(invalid)?;
        let card: usize = card.trim().parse().map_err(|_| invalid())?;
        if card == 0 {
            return Err(invalid());
        }
        let outcomes = outcomes
            .split(',')
            .map(Outcome::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        self.cards.insert(card - 1, outcomes);
        Ok(())
    }

    /// Outcome for a card's `attempt` (1-based).
    pub fn outcome(&self, card: CardId, attempt: u32) -> Outcome {
        match self.cards.get(&card.0) {
            Some(list) if !list.is_empty() => {
                let i = (attempt.max(1) as usize - 1).min(list.len() - 1);
                list[i]
            }
            _ => self.default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOptions {
    /// Time between a frame being attached and its signal.
    pub latency: Duration,
    /// Whether the host reports intersections.
    pub intersection_observer: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(250),
            intersection_observer: true,
        }
    }
}

/// A state a card entered, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimEvent {
    pub at: Duration,
    pub card: CardId,
    pub state: LoadState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardReport {
    pub card: CardId,
    pub title: String,
    pub state: LoadState,
    pub attempts: u32,
    pub placeholder_visible: bool,
    pub visible_frames: usize,
    pub fallback_shown: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    pub events: Vec<SimEvent>,
    pub cards: Vec<CardReport>,
    pub finished_at: Duration,
}

pub struct Simulation {
    gallery: EmbedGallery<MemorySurface>,
    script: Script,
    options: SimulationOptions,
    deliveries: TimerQueue<(FrameId, Outcome)>,
    scheduled: HashSet<FrameId>,
    seen: Vec<usize>,
    events: Vec<SimEvent>,
}

impl Simulation {
    pub fn new(config: &GalleryConfig, script: Script, options: SimulationOptions) -> Self {
        Self::with_policy(config, config.policy(), script, options)
    }

    pub fn with_policy(
        config: &GalleryConfig,
        policy: LoadPolicy,
        script: Script,
        options: SimulationOptions,
    ) -> Self {
        let caps = Capabilities {
            intersection_observer: options.intersection_observer,
        };
        Self {
            gallery: EmbedGallery::with_policy(MemorySurface::new(), config, policy, caps),
            script,
            options,
            deliveries: TimerQueue::new(),
            scheduled: HashSet::new(),
            seen: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Fetch the catalog through the gallery, bring every card into view and
    /// run to quiescence. A catalog that fails to load gives an empty report.
    pub fn run(
        mut self,
        source: &dyn CatalogSource,
        location: &str,
        cache_bust: bool,
    ) -> SimulationReport {
        let count = self.gallery.load(source, location, cache_bust);
        self.drive(count)
    }

    /// Like [`Simulation::run`] with the posts already in hand.
    pub fn run_posts(mut self, posts: Vec<PostDescriptor>) -> SimulationReport {
        let count = self.gallery.render(posts);
        self.drive(count)
    }

    fn drive(mut self, count: usize) -> SimulationReport {
        self.seen = vec![0; count];
        self.record();

        if self.options.intersection_observer {
            let entries: Vec<IntersectionEntry> = (0..count)
                .map(|i| IntersectionEntry {
                    card: CardId(i),
                    is_intersecting: true,
                })
                .collect();
            self.gallery.on_intersections(&entries);
        }

        loop {
            self.schedule_new_frames();
            let next_timer = self.gallery.next_timer_due();
            let next_delivery = self.deliveries.next_due();
            match (next_timer, next_delivery) {
                (None, None) => break,
                (Some(t), Some(d)) if d < t => self.deliver(d),
                (None, Some(d)) => self.deliver(d),
                (Some(t), _) => self.gallery.advance_to(t),
            }
            self.record();
        }

        self.report()
    }

    fn schedule_new_frames(&mut self) {
        let now = self.gallery.now();
        for (card, frame) in self.gallery.awaiting_signal() {
            if !self.scheduled.insert(frame) {
                continue;
            }
            let attempt = self.gallery.card(card).map(|c| c.attempts()).unwrap_or(1);
            let outcome = self.script.outcome(card, attempt);
            if outcome != Outcome::Silent {
                self.deliveries
                    .schedule(now + self.options.latency, (frame, outcome));
            }
        }
    }

    fn deliver(&mut self, due: Duration) {
        self.gallery.advance_to(due);
        while let Some((_, (frame, outcome))) = self.deliveries.pop_due(due) {
            match outcome {
                Outcome::Denied => self.gallery.on_frame_load(frame, FrameAccess::Denied),
                Outcome::Readable => self
                    .gallery
                    .on_frame_load(frame, FrameAccess::Readable { empty: false }),
                Outcome::Blank => self
                    .gallery
                    .on_frame_load(frame, FrameAccess::Readable { empty: true }),
                Outcome::Error => self.gallery.on_frame_error(frame),
                Outcome::Silent => {}
            }
            self.record();
        }
    }

    /// Append states entered since the last call.
    fn record(&mut self) {
        let now = self.gallery.now();
        for (i, card) in self.gallery.cards().iter().enumerate() {
            let history = card.history();
            let seen = &mut self.seen[i];
            for state in &history[*seen..] {
                self.events.push(SimEvent {
                    at: now,
                    card: CardId(i),
                    state: *state,
                });
            }
            *seen = history.len();
        }
    }

    fn report(self) -> SimulationReport {
        let surface = self.gallery.surface();
        let cards = self
            .gallery
            .cards()
            .iter()
            .enumerate()
            .map(|(i, card)| {
                let id = CardId(i);
                let view = surface.card(id);
                CardReport {
                    card: id,
                    title: card.post.title.clone(),
                    state: card.state(),
                    attempts: card.attempts(),
                    placeholder_visible: view.is_some_and(|v| v.placeholder_visible()),
                    visible_frames: view.map(|v| v.visible_frames()).unwrap_or(0),
                    fallback_shown: view.is_some_and(|v| v.replaced_with.is_some()),
                }
            })
            .collect();
        SimulationReport {
            events: self.events,
            cards,
            finished_at: self.gallery.now(),
        }
    }
}
