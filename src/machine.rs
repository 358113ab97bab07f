//! Embed load state machine.
//!
//! ```text
//!         Trigger              Loaded(Denied)
//!  Idle ──────────► Loading(n) ───────────────► Success
//!                     │   ▲
//!   Loaded(Readable)  │   │ RetryElapsed   (n < max)
//!   or Errored        ▼   │
//!                  RetryPending(n) ─────────────► Failed   (n ≥ max)
//! ```
//!
//! The provider's frame is cross-origin, and its `load` event fires both for
//! real embeds and for the blank or error pages it serves on the embedding
//! site's origin. The only usable signal is whether the loaded document can be
//! read:
//!
//! - reading is **denied** → the real third-party page loaded → `Success`
//! - reading **succeeds**, empty or not → an internal error page → retry
//!
//! [`transition`] is a pure function of `(state, event, policy)`. It returns
//! every state it passes through and the side effects the caller must carry
//! out; nothing here touches a DOM or a clock.

use crate::config::LoadPolicy;
use crate::types::{FrameId, PostDescriptor};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading { attempt: u32 },
    RetryPending { attempt: u32 },
    Success,
    Failed,
}

impl LoadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Success | LoadState::Failed)
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::Idle => write!(f, "Idle"),
            LoadState::Loading { attempt } => write!(f, "Loading({attempt})"),
            LoadState::RetryPending { attempt } => write!(f, "RetryPending({attempt})"),
            LoadState::Success => write!(f, "Success"),
            LoadState::Failed => write!(f, "Failed"),
        }
    }
}

/// Result of trying to read a loaded frame's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAccess {
    /// Cross-origin security fault: the genuine embed.
    Denied,
    /// Same-origin document. `empty` is informational only; both count as failure.
    Readable { empty: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadEvent {
    /// The scheduler decided this card should load.
    Trigger,
    /// The current frame fired `load`.
    Loaded(FrameAccess),
    /// The current frame fired `error`.
    Errored,
    /// The retry delay has elapsed.
    RetryElapsed,
}

/// Side effects requested by a transition, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Build a fresh frame pointing at the embed URL and start loading it.
    CreateFrame { attempt: u32 },
    /// Detach and drop the current frame.
    DiscardFrame,
    /// Deliver [`LoadEvent::RetryElapsed`] after `delay`.
    ScheduleRetry { delay: Duration },
    /// Fade out the placeholder and show the live frame.
    Reveal,
    /// Tear down the placeholder and show the static fallback card.
    ShowFallback,
}

/// States entered (in order) plus effects to run. Both empty when the event
/// doesn't apply to the current state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub entered: Vec<LoadState>,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: LoadState, effects: Vec<Effect>) -> Self {
        Self {
            entered: vec![state],
            effects,
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.entered.is_empty()
    }

    /// The state the machine ends up in, given where it started.
    pub fn final_state(&self, from: LoadState) -> LoadState {
        self.entered.last().copied().unwrap_or(from)
    }
}

/// Compute the transition for `event` in `state`.
///
/// `has_source` is whether the card has an embed URL at all; without one a
/// trigger is a no-op and the card stays `Idle`.
pub fn transition(
    state: LoadState,
    event: LoadEvent,
    policy: &LoadPolicy,
    has_source: bool,
) -> Transition {
    match (state, event) {
        (LoadState::Idle, LoadEvent::Trigger) if has_source => Transition::to(
            LoadState::Loading { attempt: 1 },
            vec![Effect::CreateFrame { attempt: 1 }],
        ),
        (LoadState::Loading { .. }, LoadEvent::Loaded(FrameAccess::Denied)) => {
            Transition::to(LoadState::Success, vec![Effect::Reveal])
        }
        (LoadState::Loading { attempt }, LoadEvent::Loaded(FrameAccess::Readable { .. }))
        | (LoadState::Loading { attempt }, LoadEvent::Errored) => attempt_failed(attempt, policy),
        (LoadState::RetryPending { attempt }, LoadEvent::RetryElapsed)
            if attempt < policy.max_attempts =>
        {
            let next = attempt + 1;
            Transition::to(
                LoadState::Loading { attempt: next },
                vec![Effect::DiscardFrame, Effect::CreateFrame { attempt: next }],
            )
        }
        _ => Transition::default(),
    }
}

fn attempt_failed(attempt: u32, policy: &LoadPolicy) -> Transition {
    let pending = LoadState::RetryPending { attempt };
    if attempt < policy.max_attempts {
        Transition::to(
            pending,
            vec![Effect::ScheduleRetry {
                delay: policy.retry_delay,
            }],
        )
    } else {
        Transition {
            entered: vec![pending, LoadState::Failed],
            effects: vec![Effect::DiscardFrame, Effect::ShowFallback],
        }
    }
}

/// One rendered post and its load lifecycle.
///
/// The gallery owns every card; only [`EmbedCard::apply`] changes its state.
#[derive(Debug, Clone)]
pub struct EmbedCard {
    pub post: PostDescriptor,
    state: LoadState,
    attempts: u32,
    frame: Option<FrameId>,
    history: Vec<LoadState>,
}

impl EmbedCard {
    pub fn new(post: PostDescriptor) -> Self {
        Self {
            post,
            state: LoadState::Idle,
            attempts: 0,
            frame: None,
            history: vec![LoadState::Idle],
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Number of load attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Every state the card has been in, starting with `Idle`.
    pub fn history(&self) -> &[LoadState] {
        &self.history
    }

    /// The live frame, if one is attached.
    pub fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    pub fn set_frame(&mut self, frame: Option<FrameId>) {
        self.frame = frame;
    }

    /// Feed an event through [`transition`] and record the result.
    pub fn apply(&mut self, event: LoadEvent, policy: &LoadPolicy) -> Transition {
        let step = transition(self.state, event, policy, self.post.has_embed());
        for effect in &step.effects {
            if let Effect::CreateFrame { attempt } = effect {
                self.attempts = *attempt;
            }
        }
        self.history.extend_from_slice(&step.entered);
        self.state = step.final_state(self.state);
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LoadState::*;

    fn policy() -> LoadPolicy {
        LoadPolicy::default()
    }

    fn card() -> EmbedCard {
        EmbedCard::new(PostDescriptor::new("t", "p.jpg", "https://embed/1"))
    }

    const READABLE: LoadEvent = LoadEvent::Loaded(FrameAccess::Readable { empty: false });
    const DENIED: LoadEvent = LoadEvent::Loaded(FrameAccess::Denied);

    #[test]
    fn trigger_starts_first_attempt() {
        let step = transition(Idle, LoadEvent::Trigger, &policy(), true);
        assert_eq!(step.entered, vec![Loading { attempt: 1 }]);
        assert_eq!(step.effects, vec![Effect::CreateFrame { attempt: 1 }]);
    }

    #[test]
    fn trigger_without_source_is_noop() {
        let step = transition(Idle, LoadEvent::Trigger, &policy(), false);
        assert!(step.is_ignored());
        assert!(step.effects.is_empty());
    }

    #[test]
    fn denied_access_is_success() {
        let step = transition(Loading { attempt: 1 }, DENIED, &policy(), true);
        assert_eq!(step.entered, vec![Success]);
        assert_eq!(step.effects, vec![Effect::Reveal]);
    }

    #[test]
    fn readable_document_schedules_retry() {
        let step = transition(Loading { attempt: 1 }, READABLE, &policy(), true);
        assert_eq!(step.entered, vec![RetryPending { attempt: 1 }]);
        assert_eq!(
            step.effects,
            vec![Effect::ScheduleRetry {
                delay: Duration::from_millis(4000)
            }]
        );
    }

    #[test]
    fn empty_readable_document_is_also_failure() {
        let empty = LoadEvent::Loaded(FrameAccess::Readable { empty: true });
        let step = transition(Loading { attempt: 1 }, empty, &policy(), true);
        assert_eq!(step.entered, vec![RetryPending { attempt: 1 }]);
    }

    #[test]
    fn error_schedules_retry() {
        let step = transition(Loading { attempt: 1 }, LoadEvent::Errored, &policy(), true);
        assert_eq!(step.entered, vec![RetryPending { attempt: 1 }]);
    }

    #[test]
    fn retry_rebuilds_frame() {
        let step = transition(
            RetryPending { attempt: 1 },
            LoadEvent::RetryElapsed,
            &policy(),
            true,
        );
        assert_eq!(step.entered, vec![Loading { attempt: 2 }]);
        assert_eq!(
            step.effects,
            vec![Effect::DiscardFrame, Effect::CreateFrame { attempt: 2 }]
        );
    }

    #[test]
    fn last_attempt_failure_is_terminal() {
        let step = transition(Loading { attempt: 2 }, LoadEvent::Errored, &policy(), true);
        assert_eq!(step.entered, vec![RetryPending { attempt: 2 }, Failed]);
        assert_eq!(step.effects, vec![Effect::DiscardFrame, Effect::ShowFallback]);
    }

    #[test]
    fn terminal_states_ignore_everything() {
        for state in [Success, Failed] {
            for event in [LoadEvent::Trigger, DENIED, READABLE, LoadEvent::Errored, LoadEvent::RetryElapsed] {
                assert!(transition(state, event, &policy(), true).is_ignored());
            }
        }
    }

    #[test]
    fn stray_signals_are_ignored() {
        assert!(transition(Idle, DENIED, &policy(), true).is_ignored());
        assert!(transition(RetryPending { attempt: 1 }, LoadEvent::Errored, &policy(), true).is_ignored());
        assert!(transition(Loading { attempt: 1 }, LoadEvent::RetryElapsed, &policy(), true).is_ignored());
        assert!(transition(Loading { attempt: 1 }, LoadEvent::Trigger, &policy(), true).is_ignored());
    }

    #[test]
    fn card_double_readable_reaches_failed() {
        let mut card = card();
        let p = policy();
        card.apply(LoadEvent::Trigger, &p);
        card.apply(READABLE, &p);
        card.apply(LoadEvent::RetryElapsed, &p);
        let last = card.apply(READABLE, &p);

        assert_eq!(
            card.history(),
            &[
                Idle,
                Loading { attempt: 1 },
                RetryPending { attempt: 1 },
                Loading { attempt: 2 },
                RetryPending { attempt: 2 },
                Failed
            ]
        );
        assert_eq!(card.attempts(), 2);
        assert!(!last.effects.iter().any(|e| matches!(e, Effect::ScheduleRetry { .. })));
        assert!(card.apply(LoadEvent::RetryElapsed, &p).is_ignored());
    }

    #[test]
    fn card_first_denied_is_success() {
        let mut card = card();
        let p = policy();
        card.apply(LoadEvent::Trigger, &p);
        card.apply(DENIED, &p);
        assert_eq!(card.history(), &[Idle, Loading { attempt: 1 }, Success]);
        assert_eq!(card.attempts(), 1);
    }

    #[test]
    fn larger_budget_allows_more_attempts() {
        let p = LoadPolicy {
            max_attempts: 3,
            ..LoadPolicy::immediate()
        };
        let mut card = card();
        card.apply(LoadEvent::Trigger, &p);
        for _ in 0..2 {
            card.apply(LoadEvent::Errored, &p);
            card.apply(LoadEvent::RetryElapsed, &p);
        }
        card.apply(LoadEvent::Errored, &p);
        assert_eq!(card.state(), Failed);
        assert_eq!(card.attempts(), 3);
    }

    #[test]
    fn state_display() {
        assert_eq!(Loading { attempt: 2 }.to_string(), "Loading(2)");
        assert_eq!(RetryPending { attempt: 1 }.to_string(), "RetryPending(1)");
    }
}
