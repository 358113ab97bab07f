//! Page chrome around the posts carousel.
//!
//! These are the simple, stateless-ish widgets the page wires up next to the
//! embed loader. Each is a small model of the state a host toggles on the
//! DOM; none of them fail or need scheduling beyond a single timer.
//!
//! - [`MenuState`]: mobile header dropdown
//! - [`Slideshow`]: two-slot crossfading hero slideshow
//! - [`active_section`]: scroll-spy for the desktop nav
//! - [`carousel_step`]: how far the carousel arrows scroll

use std::time::Duration;

// ============================================================================
// Mobile menu
// ============================================================================

/// Widths above this are desktop layout; the dropdown is closed on resize.
pub const DESKTOP_MIN_WIDTH: f64 = 900.0;

/// Open/closed state of the mobile dropdown.
///
/// The host mirrors it onto the page: `is-menu-open` on the header,
/// `is-open` on the menu, and [`MenuState::aria_expanded`] /
/// [`MenuState::aria_label`] on the toggle button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuState {
    open: bool,
}

impl MenuState {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set(&mut self, open: bool) {
        self.open = open;
    }

    /// Toggle button clicked.
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// A link inside the menu was followed.
    pub fn on_link_click(&mut self) {
        self.open = false;
    }

    pub fn on_key(&mut self, key: &str) {
        if key == "Escape" {
            self.open = false;
        }
    }

    /// Prevents the menu staying open after switching to the desktop layout.
    pub fn on_resize(&mut self, width: f64) {
        if width > DESKTOP_MIN_WIDTH {
            self.open = false;
        }
    }

    pub fn aria_expanded(&self) -> &'static str {
        if self.open { "true" } else { "false" }
    }

    pub fn aria_label(&self) -> &'static str {
        if self.open { "Close menu" } else { "Open menu" }
    }
}

// ============================================================================
// Hero slideshow
// ============================================================================

pub const SLIDE_COUNT: usize = 10;
/// Must match the CSS opacity transition.
pub const SLIDE_FADE: Duration = Duration::from_millis(1800);
/// Time per slide, fade included.
pub const SLIDE_INTERVAL: Duration = Duration::from_millis(4000);

/// Image path for slide `index` (0-based): `images/hero-01.jpg` ...
pub fn slide_src(index: usize) -> String {
    format!("images/hero-{:02}.jpg", index + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

/// What the host must do to start a crossfade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossfade {
    /// Slot that receives `src` and becomes visible.
    pub incoming: Slot,
    /// Slot that loses its visible class.
    pub outgoing: Slot,
    pub src: String,
    /// Call [`Slideshow::finish_fade`] after this long.
    pub settle_after: Duration,
}

/// Two image slots crossfading through [`SLIDE_COUNT`] slides.
///
/// A crossfade in progress locks the slideshow; ticks arriving during it are
/// dropped. While the document is hidden the timer is stopped entirely and
/// the lock is released, but a crossfade already on screen still settles.
#[derive(Debug, Clone)]
pub struct Slideshow {
    index: usize,
    showing: Slot,
    locked: bool,
    fading: bool,
    running: bool,
    count: usize,
}

impl Default for Slideshow {
    fn default() -> Self {
        Self::new(SLIDE_COUNT)
    }
}

impl Slideshow {
    pub fn new(count: usize) -> Self {
        Self {
            index: 0,
            showing: Slot::A,
            locked: false,
            fading: false,
            running: count >= 2,
            count,
        }
    }

    /// Needs at least two slides to do anything.
    pub fn is_enabled(&self) -> bool {
        self.count >= 2
    }

    pub fn current(&self) -> usize {
        self.index
    }

    pub fn visible_slot(&self) -> Slot {
        self.showing
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Sources to preload: the two slides after the current one.
    pub fn preload_ahead(&self) -> [String; 2] {
        [
            slide_src((self.index + 1) % self.count.max(1)),
            slide_src((self.index + 2) % self.count.max(1)),
        ]
    }

    /// Interval timer fired. Returns the crossfade to run, if any.
    pub fn tick(&mut self) -> Option<Crossfade> {
        if !self.is_enabled() || self.locked || self.fading || !self.running {
            return None;
        }
        self.locked = true;
        self.fading = true;
        let next = (self.index + 1) % self.count;
        Some(Crossfade {
            incoming: self.showing.other(),
            outgoing: self.showing,
            src: slide_src(next),
            settle_after: SLIDE_FADE,
        })
    }

    /// The crossfade's transition finished.
    pub fn finish_fade(&mut self) {
        if !self.fading {
            return;
        }
        self.showing = self.showing.other();
        self.index = (self.index + 1) % self.count;
        self.fading = false;
        self.locked = false;
    }

    /// Page visibility changed. Hiding stops the timer and releases the lock;
    /// a crossfade in flight still completes through [`Slideshow::finish_fade`].
    pub fn on_visibility_change(&mut self, hidden: bool) {
        if hidden {
            self.running = false;
            self.locked = false;
        } else if self.is_enabled() {
            self.running = true;
        }
    }
}

// ============================================================================
// Scroll-spy
// ============================================================================

/// Sections count as reached this many pixels before their top edge.
pub const SECTION_OFFSET: f64 = 120.0;

/// Id of the last section whose top (less the offset) has been scrolled past.
///
/// `sections` is `(id, offset_top)` in document order.
pub fn active_section<'a>(sections: &[(&'a str, f64)], scroll_y: f64) -> Option<&'a str> {
    sections
        .iter()
        .filter(|(_, top)| scroll_y >= top - SECTION_OFFSET)
        .map(|(id, _)| *id)
        .last()
}

/// Whether a nav link with `href` should carry `is-active`.
pub fn is_active_link(href: &str, active: Option<&str>) -> bool {
    active.is_some_and(|id| href.strip_prefix('#') == Some(id))
}

// ============================================================================
// Carousel arrows
// ============================================================================

/// Step used when the track has no cards to measure.
pub const DEFAULT_CARD_STEP: f64 = 320.0;
pub const DEFAULT_TRACK_GAP: f64 = 16.0;

/// Scroll distance for one arrow click: one card plus the column gap.
///
/// `gap` is the parsed computed `column-gap`; unparseable or zero gaps fall
/// back to the default.
pub fn carousel_step(card_width: Option<f64>, gap: Option<f64>) -> f64 {
    let Some(width) = card_width else {
        return DEFAULT_CARD_STEP;
    };
    let gap = gap
        .filter(|g| g.is_finite() && *g != 0.0)
        .unwrap_or(DEFAULT_TRACK_GAP);
    width + gap
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    Prev,
    Next,
}

/// Horizontal `scrollBy` offset for an arrow click.
pub fn arrow_offset(arrow: Arrow, step: f64) -> f64 {
    match arrow {
        Arrow::Prev => -step,
        Arrow::Next => step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Menu
    // =========================================================================

    #[test]
    fn menu_toggle_updates_aria() {
        let mut menu = MenuState::default();
        assert_eq!(menu.aria_label(), "Open menu");
        menu.toggle();
        assert!(menu.is_open());
        assert_eq!(menu.aria_expanded(), "true");
        assert_eq!(menu.aria_label(), "Close menu");
    }

    #[test]
    fn menu_closes_on_escape_link_and_desktop_resize() {
        let mut menu = MenuState::default();

        menu.set(true);
        menu.on_key("Enter");
        assert!(menu.is_open());
        menu.on_key("Escape");
        assert!(!menu.is_open());

        menu.set(true);
        menu.on_link_click();
        assert!(!menu.is_open());

        menu.set(true);
        menu.on_resize(900.0);
        assert!(menu.is_open());
        menu.on_resize(901.0);
        assert!(!menu.is_open());
    }

    // =========================================================================
    // Slideshow
    // =========================================================================

    #[test]
    fn slide_sources_are_zero_padded() {
        assert_eq!(slide_src(0), "images/hero-01.jpg");
        assert_eq!(slide_src(9), "images/hero-10.jpg");
    }

    #[test]
    fn crossfade_alternates_slots() {
        let mut show = Slideshow::default();
        let fade = show.tick().unwrap();
        assert_eq!(fade.incoming, Slot::B);
        assert_eq!(fade.outgoing, Slot::A);
        assert_eq!(fade.src, "images/hero-02.jpg");
        assert_eq!(fade.settle_after, SLIDE_FADE);

        show.finish_fade();
        assert_eq!(show.current(), 1);
        assert_eq!(show.visible_slot(), Slot::B);
        assert_eq!(show.tick().unwrap().incoming, Slot::A);
    }

    #[test]
    fn tick_during_crossfade_is_dropped() {
        let mut show = Slideshow::default();
        assert!(show.tick().is_some());
        assert!(show.tick().is_none());
    }

    #[test]
    fn wraps_after_last_slide() {
        let mut show = Slideshow::new(3);
        for _ in 0..3 {
            show.tick();
            show.finish_fade();
        }
        assert_eq!(show.current(), 0);
        assert_eq!(show.preload_ahead(), [slide_src(1), slide_src(2)]);
    }

    #[test]
    fn hidden_page_pauses_and_resumes() {
        let mut show = Slideshow::default();
        show.on_visibility_change(true);
        assert!(!show.is_running());
        assert!(show.tick().is_none());

        show.on_visibility_change(false);
        assert!(show.is_running());
        assert!(show.tick().is_some());
    }

    #[test]
    fn crossfade_settles_even_if_hidden_midway() {
        let mut show = Slideshow::default();
        assert_eq!(show.tick().unwrap().incoming, Slot::B);
        show.on_visibility_change(true);
        show.finish_fade();
        assert_eq!(show.current(), 1);
        assert_eq!(show.visible_slot(), Slot::B);

        show.on_visibility_change(false);
        let next = show.tick().unwrap();
        assert_eq!(next.incoming, Slot::A);
        assert_eq!(next.src, "images/hero-03.jpg");
    }

    #[test]
    fn finish_without_crossfade_is_noop() {
        let mut show = Slideshow::default();
        show.finish_fade();
        assert_eq!(show.current(), 0);
        assert_eq!(show.visible_slot(), Slot::A);
    }

    #[test]
    fn single_slide_never_runs() {
        let mut show = Slideshow::new(1);
        assert!(!show.is_enabled());
        assert!(show.tick().is_none());
    }

    // =========================================================================
    // Scroll-spy
    // =========================================================================

    #[test]
    fn active_section_uses_offset() {
        let sections = [("home", 0.0), ("about", 800.0), ("posts", 1600.0)];
        assert_eq!(active_section(&sections, 0.0), Some("home"));
        assert_eq!(active_section(&sections, 679.0), Some("home"));
        assert_eq!(active_section(&sections, 680.0), Some("about"));
        assert_eq!(active_section(&sections, 5000.0), Some("posts"));
        assert_eq!(active_section(&[("late", 500.0)], 0.0), None);
    }

    #[test]
    fn link_matching() {
        assert!(is_active_link("#about", Some("about")));
        assert!(!is_active_link("#about", Some("posts")));
        assert!(!is_active_link("about", Some("about")));
        assert!(!is_active_link("#about", None));
    }

    // =========================================================================
    // Carousel
    // =========================================================================

    #[test]
    fn carousel_step_measures_card_and_gap() {
        assert_eq!(carousel_step(Some(300.0), Some(24.0)), 324.0);
        assert_eq!(carousel_step(Some(300.0), None), 316.0);
        assert_eq!(carousel_step(Some(300.0), Some(0.0)), 316.0);
        assert_eq!(carousel_step(None, Some(24.0)), DEFAULT_CARD_STEP);
    }

    #[test]
    fn arrows_scroll_opposite_ways() {
        assert_eq!(arrow_offset(Arrow::Prev, 320.0), -320.0);
        assert_eq!(arrow_offset(Arrow::Next, 320.0), 320.0);
    }
}
