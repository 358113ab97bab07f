//! Placeholder and fallback presentation.
//!
//! Card markup, rendered with maud:
//!
//! ```text
//! article.embed-card#post-N
//! ├── div.embed-placeholder       preview image (+ caption for "polaroid")
//! ├── div.embed-slot              data-embed-src = embed URL; frames go here
//! └── a.embed-open                external "Open" link (inert when the post has no URL)
//! ```
//!
//! The placeholder is visible from the moment the card is appended. On
//! success it fades out over the fade duration and is then removed from
//! layout; on terminal failure it gets the same teardown while the slot's
//! contents are replaced by the fallback quotation.
//!
//! All interpolated text goes through maud's escaping (`&`, `<`, `>`, `"`).

use crate::config::{FallbackConfig, PlaceholderStyle};
use crate::surface::{PlaceholderState, Surface};
use crate::types::{CardId, FrameId, PostDescriptor};
use maud::{Markup, html};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Presenter {
    style: PlaceholderStyle,
    fallback: FallbackConfig,
    fade: Duration,
}

impl Presenter {
    pub fn new(style: PlaceholderStyle, fallback: FallbackConfig, fade: Duration) -> Self {
        Self {
            style,
            fallback,
            fade,
        }
    }

    pub fn fade_duration(&self) -> Duration {
        self.fade
    }

    /// Full card with its placeholder showing.
    pub fn card_markup(&self, card: CardId, post: &PostDescriptor) -> Markup {
        let src = post.has_embed().then_some(post.embed_url.as_str());
        html! {
            article.embed-card id=(card.dom_id()) {
                (self.placeholder_markup(post))
                div.embed-slot data-embed-src=[src] {}
                @if let Some(href) = src {
                    a.embed-open href=(href) target="_blank" rel="noopener" {
                        (self.fallback.open_label)
                    }
                } @else {
                    // No destination yet: keep the label in place but not as a link.
                    a.embed-open.is-disabled aria-disabled="true" {
                        (self.fallback.open_label)
                    }
                }
            }
        }
    }

    fn placeholder_markup(&self, post: &PostDescriptor) -> Markup {
        html! {
            @match self.style {
                PlaceholderStyle::Image => {
                    div.embed-placeholder {
                        img src=(post.preview_image_url) alt=(post.title) loading="lazy";
                    }
                }
                PlaceholderStyle::Polaroid => {
                    figure.embed-placeholder.polaroid {
                        img src=(post.preview_image_url) alt="" loading="lazy";
                        figcaption { (post.title) }
                    }
                }
            }
        }
    }

    /// Static block that takes the slot's place after retries run out.
    pub fn fallback_markup(&self, post: &PostDescriptor) -> Markup {
        html! {
            div.embed-fallback {
                blockquote.embed-fallback-quote {
                    "\u{201c}" (post.title) "\u{201d}"
                }
                p.embed-fallback-byline { (self.fallback.byline) }
                p.embed-fallback-cta { (self.fallback.cta) }
            }
        }
    }

    /// Start the placeholder fade and show the live frame.
    ///
    /// Returns how long the caller must wait before [`Presenter::finish_teardown`].
    pub fn reveal(&self, surface: &mut dyn Surface, card: CardId, frame: FrameId) -> Duration {
        surface.set_placeholder(card, PlaceholderState::Fading);
        surface.show_frame(card, frame);
        self.fade
    }

    /// Start the placeholder fade and swap the slot for the fallback block.
    pub fn fallback(
        &self,
        surface: &mut dyn Surface,
        card: CardId,
        post: &PostDescriptor,
    ) -> Duration {
        surface.set_placeholder(card, PlaceholderState::Fading);
        surface.replace_embed(card, self.fallback_markup(post));
        self.fade
    }

    /// Take the faded placeholder out of layout.
    pub fn finish_teardown(&self, surface: &mut dyn Surface, card: CardId) {
        surface.set_placeholder(card, PlaceholderState::Removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    fn presenter(style: PlaceholderStyle) -> Presenter {
        Presenter::new(style, FallbackConfig::default(), Duration::from_millis(400))
    }

    fn post() -> PostDescriptor {
        PostDescriptor::new("Launch day", "images/launch.jpg", "https://embed/launch")
    }

    #[test]
    fn card_markup_has_marker_and_open_link() {
        let html = presenter(PlaceholderStyle::Image)
            .card_markup(CardId(2), &post())
            .into_string();
        assert!(html.contains(r#"id="post-2""#));
        assert!(html.contains(r#"data-embed-src="https://embed/launch""#));
        assert!(html.contains("embed-placeholder"));
        assert!(html.contains(r#"class="embed-open""#));
        assert!(html.contains(">Open</a>"));
    }

    #[test]
    fn card_without_source_has_no_marker() {
        let post = PostDescriptor::new("Draft", "images/draft.jpg", "");
        let html = presenter(PlaceholderStyle::Image)
            .card_markup(CardId(0), &post)
            .into_string();
        assert!(!html.contains("data-embed-src"));
        // The Open label is still rendered, without a link back to the page
        assert!(html.contains(r#"class="embed-open is-disabled""#));
        assert!(html.contains(r#"aria-disabled="true""#));
        assert!(!html.contains("href="));
    }

    #[test]
    fn card_markup_carries_no_stale_state() {
        let html = presenter(PlaceholderStyle::Image)
            .card_markup(CardId(0), &post())
            .into_string();
        assert!(!html.contains("data-embed-state"));
    }

    #[test]
    fn polaroid_placeholder_has_caption() {
        let html = presenter(PlaceholderStyle::Polaroid)
            .card_markup(CardId(0), &post())
            .into_string();
        assert!(html.contains("polaroid"));
        assert!(html.contains("<figcaption>Launch day</figcaption>"));
    }

    #[test]
    fn fallback_escapes_title() {
        let post = PostDescriptor::new(r#"<script>&"</script>"#, "p.jpg", "https://embed/x");
        let html = presenter(PlaceholderStyle::Image)
            .fallback_markup(&post)
            .into_string();
        assert!(html.contains("&lt;script&gt;&amp;&quot;&lt;/script&gt;"));
        assert!(!html.contains("<script"));
        assert!(!html.contains("</script>"));
    }

    #[test]
    fn fallback_has_quote_byline_and_cta() {
        let html = presenter(PlaceholderStyle::Image)
            .fallback_markup(&post())
            .into_string();
        assert!(html.contains("\u{201c}Launch day\u{201d}"));
        assert!(html.contains("Posted on LinkedIn"));
        assert!(html.contains("Use Open"));
    }

    #[test]
    fn reveal_fades_then_teardown_removes() {
        let p = presenter(PlaceholderStyle::Image);
        let mut surface = MemorySurface::new();
        surface.append_card(CardId(0), p.card_markup(CardId(0), &post())).unwrap();
        surface.attach_frame(CardId(0), FrameId(1), "https://embed/launch");

        let wait = p.reveal(&mut surface, CardId(0), FrameId(1));
        assert_eq!(wait, Duration::from_millis(400));
        let view = surface.card(CardId(0)).unwrap();
        assert_eq!(view.placeholder, PlaceholderState::Fading);
        assert_eq!(view.visible_frames(), 1);

        p.finish_teardown(&mut surface, CardId(0));
        assert!(!surface.card(CardId(0)).unwrap().placeholder_visible());
    }
}
