//! Static page rendering.
//!
//! Renders the marketing page shell that the loader runs inside: header with
//! the desktop nav and the mobile dropdown, the hero slideshow's two slots,
//! and an empty posts carousel. Cards are never baked into the page; the
//! gallery fetches the catalog named by the track's `data-catalog` on every
//! visit and appends them itself.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html     # page shell, carousel track empty
//! └── posts.json     # catalog, copied so the page can fetch it at runtime
//! ```
//!
//! Uses [maud](https://maud.lambda.xyz/) like the card markup in
//! [`crate::present`]; all interpolation is escaped.

use crate::chrome::{self, MenuState, Slideshow};
use crate::config::GalleryConfig;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// In-page sections, in document order: `(id, nav label)`.
pub const SECTIONS: &[(&str, &str)] = &[("home", "Home"), ("posts", "Posts"), ("contact", "Contact")];

const CSS: &str = include_str!("../static/style.css");

/// What [`render_site`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSite {
    pub index: PathBuf,
    /// Copied catalog, if the site has one.
    pub catalog: Option<PathBuf>,
}

/// Render `index.html` into `output_dir` and copy the catalog next to it.
///
/// The catalog is not read here. A missing one is not an error: the page
/// renders, and the gallery logs the failed fetch and shows no cards.
pub fn render_site(
    site_root: &Path,
    output_dir: &Path,
    config: &GalleryConfig,
) -> Result<RenderedSite, RenderError> {
    fs::create_dir_all(output_dir)?;
    let index = output_dir.join("index.html");
    fs::write(&index, render_page(config).into_string())?;

    let catalog_src = site_root.join(&config.catalog.location);
    let catalog = if catalog_src.is_file() {
        let dst = output_dir.join(&config.catalog.location);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&catalog_src, &dst)?;
        Some(dst)
    } else {
        None
    };

    Ok(RenderedSite { index, catalog })
}

/// The full page.
pub fn render_page(config: &GalleryConfig) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Posts" }
                style { (PreEscaped(CSS)) }
            }
            body {
                (site_header(MenuState::default()))
                main {
                    (hero(&Slideshow::default()))
                    (posts_section(config))
                    section #contact {}
                }
            }
        }
    }
}

/// Header with desktop nav, toggle button and the (closed) mobile dropdown.
fn site_header(menu: MenuState) -> Markup {
    html! {
        header.site-header {
            a.brand href="#home" { "Home" }
            nav.nav {
                @for (id, label) in SECTIONS {
                    a.nav-link href={ "#" (id) } { (label) }
                }
            }
            button.nav-toggle type="button" aria-controls="mobile-menu"
                aria-expanded=(menu.aria_expanded()) aria-label=(menu.aria_label()) { "☰" }
            div #mobile-menu class=[menu.is_open().then_some("is-open")] {
                @for (id, label) in SECTIONS {
                    a href={ "#" (id) } { (label) }
                }
            }
        }
    }
}

/// Two stacked slots; the first starts visible on slide 1.
fn hero(show: &Slideshow) -> Markup {
    let [next, after] = show.preload_ahead();
    html! {
        section #home.hero-slideshow {
            img.slide.is-visible src=(chrome::slide_src(show.current())) alt="";
            img.slide src=(next) alt="" data-preload=(after);
        }
    }
}

/// Carousel with an empty track. `--embed-fade` keeps the CSS placeholder
/// transition in step with the configured fade.
fn posts_section(config: &GalleryConfig) -> Markup {
    let fade_ms = config.policy().fade_duration.as_millis() as u64;
    let cache_bust = if config.catalog.cache_bust { "true" } else { "false" };
    html! {
        section #posts.linkedin-carousel style={ "--embed-fade: " (fade_ms) "ms" } {
            button.linkedin-arrow.prev type="button" aria-label="Previous posts" { "‹" }
            div.linkedin-track
                data-catalog=(config.catalog.location)
                data-cache-bust=(cache_bust) {}
            button.linkedin-arrow.next type="button" aria-label="Next posts" { "›" }
        }
    }
}
