//! CLI output formatting.
//!
//! Output is **post-centric**: every card leads with its 1-based position and
//! title, with details (image, embed URL, state changes) as indented context
//! lines underneath.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Posts
//! 001 We're hiring
//!     Image: images/posts/hiring.jpg
//!     Embed: https://www.linkedin.com/embed/feed/update/urn:li:share:1
//! 002 Draft
//!     Image: images/posts/draft.jpg
//!     Embed: (none, stays as placeholder)
//! ```
//!
//! ## Render
//!
//! ```text
//! Home → index.html
//! Catalog → posts.json (fetched by the page on every visit)
//! ```
//!
//! ## Simulate
//!
//! ```text
//! 001 We're hiring: Success after 1 attempt
//!     0ms Idle
//!     0ms Loading(1)
//!     250ms Success
//! 002 Launch recap: Failed after 2 attempts (fallback shown)
//!     ...
//!
//! Loaded 1, failed 1, still loading 0, idle 0 (finished at 4900ms)
//! ```
//!
//! Each `format_*` function is pure and returns lines; `print_*` writes
//! them to stdout.

use crate::machine::LoadState;
use crate::page::RenderedSite;
use crate::simulate::{CardReport, SimulationReport};
use crate::types::{CardId, PostDescriptor};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn post_header(index: usize, title: &str) -> String {
    format!("{} {}", CardId(index), title)
}

fn plural(n: u32, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn display_name(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Check
// ============================================================================

pub fn format_catalog(posts: &[PostDescriptor]) -> Vec<String> {
    let mut lines = vec!["Posts".to_string()];
    if posts.is_empty() {
        lines.push(format!("{}(empty)", indent(1)));
    }
    for (i, post) in posts.iter().enumerate() {
        lines.push(post_header(i, &post.title));
        lines.push(format!("{}Image: {}", indent(1), post.preview_image_url));
        if post.has_embed() {
            lines.push(format!("{}Embed: {}", indent(1), post.embed_url));
        } else {
            lines.push(format!("{}Embed: (none, stays as placeholder)", indent(1)));
        }
    }
    lines
}

pub fn print_catalog(posts: &[PostDescriptor]) {
    for line in format_catalog(posts) {
        println!("{}", line);
    }
}

// ============================================================================
// Render
// ============================================================================

pub fn format_render_output(rendered: &RenderedSite, output_dir: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Home \u{2192} {}",
        display_name(&rendered.index, output_dir)
    )];
    match &rendered.catalog {
        Some(path) => lines.push(format!(
            "Catalog \u{2192} {} (fetched by the page on every visit)",
            display_name(path, output_dir)
        )),
        None => lines.push("Catalog: missing, carousel will be empty".to_string()),
    }
    lines
}

pub fn print_render_output(rendered: &RenderedSite, output_dir: &Path) {
    for line in format_render_output(rendered, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Simulate
// ============================================================================

fn card_outcome(card: &CardReport) -> String {
    let attempts = plural(card.attempts, "attempt");
    match card.state {
        LoadState::Success => format!("Success after {attempts}"),
        LoadState::Failed if card.fallback_shown => {
            format!("Failed after {attempts} (fallback shown)")
        }
        LoadState::Failed => format!("Failed after {attempts}"),
        LoadState::Idle => "Idle (never loaded)".to_string(),
        other => format!("{other}, waiting for the frame"),
    }
}

pub fn format_simulation(report: &SimulationReport) -> Vec<String> {
    let mut lines = Vec::new();
    let (mut loaded, mut failed, mut loading, mut idle) = (0, 0, 0, 0);

    for card in &report.cards {
        lines.push(format!(
            "{}: {}",
            post_header(card.card.0, &card.title),
            card_outcome(card)
        ));
        for event in report.events.iter().filter(|e| e.card == card.card) {
            lines.push(format!(
                "{}{}ms {}",
                indent(1),
                event.at.as_millis(),
                event.state
            ));
        }
        match card.state {
            LoadState::Success => loaded += 1,
            LoadState::Failed => failed += 1,
            LoadState::Idle => idle += 1,
            _ => loading += 1,
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Loaded {loaded}, failed {failed}, still loading {loading}, idle {idle} (finished at {}ms)",
        report.finished_at.as_millis()
    ));
    lines
}

pub fn print_simulation(report: &SimulationReport) {
    for line in format_simulation(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::SimEvent;
    use std::path::PathBuf;
    use std::time::Duration;

    fn post(title: &str, url: &str) -> PostDescriptor {
        PostDescriptor::new(title, "images/p.jpg", url)
    }

    #[test]
    fn catalog_lists_posts_with_context() {
        let lines = format_catalog(&[post("Hiring", "https://embed/1"), post("Draft", "")]);
        assert_eq!(
            lines,
            vec![
                "Posts",
                "001 Hiring",
                "    Image: images/p.jpg",
                "    Embed: https://embed/1",
                "002 Draft",
                "    Image: images/p.jpg",
                "    Embed: (none, stays as placeholder)",
            ]
        );
    }

    #[test]
    fn empty_catalog_says_so() {
        assert_eq!(format_catalog(&[]), vec!["Posts", "    (empty)"]);
    }

    #[test]
    fn render_output_uses_relative_paths() {
        let out = PathBuf::from("/tmp/dist");
        let rendered = RenderedSite {
            index: out.join("index.html"),
            catalog: Some(out.join("posts.json")),
        };
        let lines = format_render_output(&rendered, &out);
        assert_eq!(
            lines,
            vec![
                "Home \u{2192} index.html",
                "Catalog \u{2192} posts.json (fetched by the page on every visit)",
            ]
        );
    }

    #[test]
    fn render_output_missing_catalog() {
        let out = PathBuf::from("dist");
        let rendered = RenderedSite {
            index: out.join("index.html"),
            catalog: None,
        };
        let lines = format_render_output(&rendered, &out);
        assert_eq!(lines[1], "Catalog: missing, carousel will be empty");
    }

    #[test]
    fn simulation_lists_history_and_summary() {
        let report = SimulationReport {
            events: vec![
                SimEvent {
                    at: Duration::ZERO,
                    card: CardId(0),
                    state: LoadState::Idle,
                },
                SimEvent {
                    at: Duration::from_millis(250),
                    card: CardId(0),
                    state: LoadState::Failed,
                },
            ],
            cards: vec![CardReport {
                card: CardId(0),
                title: "Hiring".to_string(),
                state: LoadState::Failed,
                attempts: 2,
                placeholder_visible: false,
                visible_frames: 0,
                fallback_shown: true,
            }],
            finished_at: Duration::from_millis(650),
        };
        let lines = format_simulation(&report);
        assert_eq!(lines[0], "001 Hiring: Failed after 2 attempts (fallback shown)");
        assert_eq!(lines[1], "    0ms Idle");
        assert_eq!(lines[2], "    250ms Failed");
        assert_eq!(
            lines.last().unwrap(),
            "Loaded 0, failed 1, still loading 0, idle 0 (finished at 650ms)"
        );
    }
}
