//! The DOM boundary.
//!
//! [`Surface`] lists the only writes the gallery makes to the page: appending
//! card markup to the display container, attaching and detaching frames,
//! toggling placeholder and frame visibility, and replacing an embed
//! container's contents with the fallback card. A browser host implements it
//! over real elements; [`MemorySurface`] keeps an inspectable model of the
//! same writes for tests and the `simulate` command.

use crate::types::{CardId, FrameId};
use maud::Markup;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("display container is missing")]
    ContainerMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderState {
    Visible,
    /// Opacity transition running; still takes up layout.
    Fading,
    /// Out of layout (`display: none`).
    Removed,
}

pub trait Surface {
    /// Append a rendered card to the display container.
    fn append_card(&mut self, card: CardId, markup: Markup) -> Result<(), SurfaceError>;

    /// Create a hidden frame inside the card's embed container and point it at `src`.
    fn attach_frame(&mut self, card: CardId, frame: FrameId, src: &str);

    /// Remove a frame from the card, abandoning whatever it was loading.
    fn detach_frame(&mut self, card: CardId, frame: FrameId);

    /// Make a frame visible and interactive.
    fn show_frame(&mut self, card: CardId, frame: FrameId);

    fn set_placeholder(&mut self, card: CardId, state: PlaceholderState);

    /// Replace the embed container's contents.
    fn replace_embed(&mut self, card: CardId, markup: Markup);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameView {
    pub id: FrameId,
    pub src: String,
    pub visible: bool,
}

/// In-memory model of one card's DOM.
#[derive(Debug, Clone)]
pub struct CardView {
    pub markup: String,
    pub placeholder: PlaceholderState,
    pub frames: Vec<FrameView>,
    /// Embed container contents after a fallback replaced them.
    pub replaced_with: Option<String>,
    /// How many times the embed container was replaced.
    pub replacements: usize,
}

impl CardView {
    pub fn placeholder_visible(&self) -> bool {
        self.placeholder != PlaceholderState::Removed
    }

    pub fn visible_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.visible).count()
    }
}

/// Every write, in order, for assertions that care about sequencing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    Append(CardId),
    Attach(CardId, FrameId),
    Detach(CardId, FrameId),
    Show(CardId, FrameId),
    Placeholder(CardId, PlaceholderState),
    Replace(CardId),
}

#[derive(Debug)]
pub struct MemorySurface {
    container_present: bool,
    cards: Vec<CardView>,
    ops: Vec<SurfaceOp>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        Self {
            container_present: true,
            cards: Vec::new(),
            ops: Vec::new(),
        }
    }

    /// A page without a display container.
    pub fn without_container() -> Self {
        Self {
            container_present: false,
            ..Self::new()
        }
    }

    pub fn cards(&self) -> &[CardView] {
        &self.cards
    }

    pub fn card(&self, card: CardId) -> Option<&CardView> {
        self.cards.get(card.0)
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    fn view_mut(&mut self, card: CardId) -> Option<&mut CardView> {
        self.cards.get_mut(card.0)
    }
}

impl Surface for MemorySurface {
    fn append_card(&mut self, card: CardId, markup: Markup) -> Result<(), SurfaceError> {
        if !self.container_present {
            return Err(SurfaceError::ContainerMissing);
        }
        self.cards.push(CardView {
            markup: markup.into_string(),
            placeholder: PlaceholderState::Visible,
            frames: Vec::new(),
            replaced_with: None,
            replacements: 0,
        });
        self.ops.push(SurfaceOp::Append(card));
        Ok(())
    }

    fn attach_frame(&mut self, card: CardId, frame: FrameId, src: &str) {
        if let Some(view) = self.view_mut(card) {
            view.frames.push(FrameView {
                id: frame,
                src: src.to_string(),
                visible: false,
            });
            self.ops.push(SurfaceOp::Attach(card, frame));
        }
    }

    fn detach_frame(&mut self, card: CardId, frame: FrameId) {
        if let Some(view) = self.view_mut(card) {
            view.frames.retain(|f| f.id != frame);
            self.ops.push(SurfaceOp::Detach(card, frame));
        }
    }

    fn show_frame(&mut self, card: CardId, frame: FrameId) {
        if let Some(view) = self.view_mut(card) {
            if let Some(f) = view.frames.iter_mut().find(|f| f.id == frame) {
                f.visible = true;
            }
            self.ops.push(SurfaceOp::Show(card, frame));
        }
    }

    fn set_placeholder(&mut self, card: CardId, state: PlaceholderState) {
        if let Some(view) = self.view_mut(card) {
            view.placeholder = state;
            self.ops.push(SurfaceOp::Placeholder(card, state));
        }
    }

    fn replace_embed(&mut self, card: CardId, markup: Markup) {
        if let Some(view) = self.view_mut(card) {
            view.frames.clear();
            view.replaced_with = Some(markup.into_string());
            view.replacements += 1;
            self.ops.push(SurfaceOp::Replace(card));
        }
    }
}
