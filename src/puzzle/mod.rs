//! Answer-selection minigames
//!
//! A puzzle owns one visual piece per answer candidate and decides whether the
//! player may pick an answer right now. All variants share the same lifecycle
//! (`initialize`, `start`, `stop`, `end`, each idempotent) and differ only in
//! how pieces are laid out and moved:
//!
//! - `Buttons`: fixed row, no motion
//! - `Swap`: pieces rotate one slot forward on a fixed interval
//! - `Path`: pieces ride a closed Catmull-Rom loop
//! - `Slide`: fixed grid layout

pub mod path;
pub mod slide;
pub mod swap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::CANDIDATE_COUNT;
use crate::error::{GameError, Result};

pub use path::PathPuzzle;
pub use slide::SlidePuzzle;
pub use swap::SwapPuzzle;

/// Which minigame gates answer selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PuzzleKind {
    #[default]
    Buttons,
    Swap,
    Slide,
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Uninitialized,
    Ready,
    Running,
    Stopped,
    Ended,
}

/// A selectable piece bound to at most one candidate slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzlePiece {
    pub id: u32,
    pub candidate: Option<usize>,
    pub pos: Vec2,
}

/// Per-variant state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PuzzleVariant {
    Buttons,
    Swap(SwapPuzzle),
    Slide(SlidePuzzle),
    Path(PathPuzzle),
}

/// Button row spacing in puzzle space
const BUTTON_SPACING: f32 = 1.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleInstance {
    pub kind: PuzzleKind,
    pub lifecycle: Lifecycle,
    pub pieces: Vec<PuzzlePiece>,
    /// Set by the presentation layer while a cover animation hides the puzzle
    pub cover_active: bool,
    variant: PuzzleVariant,
}

impl PuzzleInstance {
    pub fn new(kind: PuzzleKind) -> Self {
        let variant = match kind {
            PuzzleKind::Buttons => PuzzleVariant::Buttons,
            PuzzleKind::Swap => PuzzleVariant::Swap(SwapPuzzle::new(CANDIDATE_COUNT)),
            PuzzleKind::Slide => PuzzleVariant::Slide(SlidePuzzle::default()),
            PuzzleKind::Path => PuzzleVariant::Path(PathPuzzle::new()),
        };
        Self {
            kind,
            lifecycle: Lifecycle::Uninitialized,
            pieces: Vec::new(),
            cover_active: false,
            variant,
        }
    }

    pub fn variant(&self) -> &PuzzleVariant {
        &self.variant
    }

    /// Build pieces and their initial layout
    pub fn initialize(&mut self) {
        if !matches!(self.lifecycle, Lifecycle::Uninitialized | Lifecycle::Ended) {
            return;
        }
        self.pieces = (0..CANDIDATE_COUNT as u32)
            .map(|id| PuzzlePiece {
                id,
                candidate: None,
                pos: Vec2::ZERO,
            })
            .collect();

        match &mut self.variant {
            PuzzleVariant::Buttons => {
                let offset = (CANDIDATE_COUNT as f32 - 1.0) * BUTTON_SPACING / 2.0;
                for (i, piece) in self.pieces.iter_mut().enumerate() {
                    piece.pos = Vec2::new(i as f32 * BUTTON_SPACING - offset, 0.0);
                }
            }
            PuzzleVariant::Swap(swap) => swap.initialize(&mut self.pieces),
            PuzzleVariant::Slide(slide) => slide.initialize(&mut self.pieces),
            PuzzleVariant::Path(path) => path.initialize(&mut self.pieces),
        }
        self.lifecycle = Lifecycle::Ready;
    }

    pub fn start(&mut self) {
        match self.lifecycle {
            Lifecycle::Uninitialized => {
                self.initialize();
                self.lifecycle = Lifecycle::Running;
            }
            Lifecycle::Ready | Lifecycle::Stopped => self.lifecycle = Lifecycle::Running,
            Lifecycle::Running | Lifecycle::Ended => {}
        }
    }

    pub fn stop(&mut self) {
        if self.lifecycle == Lifecycle::Running {
            self.lifecycle = Lifecycle::Stopped;
        }
    }

    /// Tear down; a later `initialize` rebuilds from scratch
    pub fn end(&mut self) {
        if self.lifecycle == Lifecycle::Ended {
            return;
        }
        self.clear_bindings();
        self.lifecycle = Lifecycle::Ended;
    }

    /// Rebuild for a fresh stage attempt
    pub fn rebuild(&mut self) {
        *self = PuzzleInstance::new(self.kind);
        self.initialize();
    }

    /// Animate one unscaled timestep while running
    pub fn advance(&mut self, dt: f32) {
        if self.lifecycle != Lifecycle::Running {
            return;
        }
        match &mut self.variant {
            PuzzleVariant::Buttons | PuzzleVariant::Slide(_) => {}
            PuzzleVariant::Swap(swap) => swap.advance(dt, &mut self.pieces),
            PuzzleVariant::Path(path) => path.advance(dt, &mut self.pieces),
        }
    }

    /// Bind the first `count` pieces to candidate slots `0..count`
    pub fn bind(&mut self, count: usize) {
        for (i, piece) in self.pieces.iter_mut().enumerate() {
            piece.candidate = (i < count).then_some(i);
        }
    }

    pub fn clear_bindings(&mut self) {
        for piece in &mut self.pieces {
            piece.candidate = None;
        }
    }

    pub fn has_bindings(&self) -> bool {
        self.pieces.iter().any(|p| p.candidate.is_some())
    }

    pub fn set_cover(&mut self, active: bool) {
        self.cover_active = active;
    }

    /// Whether answers may be chosen right now
    pub fn accepts_input(&self) -> bool {
        self.lifecycle == Lifecycle::Running && !self.cover_active && self.has_bindings()
    }

    pub fn piece(&self, id: u32) -> Option<&PuzzlePiece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    /// Candidate slot chosen by selecting a piece.
    ///
    /// `Ok(None)` when input is currently gated or the piece is unbound.
    pub fn select(&self, piece_id: u32) -> Result<Option<usize>> {
        let piece = self.piece(piece_id).ok_or(GameError::UnknownPiece(piece_id))?;
        if !self.accepts_input() {
            return Ok(None);
        }
        Ok(piece.candidate)
    }

    /// Piece currently showing a candidate slot
    pub fn piece_for_candidate(&self, candidate: usize) -> Option<&PuzzlePiece> {
        self.pieces.iter().find(|p| p.candidate == Some(candidate))
    }

    /// 0..1 progress toward the next timed step (swap only)
    pub fn progress(&self) -> Option<f32> {
        match &self.variant {
            PuzzleVariant::Swap(swap) => Some(swap.progress()),
            _ => None,
        }
    }
}
