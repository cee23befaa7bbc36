//! Swap puzzle: pieces rotate one slot forward on a fixed interval

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::PuzzlePiece;

/// Seconds between rotations
pub const SWAP_INTERVAL: f32 = 4.5;
/// Radius of the slot ring
const SLOT_RADIUS: f32 = 3.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapPuzzle {
    /// Fixed slot positions, evenly spaced on a ring
    pub slots: Vec<Vec2>,
    /// Slot each piece currently sits in (indexed like the piece list)
    pub assignment: Vec<usize>,
    pub timer: f32,
    pub interval: f32,
    /// Completed rotations
    pub rotations: u32,
}

impl SwapPuzzle {
    pub fn new(slot_count: usize) -> Self {
        let slots = (0..slot_count)
            .map(|i| {
                let theta = std::f32::consts::TAU * i as f32 / slot_count.max(1) as f32;
                Vec2::new(theta.cos(), theta.sin()) * SLOT_RADIUS
            })
            .collect();
        Self {
            slots,
            assignment: Vec::new(),
            timer: 0.0,
            interval: SWAP_INTERVAL,
            rotations: 0,
        }
    }

    pub fn initialize(&mut self, pieces: &mut [PuzzlePiece]) {
        self.timer = 0.0;
        self.rotations = 0;
        self.assignment = (0..pieces.len()).map(|i| i % self.slots.len().max(1)).collect();
        self.place(pieces);
    }

    fn place(&self, pieces: &mut [PuzzlePiece]) {
        for (piece, &slot) in pieces.iter_mut().zip(&self.assignment) {
            if let Some(&pos) = self.slots.get(slot) {
                piece.pos = pos;
            }
        }
    }

    /// Every piece moves to the next slot, the last wrapping to the first
    pub fn rotate(&mut self, pieces: &mut [PuzzlePiece]) {
        let n = self.slots.len().max(1);
        for slot in &mut self.assignment {
            *slot = (*slot + 1) % n;
        }
        self.rotations += 1;
        self.place(pieces);
    }

    pub fn advance(&mut self, dt: f32, pieces: &mut [PuzzlePiece]) {
        self.timer += dt;
        while self.timer >= self.interval {
            self.timer -= self.interval;
            self.rotate(pieces);
        }
    }

    /// Fraction of the interval elapsed
    pub fn progress(&self) -> f32 {
        (self.timer / self.interval).clamp(0.0, 1.0)
    }

    /// Seconds until the next rotation
    pub fn countdown(&self) -> f32 {
        (self.interval - self.timer).max(0.0)
    }
}
