//! Slide puzzle: a static grid of pieces

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::PuzzlePiece;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlidePuzzle {
    pub columns: usize,
    pub cell: Vec2,
}

impl Default for SlidePuzzle {
    fn default() -> Self {
        Self {
            columns: 4,
            cell: Vec2::new(1.5, 1.0),
        }
    }
}

impl SlidePuzzle {
    /// Row-major grid, centred on the origin
    pub fn initialize(&mut self, pieces: &mut [PuzzlePiece]) {
        let columns = self.columns.max(1);
        let rows = pieces.len().div_ceil(columns);
        let origin = Vec2::new(
            (columns as f32 - 1.0) * self.cell.x / 2.0,
            (rows as f32 - 1.0) * self.cell.y / 2.0,
        );
        for (i, piece) in pieces.iter_mut().enumerate() {
            let (col, row) = (i % columns, i / columns);
            piece.pos = Vec2::new(
                col as f32 * self.cell.x - origin.x,
                origin.y - row as f32 * self.cell.y,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_layout() {
        let mut slide = SlidePuzzle::default();
        let mut pieces: Vec<PuzzlePiece> = (0..7)
            .map(|id| PuzzlePiece {
                id,
                candidate: None,
                pos: Vec2::ZERO,
            })
            .collect();
        slide.initialize(&mut pieces);
        // Two rows: 4 on top, 3 below
        assert_eq!(pieces[0].pos, Vec2::new(-2.25, 0.5));
        assert_eq!(pieces[3].pos, Vec2::new(2.25, 0.5));
        assert_eq!(pieces[4].pos, Vec2::new(-2.25, -0.5));
    }
}
