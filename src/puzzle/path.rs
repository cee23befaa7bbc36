//! Path puzzle: pieces travel a closed Catmull-Rom loop
//!
//! Each piece keeps a cursor (segment index plus parameter `t`). Pieces start
//! evenly spread along the loop by a fixed `t` offset and all move at the same
//! rate; crossing the end of a segment moves the cursor to the next one with
//! `t` back at 0.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::PuzzlePiece;

/// Segment parameter covered per second
pub const PATH_SPEED: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PathCursor {
    pub segment: usize,
    pub t: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathPuzzle {
    /// Control points of the closed loop
    pub points: Vec<Vec2>,
    /// Segment parameter advanced per second
    pub speed: f32,
    /// Start offset between neighbouring pieces, in segments
    pub spacing: f32,
    pub cursors: Vec<PathCursor>,
}

impl Default for PathPuzzle {
    fn default() -> Self {
        Self::new()
    }
}

impl PathPuzzle {
    /// Rounded racetrack loop
    pub fn new() -> Self {
        let points = vec![
            Vec2::new(-3.0, 1.0),
            Vec2::new(-1.0, 1.5),
            Vec2::new(1.0, 1.5),
            Vec2::new(3.0, 1.0),
            Vec2::new(3.0, -1.0),
            Vec2::new(1.0, -1.5),
            Vec2::new(-1.0, -1.5),
            Vec2::new(-3.0, -1.0),
        ];
        Self::with_points(points)
    }

    pub fn with_points(points: Vec<Vec2>) -> Self {
        Self {
            points,
            speed: PATH_SPEED,
            spacing: 0.0,
            cursors: Vec::new(),
        }
    }

    pub fn segment_count(&self) -> usize {
        self.points.len()
    }

    pub fn initialize(&mut self, pieces: &mut [PuzzlePiece]) {
        let segments = self.segment_count();
        if segments == 0 || pieces.is_empty() {
            self.cursors.clear();
            return;
        }
        self.spacing = segments as f32 / pieces.len() as f32;
        self.cursors = (0..pieces.len())
            .map(|i| {
                let along = i as f32 * self.spacing;
                PathCursor {
                    segment: along.floor() as usize % segments,
                    t: along.fract(),
                }
            })
            .collect();
        self.place(pieces);
    }

    pub fn advance(&mut self, dt: f32, pieces: &mut [PuzzlePiece]) {
        let segments = self.segment_count();
        if segments == 0 {
            return;
        }
        for cursor in &mut self.cursors {
            cursor.t += self.speed * dt;
            if cursor.t >= 1.0 {
                cursor.segment = (cursor.segment + 1) % segments;
                cursor.t = 0.0;
            }
        }
        self.place(pieces);
    }

    fn place(&self, pieces: &mut [PuzzlePiece]) {
        for (piece, cursor) in pieces.iter_mut().zip(&self.cursors) {
            piece.pos = self.point_at(*cursor);
        }
    }

    /// Position on the loop for a cursor
    pub fn point_at(&self, cursor: PathCursor) -> Vec2 {
        let n = self.points.len();
        if n == 0 {
            return Vec2::ZERO;
        }
        let i = cursor.segment % n;
        let p0 = self.points[(i + n - 1) % n];
        let p1 = self.points[i];
        let p2 = self.points[(i + 1) % n];
        let p3 = self.points[(i + 2) % n];
        catmull_rom(p0, p1, p2, p3, cursor.t.clamp(0.0, 1.0))
    }
}

/// Uniform Catmull-Rom interpolation between `p1` and `p2`
pub fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(n: u32) -> Vec<PuzzlePiece> {
        (0..n)
            .map(|id| PuzzlePiece {
                id,
                candidate: None,
                pos: Vec2::ZERO,
            })
            .collect()
    }

    #[test]
    fn test_catmull_rom_passes_through_control_points() {
        let (p0, p1, p2, p3) = (
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(3.0, 1.0),
        );
        assert!(catmull_rom(p0, p1, p2, p3, 0.0).distance(p1) < 1e-5);
        assert!(catmull_rom(p0, p1, p2, p3, 1.0).distance(p2) < 1e-5);
    }

    #[test]
    fn test_pieces_spread_evenly() {
        let mut path = PathPuzzle::new();
        let mut p = pieces(4);
        path.initialize(&mut p);
        assert_eq!(path.spacing, 2.0);
        let segments: Vec<usize> = path.cursors.iter().map(|c| c.segment).collect();
        assert_eq!(segments, vec![0, 2, 4, 6]);
        assert_eq!(p[1].pos, path.points[2]);
    }

    #[test]
    fn test_cursor_moves_to_next_segment() {
        let mut path = PathPuzzle::new();
        let mut p = pieces(8);
        path.initialize(&mut p);
        path.advance(0.5 / PATH_SPEED, &mut p);
        assert_eq!(path.cursors[0].segment, 0);
        assert!((path.cursors[0].t - 0.5).abs() < 1e-5);

        path.advance(0.6 / PATH_SPEED, &mut p);
        assert_eq!(path.cursors[0].segment, 1);
        assert_eq!(path.cursors[0].t, 0.0);
        assert_eq!(p[0].pos, path.points[1]);
    }

    #[test]
    fn test_last_segment_wraps() {
        let mut path = PathPuzzle::new();
        let mut p = pieces(8);
        path.initialize(&mut p);
        assert_eq!(path.cursors[7].segment, 7);
        path.advance(1.1 / PATH_SPEED, &mut p);
        assert_eq!(path.cursors[7].segment, 0);
    }
}
