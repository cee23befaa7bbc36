//! Overlap tests
//!
//! Meteors, shots and waves are circles; barriers and the surface are
//! horizontal lines. Only overlap is tested, responses live in `combat`.

use glam::Vec2;

use super::state::{Barrier, Meteor};
use crate::consts::*;

/// What a falling meteor touched this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    /// Index into the barrier row
    Barrier(usize),
    Surface,
}

/// Whether two circles overlap
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance_squared(b) <= (ra + rb) * (ra + rb)
}

/// Shot-vs-meteor contact
pub fn shot_hits_meteor(shot_pos: Vec2, meteor: &Meteor) -> bool {
    meteor.alive && circles_overlap(shot_pos, SHOT_RADIUS, meteor.pos, METEOR_RADIUS)
}

/// Whether a wave ring currently covers a meteor
pub fn wave_overlaps(origin: Vec2, radius: f32, meteor: &Meteor) -> bool {
    meteor.alive && circles_overlap(origin, radius, meteor.pos, METEOR_RADIUS)
}

/// Check a descending meteor against the barrier row, then the surface.
///
/// Dead barriers let meteors through; only meteors moving downward collide so
/// a knocked-back meteor rising through the barrier line is ignored.
pub fn meteor_impact(meteor: &Meteor, barriers: &[Barrier]) -> Option<Impact> {
    if !meteor.alive || meteor.vel.y > 0.0 {
        return None;
    }
    let bottom = meteor.pos.y - METEOR_RADIUS;

    if bottom <= BARRIER_Y && meteor.pos.y >= BARRIER_Y - METEOR_RADIUS {
        if let Some(barrier) = barriers
            .iter()
            .find(|b| !b.health.is_dead() && b.covers(meteor.pos.x))
        {
            return Some(Impact::Barrier(barrier.index));
        }
    }

    if bottom <= SURFACE_Y {
        return Some(Impact::Surface);
    }
    None
}
