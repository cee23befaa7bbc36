//! Shots, success waves and the object pool they live in
//!
//! A killed projectile goes back to its pool instead of being dropped. Its
//! handle is logically dead once released even though the slot is reused.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::MeteorId;
use crate::consts::*;

/// Objects that can be recycled by a [`Pool`]
pub trait Poolable: Default {
    /// Clear per-use state before the slot is handed out again
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Index of a slot in a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolHandle(pub usize);

#[derive(Debug, Clone)]
struct Slot<T> {
    item: T,
    in_use: bool,
}

/// Free-list object pool
#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T: Poolable> Pool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a cleared object, reusing a released slot when possible
    pub fn acquire(&mut self) -> (PoolHandle, &mut T) {
        let idx = match self.free.pop() {
            Some(idx) => {
                let slot = &mut self.slots[idx];
                slot.item.reset();
                slot.in_use = true;
                idx
            }
            None => {
                self.slots.push(Slot {
                    item: T::default(),
                    in_use: true,
                });
                self.slots.len() - 1
            }
        };
        (PoolHandle(idx), &mut self.slots[idx].item)
    }

    /// Return an object to the pool; releasing twice is a no-op
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        match self.slots.get_mut(handle.0) {
            Some(slot) if slot.in_use => {
                slot.in_use = false;
                self.free.push(handle.0);
                true
            }
            _ => false,
        }
    }

    pub fn release_all(&mut self) {
        for idx in 0..self.slots.len() {
            self.release(PoolHandle(idx));
        }
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.0)
            .filter(|s| s.in_use)
            .map(|s| &s.item)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.0)
            .filter(|s| s.in_use)
            .map(|s| &mut s.item)
    }

    /// Handles of every object currently in use, in slot order
    pub fn active(&self) -> Vec<PoolHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.in_use)
            .map(|(i, _)| PoolHandle(i))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter(|s| s.in_use).map(|s| &s.item)
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.in_use).count()
    }

    /// Total allocated slots (in use or pooled)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// A fired answer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shot {
    pub value: f64,
    /// Candidate slot the shot was fired from
    pub candidate: Option<usize>,
    /// The source candidate was flagged as the answer
    pub from_correct: bool,
    pub target: Option<MeteorId>,
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Poolable for Shot {}

impl Shot {
    /// Home in on the target position, or fly straight without one
    pub fn advance(&mut self, dt: f32, target_pos: Option<Vec2>) {
        if let Some(target) = target_pos {
            let dir = (target - self.pos).normalize_or_zero();
            if dir != Vec2::ZERO {
                self.vel = dir * SHOT_SPEED;
            }
        }
        self.pos += self.vel * dt;
    }

    pub fn direction(&self) -> Vec2 {
        self.vel.normalize_or_zero()
    }

    pub fn out_of_bounds(&self) -> bool {
        self.pos.x < WORLD_MIN_X - 1.0
            || self.pos.x > WORLD_MAX_X + 1.0
            || self.pos.y > CEILING_Y
            || self.pos.y < SURFACE_Y - 1.0
    }
}

/// Expanding ring left behind by a successful hit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wave {
    pub origin: Vec2,
    pub radius: f32,
    /// Travel direction of the shot that spawned it
    pub direction: Vec2,
    /// Meteors already pushed by this wave
    pub hit: Vec<MeteorId>,
}

impl Poolable for Wave {
    fn reset(&mut self) {
        self.origin = Vec2::ZERO;
        self.radius = 0.0;
        self.direction = Vec2::ZERO;
        self.hit.clear();
    }
}

impl Wave {
    /// Grow the ring; returns false once it reached full size
    pub fn advance(&mut self, dt: f32) -> bool {
        self.radius = (self.radius + WAVE_SPEED * dt).min(WAVE_MAX_RADIUS);
        self.radius < WAVE_MAX_RADIUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_reuses_released_slots() {
        let mut pool: Pool<Shot> = Pool::new();
        let (a, shot) = pool.acquire();
        shot.value = 12.0;
        let (b, _) = pool.acquire();
        assert_eq!(pool.active_count(), 2);

        assert!(pool.release(a));
        assert!(!pool.release(a));
        assert!(pool.get(a).is_none());

        let (c, reused) = pool.acquire();
        assert_eq!(c, a);
        assert_eq!(reused.value, 0.0);
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool.active(), vec![a, b]);
    }

    #[test]
    fn test_release_all() {
        let mut pool: Pool<Wave> = Pool::new();
        for _ in 0..3 {
            let (_, wave) = pool.acquire();
            wave.hit.push(MeteorId(1));
        }
        pool.release_all();
        assert_eq!(pool.active_count(), 0);
        let (_, wave) = pool.acquire();
        assert!(wave.hit.is_empty());
    }

    #[test]
    fn test_shot_homes_on_target() {
        let mut shot = Shot {
            pos: Vec2::ZERO,
            vel: Vec2::new(0.0, SHOT_SPEED),
            ..Default::default()
        };
        shot.advance(0.1, Some(Vec2::new(10.0, 0.0)));
        assert!(shot.pos.x > 0.0);
        assert!(shot.pos.y.abs() < 1e-5);

        // Without a target it keeps its heading
        let before = shot.vel;
        shot.advance(0.1, None);
        assert_eq!(shot.vel, before);
    }

    #[test]
    fn test_wave_grows_to_max() {
        let mut wave = Wave::default();
        let mut ticks = 0;
        while wave.advance(SIM_DT) {
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(wave.radius, WAVE_MAX_RADIUS);
    }
}
