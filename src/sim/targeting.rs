//! Single-target acquisition
//!
//! `Idle -> Approaching -> Locked -> Idle`. The reticle homes in on the target
//! at a fixed speed; the question becomes answerable only once the reticle sits
//! exactly on the meteor.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::registry::MeteorRegistry;
use super::state::MeteorId;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetPhase {
    Idle,
    Approaching(MeteorId),
    Locked(MeteorId),
}

/// Notifications produced while advancing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetingEvent {
    /// Reticle converged; answers may now be shown
    Locked(MeteorId),
    /// Target disappeared from the registry
    Lost(MeteorId),
}

/// Tracks the one meteor the player is answering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Targeting {
    pub phase: TargetPhase,
    pub reticle: Vec2,
    /// Scaled simulation time the current target was acquired
    pub acquired_at: f32,
    pub locked_exactly: bool,
    /// Where the reticle rests while idle
    pub home: Vec2,
}

impl Targeting {
    pub fn new(home: Vec2) -> Self {
        Self {
            phase: TargetPhase::Idle,
            reticle: home,
            acquired_at: 0.0,
            locked_exactly: false,
            home,
        }
    }

    pub fn target(&self) -> Option<MeteorId> {
        match self.phase {
            TargetPhase::Idle => None,
            TargetPhase::Approaching(id) | TargetPhase::Locked(id) => Some(id),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == TargetPhase::Idle
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.phase, TargetPhase::Locked(_))
    }

    /// Start approaching a meteor.
    ///
    /// Precondition: no current target. Callers release the old target with
    /// [`Targeting::remove_target`] first; re-targeting is not an implicit
    /// release.
    pub fn set_target(&mut self, id: MeteorId, now: f32) {
        debug_assert!(
            self.is_idle(),
            "set_target({id:?}) while {:?} is still targeted",
            self.phase
        );
        self.phase = TargetPhase::Approaching(id);
        self.acquired_at = now;
        self.locked_exactly = false;
        log::debug!("Targeting meteor {}", id.0);
    }

    /// Force Idle, returning the released target
    pub fn remove_target(&mut self) -> Option<MeteorId> {
        let released = self.target();
        self.phase = TargetPhase::Idle;
        self.locked_exactly = false;
        if let Some(id) = released {
            log::debug!("Released meteor {}", id.0);
        }
        released
    }

    /// Seconds since acquisition, never negative
    pub fn answer_duration(&self, now: f32) -> f32 {
        (now - self.acquired_at).max(0.0)
    }

    /// Move the reticle one scaled timestep
    pub fn advance(&mut self, dt: f32, registry: &MeteorRegistry) -> Option<TargetingEvent> {
        let id = match self.target() {
            Some(id) => id,
            None => {
                self.reticle = move_towards(self.reticle, self.home, RETICLE_SPEED * dt);
                return None;
            }
        };

        let target_pos = match registry.get(id).filter(|m| m.alive) {
            Some(meteor) => meteor.pos,
            None => {
                self.remove_target();
                return Some(TargetingEvent::Lost(id));
            }
        };

        match self.phase {
            TargetPhase::Approaching(_) => {
                self.reticle = move_towards(self.reticle, target_pos, RETICLE_SPEED * dt);
                if self.reticle == target_pos {
                    self.phase = TargetPhase::Locked(id);
                    self.locked_exactly = true;
                    log::debug!("Locked meteor {}", id.0);
                    return Some(TargetingEvent::Locked(id));
                }
                None
            }
            TargetPhase::Locked(_) => {
                self.reticle = target_pos;
                None
            }
            TargetPhase::Idle => None,
        }
    }
}

/// Step from `current` toward `target` by at most `max_step`, snapping exactly
pub fn move_towards(current: Vec2, target: Vec2, max_step: f32) -> Vec2 {
    let delta = target - current;
    let dist = delta.length();
    if dist <= max_step || dist == 0.0 {
        target
    } else {
        current + delta / dist * max_step
    }
}
