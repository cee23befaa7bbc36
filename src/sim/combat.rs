//! Combat resolution
//!
//! Shots against meteors, waves against meteors, and meteors against barriers
//! and the surface. Every outcome is a state change plus queued events.

use glam::Vec2;

use super::event::{Feedback, GameEvent, KillReason};
use super::projectile::{Pool, Shot, Wave};
use super::registry::MeteorRegistry;
use super::score::ScoreTracker;
use super::state::{Barrier, MeteorId, Surface};
use super::targeting::Targeting;
use super::collision;
use crate::consts::*;

/// Result of a shot reaching its meteor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOutcome {
    pub success: bool,
    pub points: u32,
    pub combo: u32,
    pub answer_duration: f32,
}

/// Mutable stage pieces a resolution touches
pub struct CombatContext<'a> {
    pub registry: &'a mut MeteorRegistry,
    pub targeting: &'a mut Targeting,
    pub score: &'a mut ScoreTracker,
    pub waves: &'a mut Pool<Wave>,
    pub events: &'a mut Vec<GameEvent>,
    pub difficulty: u8,
    /// Scaled simulation time
    pub now: f32,
}

impl CombatContext<'_> {
    /// Release the target if it is `id`, telling the UI to drop the answers
    fn release_if_target(&mut self, id: MeteorId) {
        if self.targeting.target() == Some(id) {
            self.targeting.remove_target();
            self.events.push(GameEvent::AnswersCleared);
        }
    }

    fn kill(&mut self, id: MeteorId, reason: KillReason) {
        self.release_if_target(id);
        if let Some(meteor) = self.registry.kill(id) {
            self.events.push(GameEvent::MeteorKilled {
                id,
                reason,
                pos: meteor.pos,
            });
        }
    }
}

/// Resolves hits according to the stage mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatResolver {
    /// Rush-mode mechanics: success waves, knockback, release on miss
    pub knockback: bool,
    /// Barrier and surface damage enabled
    pub damage: bool,
    /// Keep the target on a meteor knocked back by a wave
    pub retain_target_through_knockback: bool,
}

impl CombatResolver {
    pub fn new(knockback: bool, damage: bool) -> Self {
        Self {
            knockback,
            damage,
            retain_target_through_knockback: false,
        }
    }

    /// Resolve a shot touching a meteor.
    ///
    /// Returns `None` if the meteor is already gone.
    pub fn resolve_hit(
        &self,
        shot: &Shot,
        meteor_id: MeteorId,
        ctx: &mut CombatContext<'_>,
    ) -> Option<HitOutcome> {
        let answer_duration = if ctx.targeting.target() == Some(meteor_id) {
            ctx.targeting.answer_duration(ctx.now)
        } else {
            0.0
        };

        let meteor = ctx.registry.get_mut(meteor_id).filter(|m| m.alive)?;
        // The answer flag only vouches for the meteor the shot was aimed at
        let aimed = shot.target == Some(meteor_id);
        let success = meteor.question.is_correct(shot.value) || (aimed && shot.from_correct);
        meteor.answer_duration = answer_duration;
        meteor.last_hit_pos = Some(shot.pos);

        let outcome = if success {
            let points = ctx.score.record_success(ctx.difficulty);
            let combo = ctx.score.combo;
            ctx.events.push(GameEvent::Answer {
                feedback: Feedback::Correct,
                answer_duration,
            });
            ctx.events.push(GameEvent::PointsAwarded {
                points,
                total: ctx.score.points,
            });
            ctx.events.push(GameEvent::ComboChanged {
                combo,
                display: combo > 1,
            });
            ctx.kill(meteor_id, KillReason::Answered);

            if self.knockback {
                let (_, wave) = ctx.waves.acquire();
                wave.origin = shot.pos;
                wave.direction = shot.direction();
            }
            log::debug!(
                "Meteor {} answered in {:.2}s (+{} points, combo {})",
                meteor_id.0,
                answer_duration,
                points,
                combo
            );
            HitOutcome {
                success,
                points,
                combo,
                answer_duration,
            }
        } else {
            ctx.score.record_failure();
            ctx.events.push(GameEvent::Answer {
                feedback: Feedback::Incorrect,
                answer_duration,
            });
            ctx.events.push(GameEvent::ComboChanged {
                combo: 0,
                display: false,
            });
            if self.knockback {
                // The meteor resumes descending on its own
                meteor.held = false;
                meteor.apply_impulse(shot.direction() * HIT_FORCE);
                ctx.events.push(GameEvent::Knockback { id: meteor_id });
                ctx.release_if_target(meteor_id);
            }
            log::debug!("Meteor {} missed with {}", meteor_id.0, shot.value);
            HitOutcome {
                success,
                points: 0,
                combo: 0,
                answer_duration,
            }
        };
        Some(outcome)
    }

    /// Push meteors touched by expanding waves; finished waves return to the pool
    pub fn advance_waves(&self, dt: f32, ctx: &mut CombatContext<'_>) {
        for handle in ctx.waves.active() {
            let Some(wave) = ctx.waves.get_mut(handle) else {
                continue;
            };
            let growing = wave.advance(dt);

            for meteor in ctx.registry.iter_mut() {
                if wave.hit.contains(&meteor.id)
                    || !collision::wave_overlaps(wave.origin, wave.radius, meteor)
                {
                    continue;
                }
                wave.hit.push(meteor.id);
                let was_knocked_back = meteor.knockback;
                meteor.apply_impulse(wave.direction * HIT_FORCE);
                if !was_knocked_back && ctx.targeting.target() == Some(meteor.id) {
                    meteor.retain_target = self.retain_target_through_knockback;
                }
                ctx.events.push(GameEvent::Knockback { id: meteor.id });
            }

            if !growing {
                ctx.waves.release(handle);
            }
        }
    }

    /// Drop the target once its knockback is spent and another meteor is closer
    pub fn update_knockback_target(&self, reference: Vec2, ctx: &mut CombatContext<'_>) {
        let Some(id) = ctx.targeting.target() else {
            return;
        };
        let Some(meteor) = ctx.registry.get(id) else {
            return;
        };
        if !meteor.knockback || meteor.retain_target || meteor.vel.y > 0.0 {
            return;
        }
        if ctx.registry.closest_to(reference, true) != Some(id) {
            ctx.release_if_target(id);
        }
    }

    /// Meteor crashed into a barrier: fixed damage, meteor consumed
    pub fn meteor_hits_barrier(
        &self,
        meteor_id: MeteorId,
        barrier: &mut Barrier,
        ctx: &mut CombatContext<'_>,
    ) {
        if self.damage {
            barrier.health.damage(IMPACT_DAMAGE);
            ctx.events.push(GameEvent::BarrierDamaged {
                index: barrier.index,
                health: barrier.health.current,
            });
        }
        ctx.kill(meteor_id, KillReason::BarrierImpact);
    }

    /// Meteor reached the surface; returns true if the surface died
    pub fn meteor_hits_surface(
        &self,
        meteor_id: MeteorId,
        surface: &mut Surface,
        ctx: &mut CombatContext<'_>,
    ) -> bool {
        if self.damage {
            surface.health.damage(IMPACT_DAMAGE);
            ctx.events.push(GameEvent::SurfaceDamaged {
                health: surface.health.current,
            });
        }
        ctx.kill(meteor_id, KillReason::SurfaceImpact);
        surface.health.is_dead()
    }

    /// Remove a meteor that left the playfield
    pub fn meteor_out_of_bounds(&self, meteor_id: MeteorId, ctx: &mut CombatContext<'_>) {
        ctx.kill(meteor_id, KillReason::OutOfBounds);
    }
}
