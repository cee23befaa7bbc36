//! Fixed timestep simulation tick
//!
//! Advances a [`Stage`] by one step. Order within a tick:
//! pause, clocks and unscaled timers, spawning, targeting, player commands,
//! meteor motion and impacts, shots, waves and knockback, phase progress,
//! stage outcome, then puzzle animation.

use super::collision::{self, Impact};
use super::difficulty::restore_barrier;
use super::event::GameEvent;
use super::stage::{Stage, cannon};
use super::state::StagePhase;
use super::targeting::TargetingEvent;
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Fire the value in this candidate slot
    pub fire_candidate: Option<usize>,
    /// Select a puzzle piece, firing its bound candidate
    pub select_piece: Option<u32>,
    /// Requested game speed scale
    pub game_speed: Option<f32>,
    /// Puzzle cover animation started (true) or finished (false)
    pub cover_active: Option<bool>,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the stage by one fixed timestep of real (unscaled) time
pub fn tick(stage: &mut Stage, input: &TickInput, dt: f32) {
    if input.pause {
        stage.toggle_pause();
    }
    if stage.phase != StagePhase::Playing {
        return;
    }
    if let Some(scale) = input.game_speed {
        stage.set_game_speed(scale);
    }
    if let Some(active) = input.cover_active {
        stage.set_cover(active);
    }

    let scaled_dt = stage.clock.advance(dt);

    update_timers(stage, dt);
    update_spawning(stage, scaled_dt);
    stage.auto_target();
    update_targeting(stage, scaled_dt);
    handle_commands(stage, input);

    update_meteors(stage, scaled_dt);
    update_impacts(stage);
    update_shots(stage, scaled_dt);
    update_waves(stage, scaled_dt);

    // Answers stay bound only while a target is locked
    if !stage.targeting.is_locked() && stage.puzzle.has_bindings() {
        stage.puzzle.clear_bindings();
    }

    update_phase(stage);

    if stage.surface.health.is_dead() {
        stage.finish(false);
        return;
    }
    if stage.score.points >= stage.difficulty.points_goal() {
        stage.finish(true);
        return;
    }

    stage.puzzle.advance(dt);
}

/// Stun and combo run on unscaled time
fn update_timers(stage: &mut Stage, dt: f32) {
    stage.stun_timer = (stage.stun_timer - dt).max(0.0);

    let has_target = stage.targeting.target().is_some();
    let in_flight = stage.shot_in_flight();
    if stage.score.decay(dt, has_target, in_flight) {
        log::debug!("Combo expired");
        stage.push_event(GameEvent::ComboChanged {
            combo: 0,
            display: false,
        });
    }
}

fn update_spawning(stage: &mut Stage, scaled_dt: f32) {
    stage.spawn_timer -= scaled_dt;
    if stage.spawn_timer <= 0.0 {
        stage.spawn_meteor();
        stage.spawn_timer = stage.difficulty.spawn_interval();
    }
}

fn update_targeting(stage: &mut Stage, scaled_dt: f32) {
    match stage.targeting.advance(scaled_dt, &stage.registry) {
        Some(TargetingEvent::Locked(id)) => {
            stage.puzzle.bind(CANDIDATE_COUNT);
            stage.push_event(GameEvent::TargetLocked(id));
        }
        Some(TargetingEvent::Lost(_)) => {
            stage.puzzle.clear_bindings();
            stage.push_event(GameEvent::AnswersCleared);
        }
        None => {}
    }
}

fn handle_commands(stage: &mut Stage, input: &TickInput) {
    if let Some(index) = input.fire_candidate {
        if let Err(err) = stage.fire_at_candidate(index) {
            log::warn!("Fire rejected: {}", err);
        }
    }
    if let Some(piece) = input.select_piece {
        if let Err(err) = stage.select_puzzle_piece(piece) {
            log::warn!("Piece selection rejected: {}", err);
        }
    }
}

fn update_meteors(stage: &mut Stage, scaled_dt: f32) {
    let target = stage.targeting.target();
    for meteor in stage.registry.iter_mut() {
        // Released meteors fall again
        if meteor.held && target != Some(meteor.id) {
            meteor.held = false;
        }
        meteor.advance(scaled_dt);
    }
}

fn update_impacts(stage: &mut Stage) {
    let mut impacts = Vec::new();
    let mut escaped = Vec::new();
    for meteor in stage.registry.iter() {
        if let Some(impact) = collision::meteor_impact(meteor, &stage.barriers) {
            impacts.push((meteor.id, impact));
        } else if meteor.out_of_bounds() {
            escaped.push(meteor.id);
        }
    }
    if impacts.is_empty() && escaped.is_empty() {
        return;
    }

    let resolver = stage.resolver;
    let (mut ctx, barriers, surface) = stage.combat_parts();
    for (id, impact) in impacts {
        match impact {
            Impact::Barrier(index) => {
                if let Some(barrier) = barriers.iter_mut().find(|b| b.index == index) {
                    resolver.meteor_hits_barrier(id, barrier, &mut ctx);
                }
            }
            Impact::Surface => {
                resolver.meteor_hits_surface(id, surface, &mut ctx);
            }
        }
    }
    for id in escaped {
        resolver.meteor_out_of_bounds(id, &mut ctx);
    }
}

fn update_shots(stage: &mut Stage, scaled_dt: f32) {
    let resolver = stage.resolver;
    for handle in stage.shots.active() {
        let Some(shot) = stage.shots.get_mut(handle) else {
            continue;
        };
        let target = shot
            .target
            .and_then(|id| stage.registry.get(id))
            .filter(|m| m.alive);
        shot.advance(scaled_dt, target.map(|m| m.pos));

        // A homing shot only resolves against its own target
        let hit = match target {
            Some(meteor) => collision::shot_hits_meteor(shot.pos, meteor).then_some(meteor.id),
            None => stage
                .registry
                .iter()
                .find(|m| collision::shot_hits_meteor(shot.pos, m))
                .map(|m| m.id),
        };
        let shot = shot.clone();

        match hit {
            Some(id) => {
                stage.shots.release(handle);
                let (mut ctx, _, _) = stage.combat_parts();
                let outcome = resolver.resolve_hit(&shot, id, &mut ctx);
                if outcome.is_some_and(|o| !o.success) {
                    stage.stun_timer = STUN_TIME;
                }
            }
            None if shot.out_of_bounds() => {
                stage.shots.release(handle);
            }
            None => {}
        }
    }
}

fn update_waves(stage: &mut Stage, scaled_dt: f32) {
    let resolver = stage.resolver;
    let (mut ctx, _, _) = stage.combat_parts();
    resolver.advance_waves(scaled_dt, &mut ctx);
    resolver.update_knockback_target(cannon(), &mut ctx);
}

/// Phase progress; a phase change may restore a barrier
fn update_phase(stage: &mut Stage) {
    let Some(previous) = stage.difficulty.update_phase(stage.score.points) else {
        return;
    };
    let phase = stage.difficulty.phase;
    stage.push_event(GameEvent::PhaseChanged {
        from: previous,
        to: phase,
    });

    let chance = stage.config.barrier_restore_chance;
    if let Some(index) = restore_barrier(&mut stage.barriers, chance, &mut stage.rng) {
        log::debug!("Barrier {} restored on phase {}", index, phase);
        stage.push_event(GameEvent::BarrierRestored { index });
    }
}
