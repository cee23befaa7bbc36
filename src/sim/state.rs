//! Simulation entity types
//!
//! Meteors, barriers, the surface and the two simulation clocks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::question::Question;
use crate::units::Conversion;

/// Stable meteor handle (ids are never reused within a stage)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeteorId(pub u32);

/// A falling meteor carrying a conversion question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meteor {
    pub id: MeteorId,
    pub question: Question,
    pub pos: Vec2,
    pub vel: Vec2,
    pub spawn_pos: Vec2,
    /// Grid slot when spawned by the evenly-spaced layout
    pub spawn_slot: Option<usize>,
    /// Terminal fall speed (units/s)
    pub fall_speed: f32,
    pub alive: bool,
    /// Moving under a knockback impulse rather than falling
    pub knockback: bool,
    /// Keep the player's target on this meteor while knockback decays
    pub retain_target: bool,
    /// Frozen in place while targeted (rush mode approach)
    pub held: bool,
    pub last_hit_pos: Option<Vec2>,
    /// Seconds between acquiring this meteor as target and the last answer
    pub answer_duration: f32,
}

impl Meteor {
    pub fn new(id: MeteorId, question: Question, spawn_pos: Vec2, fall_speed: f32) -> Self {
        Self {
            id,
            question,
            pos: spawn_pos,
            vel: Vec2::new(0.0, -fall_speed),
            spawn_pos,
            spawn_slot: None,
            fall_speed,
            alive: true,
            knockback: false,
            retain_target: false,
            held: false,
            last_hit_pos: None,
            answer_duration: 0.0,
        }
    }

    pub fn conversion(&self) -> &Conversion {
        &self.question.conversion
    }

    /// The true converted value
    pub fn answer(&self) -> f64 {
        self.question.answer()
    }

    /// Advance motion by one scaled timestep
    pub fn advance(&mut self, dt: f32) {
        if !self.alive || self.held {
            return;
        }
        if self.knockback {
            self.vel.y -= KNOCKBACK_GRAVITY * dt;
            self.pos += self.vel * dt;
            // Knockback ends once the meteor starts falling at its normal pace
            if self.vel.y <= -self.fall_speed {
                self.knockback = false;
                self.retain_target = false;
                self.vel = Vec2::new(0.0, -self.fall_speed);
            }
        } else {
            self.vel = Vec2::new(0.0, -self.fall_speed);
            self.pos += self.vel * dt;
        }
    }

    /// Add an impulse and enter knockback
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        if self.held {
            self.held = false;
        }
        if !self.knockback {
            self.vel = Vec2::ZERO;
        }
        self.vel += impulse;
        self.knockback = true;
    }

    /// Whether the meteor left the playfield sideways or upward
    pub fn out_of_bounds(&self) -> bool {
        self.pos.x < WORLD_MIN_X - METEOR_RADIUS
            || self.pos.x > WORLD_MAX_X + METEOR_RADIUS
            || self.pos.y > CEILING_Y
    }
}

/// Condition buckets derived from health fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Intact,
    Damaged,
    Critical,
    Dead,
}

/// Health in `[0, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn is_damaged(&self) -> bool {
        self.current < self.max
    }

    pub fn damage(&mut self, amount: f32) {
        self.current = (self.current - amount).clamp(0.0, self.max);
    }

    pub fn restore(&mut self) {
        self.current = self.max;
    }

    /// Condition used by the presentation layer to pick a color
    pub fn condition(&self) -> Condition {
        let f = self.fraction();
        if f <= 0.0 {
            Condition::Dead
        } else if f < 0.34 {
            Condition::Critical
        } else if f < 1.0 {
            Condition::Damaged
        } else {
            Condition::Intact
        }
    }
}

/// A barrier segment protecting part of the surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barrier {
    pub index: usize,
    pub min_x: f32,
    pub max_x: f32,
    pub health: Health,
}

impl Barrier {
    pub fn new(index: usize, min_x: f32, max_x: f32, max_health: f32) -> Self {
        Self {
            index,
            min_x,
            max_x,
            health: Health::full(max_health),
        }
    }

    pub fn covers(&self, x: f32) -> bool {
        x >= self.min_x && x <= self.max_x
    }

    /// Evenly split the playfield width into `count` barriers
    pub fn row(count: usize, max_health: f32) -> Vec<Barrier> {
        let width = (WORLD_MAX_X - WORLD_MIN_X) / count.max(1) as f32;
        (0..count)
            .map(|i| {
                let min_x = WORLD_MIN_X + i as f32 * width;
                Barrier::new(i, min_x, min_x + width, max_health)
            })
            .collect()
    }
}

/// The ground; its death ends the stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surface {
    pub health: Health,
}

impl Surface {
    pub fn new(max_health: f32) -> Self {
        Self {
            health: Health::full(max_health),
        }
    }
}

/// Player-selectable game speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl GameSpeed {
    pub fn scale(&self) -> f32 {
        match self {
            GameSpeed::Slow => 0.5,
            GameSpeed::Normal => 1.0,
            GameSpeed::Fast => 2.0,
        }
    }

    /// Nearest speed for an arbitrary scale
    pub fn from_scale(scale: f32) -> Self {
        if scale < 0.75 {
            GameSpeed::Slow
        } else if scale < 1.5 {
            GameSpeed::Normal
        } else {
            GameSpeed::Fast
        }
    }
}

/// Scaled (motion, spawning) and unscaled (UI, combo, stun) time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimClock {
    pub speed: GameSpeed,
    pub scaled: f32,
    pub unscaled: f32,
    /// Unscaled seconds spent at slow speed
    pub slow_time: f32,
    /// Unscaled seconds spent at fast speed
    pub fast_time: f32,
}

impl SimClock {
    pub fn new(speed: GameSpeed) -> Self {
        Self {
            speed,
            ..Default::default()
        }
    }

    /// Advance by a real timestep, returning the scaled timestep
    pub fn advance(&mut self, dt: f32) -> f32 {
        let scaled_dt = dt * self.speed.scale();
        self.unscaled += dt;
        self.scaled += scaled_dt;
        match self.speed {
            GameSpeed::Slow => self.slow_time += dt,
            GameSpeed::Fast => self.fast_time += dt,
            GameSpeed::Normal => {}
        }
        scaled_dt
    }
}

/// Stage lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagePhase {
    Playing,
    Paused,
    Won,
    Lost,
}

impl StagePhase {
    pub fn is_over(&self) -> bool {
        matches!(self, StagePhase::Won | StagePhase::Lost)
    }
}
