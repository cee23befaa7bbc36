//! Notifications for the presentation layer
//!
//! The stage queues these each tick; rendering, audio and text-to-speech drain
//! them and never feed back into the simulation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::MeteorId;

/// Why a meteor left play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillReason {
    /// Destroyed by a correct answer
    Answered,
    /// Crashed into a barrier
    BarrierImpact,
    /// Reached the surface
    SurfaceImpact,
    /// Knocked out of the playfield
    OutOfBounds,
    /// Swept away at stage end or reset
    Cleared,
}

impl KillReason {
    pub fn is_success(&self) -> bool {
        matches!(self, KillReason::Answered)
    }
}

/// Answer feedback with a symbolic localization key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feedback {
    Correct,
    Incorrect,
}

impl Feedback {
    pub fn key(&self) -> &'static str {
        match self {
            Feedback::Correct => "answer.correct",
            Feedback::Incorrect => "answer.incorrect",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    MeteorSpawned { id: MeteorId, pos: Vec2 },
    MeteorKilled { id: MeteorId, reason: KillReason, pos: Vec2 },
    TargetAcquired(MeteorId),
    /// Question became answerable
    TargetLocked(MeteorId),
    /// Hide any displayed answer options
    AnswersCleared,
    ShotFired { candidate: Option<usize>, value: f64 },
    Answer { feedback: Feedback, answer_duration: f32 },
    /// Combo changed; `display` is set when a combo above 1 should be shown
    ComboChanged { combo: u32, display: bool },
    PointsAwarded { points: u32, total: u32 },
    PhaseChanged { from: u8, to: u8 },
    BarrierDamaged { index: usize, health: f32 },
    BarrierRestored { index: usize },
    SurfaceDamaged { health: f32 },
    Knockback { id: MeteorId },
    StageWon,
    StageLost,
}
