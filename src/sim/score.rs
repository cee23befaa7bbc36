//! Points, combo and the final score formula

use serde::{Deserialize, Serialize};

use crate::consts::COMBO_TIME;

/// Base points for any correct answer
pub const BASE_POINTS: u32 = 15;
pub const POINTS_PER_COMBO: u32 = 10;
pub const POINTS_PER_DIFFICULTY: u32 = 5;

/// Full speed bonus, reached by spending no time at that speed
pub const SPEED_BONUS_MAX: f32 = 150.0;
/// Seconds at a speed after which its bonus is gone
pub const SPEED_BONUS_WINDOW: f32 = 60.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreTracker {
    pub points: u32,
    pub combo: u32,
    pub highest_combo: u32,
    /// Unscaled seconds left before the combo drops
    pub combo_timer: f32,
    /// Correct answers in a row, independent of the combo timer
    pub consecutive_successes: u32,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points a correct answer is worth right now
    pub fn points_for_success(&self, difficulty: u8) -> u32 {
        BASE_POINTS + POINTS_PER_COMBO * self.combo + POINTS_PER_DIFFICULTY * difficulty as u32
    }

    /// Record a correct answer, returning the points awarded
    pub fn record_success(&mut self, difficulty: u8) -> u32 {
        let awarded = self.points_for_success(difficulty);
        self.points += awarded;
        self.combo += 1;
        self.highest_combo = self.highest_combo.max(self.combo);
        self.consecutive_successes += 1;
        self.combo_timer = COMBO_TIME;
        awarded
    }

    /// Record a wrong answer: streak, combo and timer all reset
    pub fn record_failure(&mut self) {
        self.consecutive_successes = 0;
        self.combo = 0;
        self.combo_timer = 0.0;
    }

    /// Decay the combo timer by an unscaled timestep.
    ///
    /// Only runs while the player has a target and nothing is in flight.
    /// Returns true when the combo expired this call.
    pub fn decay(&mut self, dt: f32, has_target: bool, shot_in_flight: bool) -> bool {
        if !has_target || shot_in_flight || self.combo == 0 {
            return false;
        }
        self.combo_timer = (self.combo_timer - dt).max(0.0);
        if self.combo_timer <= 0.0 {
            self.combo = 0;
            return true;
        }
        false
    }

    /// End-of-stage score
    pub fn final_score(&self, difficulty: u8, slow_time: f32, fast_time: f32) -> u64 {
        let score = self.points as i64
            + 50 * difficulty as i64
            + 100 * self.highest_combo as i64
            + speed_bonus(slow_time) as i64
            + speed_bonus(fast_time) as i64;
        score.max(0) as u64
    }
}

/// Bonus that shrinks linearly to 0 over [`SPEED_BONUS_WINDOW`] seconds
pub fn speed_bonus(seconds: f32) -> u32 {
    let used = seconds.clamp(0.0, SPEED_BONUS_WINDOW) / SPEED_BONUS_WINDOW;
    (SPEED_BONUS_MAX * (1.0 - used)).ceil() as u32
}
