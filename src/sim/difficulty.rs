//! Difficulty levels, progress phases and loss recovery
//!
//! Difficulty (1-9) picks a base curve; the phase (1-4, driven by progress
//! toward the points goal) scales it further within a stage.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::Barrier;

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 9;
pub const MAX_PHASE: u8 = 4;

/// Losses needed to drop one difficulty level
pub const LOSSES_PER_LEVEL: u32 = 3;

/// Progress fractions at which phases 2, 3 and 4 begin
pub const PHASE_THRESHOLDS: [f32; 3] = [0.25, 0.50, 0.75];
const PHASE_SPAWN_SCALE: [f32; 4] = [1.0, 0.95, 0.90, 0.85];
const PHASE_SPEED_SCALE: [f32; 4] = [1.0, 1.10, 1.20, 1.30];

/// Base values for one difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyCurve {
    /// Seconds between spawns
    pub spawn_interval: f32,
    /// Meteor fall speed (units/s)
    pub fall_speed: f32,
    pub points_goal: u32,
}

const CURVES: [DifficultyCurve; 9] = [
    DifficultyCurve { spawn_interval: 7.0, fall_speed: 0.50, points_goal: 300 },
    DifficultyCurve { spawn_interval: 6.5, fall_speed: 0.55, points_goal: 400 },
    DifficultyCurve { spawn_interval: 6.0, fall_speed: 0.60, points_goal: 500 },
    DifficultyCurve { spawn_interval: 5.5, fall_speed: 0.70, points_goal: 600 },
    DifficultyCurve { spawn_interval: 5.0, fall_speed: 0.80, points_goal: 700 },
    DifficultyCurve { spawn_interval: 4.5, fall_speed: 0.90, points_goal: 800 },
    DifficultyCurve { spawn_interval: 4.0, fall_speed: 1.00, points_goal: 900 },
    DifficultyCurve { spawn_interval: 3.5, fall_speed: 1.15, points_goal: 1000 },
    DifficultyCurve { spawn_interval: 3.0, fall_speed: 1.30, points_goal: 1200 },
];

/// Lookup table entry, clamping out-of-range levels
pub fn curve(difficulty: u8) -> DifficultyCurve {
    let level = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    CURVES[(level - 1) as usize]
}

/// Phase for a points total (1 below 25%, 4 at or above 75%)
pub fn phase_for_progress(points: u32, goal: u32) -> u8 {
    if goal == 0 {
        return MAX_PHASE;
    }
    let progress = points as f32 / goal as f32;
    1 + PHASE_THRESHOLDS.iter().filter(|&&t| progress >= t).count() as u8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Difficulty {
    pub difficulty: u8,
    /// Anchor the loss recovery works from
    pub base_difficulty: u8,
    pub phase: u8,
    pub losses: u32,
}

impl Difficulty {
    pub fn new(difficulty: u8) -> Self {
        let level = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
        Self {
            difficulty: level,
            base_difficulty: level,
            phase: 1,
            losses: 0,
        }
    }

    pub fn curve(&self) -> DifficultyCurve {
        curve(self.difficulty)
    }

    fn phase_index(&self) -> usize {
        (self.phase.clamp(1, MAX_PHASE) - 1) as usize
    }

    /// Phase-scaled seconds between spawns
    pub fn spawn_interval(&self) -> f32 {
        self.curve().spawn_interval * PHASE_SPAWN_SCALE[self.phase_index()]
    }

    /// Phase-scaled fall speed
    pub fn fall_speed(&self) -> f32 {
        self.curve().fall_speed * PHASE_SPEED_SCALE[self.phase_index()]
    }

    pub fn points_goal(&self) -> u32 {
        self.curve().points_goal
    }

    /// Advance the phase from the current points total.
    ///
    /// Phases only move forward; returns the previous phase when it changed.
    pub fn update_phase(&mut self, points: u32) -> Option<u8> {
        let next = phase_for_progress(points, self.points_goal());
        if next > self.phase {
            let previous = self.phase;
            self.phase = next;
            log::info!("Phase {} -> {} at {} points", previous, next, points);
            Some(previous)
        } else {
            None
        }
    }

    pub fn record_loss(&mut self) {
        self.losses += 1;
    }

    /// Drop one level per [`LOSSES_PER_LEVEL`] losses below the base level
    pub fn adjust_by_losses(&mut self) {
        let drop = (self.losses / LOSSES_PER_LEVEL).min(u8::MAX as u32) as u8;
        let adjusted = self
            .base_difficulty
            .saturating_sub(drop)
            .clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
        if adjusted != self.difficulty {
            log::info!(
                "Difficulty {} -> {} after {} losses",
                self.difficulty,
                adjusted,
                self.losses
            );
        }
        self.difficulty = adjusted;
    }

    /// Back to phase 1 for a fresh attempt
    pub fn reset_phase(&mut self) {
        self.phase = 1;
    }
}

/// Maybe restore one barrier on a phase change.
///
/// With probability `chance`, restores a dead barrier (uniformly among dead
/// ones), or failing that a damaged one. Returns the restored index.
pub fn restore_barrier<R: Rng + ?Sized>(
    barriers: &mut [Barrier],
    chance: f64,
    rng: &mut R,
) -> Option<usize> {
    if !rng.random_bool(chance.clamp(0.0, 1.0)) {
        return None;
    }
    let dead: Vec<usize> = (0..barriers.len())
        .filter(|&i| barriers[i].health.is_dead())
        .collect();
    let pool = if dead.is_empty() {
        (0..barriers.len())
            .filter(|&i| barriers[i].health.is_damaged())
            .collect()
    } else {
        dead
    };
    if pool.is_empty() {
        return None;
    }
    let idx = pool[rng.random_range(0..pool.len())];
    barriers[idx].health.restore();
    Some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_curves_are_monotonic() {
        for d in MIN_DIFFICULTY..MAX_DIFFICULTY {
            let (a, b) = (curve(d), curve(d + 1));
            assert!(b.spawn_interval <= a.spawn_interval);
            assert!(b.fall_speed >= a.fall_speed);
            assert!(b.points_goal >= a.points_goal);
        }
    }

    #[test]
    fn test_phase_thresholds() {
        assert_eq!(phase_for_progress(0, 600), 1);
        assert_eq!(phase_for_progress(149, 600), 1);
        assert_eq!(phase_for_progress(150, 600), 2);
        assert_eq!(phase_for_progress(300, 600), 3);
        assert_eq!(phase_for_progress(450, 600), 4);
        assert_eq!(phase_for_progress(900, 600), 4);
    }

    #[test]
    fn test_phase_escalation_scales_curve() {
        // Difficulty 4 has a 600 point goal
        let mut difficulty = Difficulty::new(4);
        assert_eq!(difficulty.points_goal(), 600);
        let base = difficulty.curve();

        assert_eq!(difficulty.update_phase(310), Some(1));
        assert_eq!(difficulty.phase, 3);
        assert!((difficulty.spawn_interval() - base.spawn_interval * 0.90).abs() < 1e-6);
        assert!((difficulty.fall_speed() - base.fall_speed * 1.20).abs() < 1e-6);

        // Never moves backward
        assert_eq!(difficulty.update_phase(10), None);
        assert_eq!(difficulty.phase, 3);
    }

    #[test]
    fn test_loss_recovery() {
        let mut difficulty = Difficulty::new(5);
        for _ in 0..6 {
            difficulty.record_loss();
        }
        difficulty.adjust_by_losses();
        assert_eq!(difficulty.difficulty, 3);
        assert_eq!(difficulty.base_difficulty, 5);
    }

    #[test]
    fn test_loss_recovery_clamps_to_one() {
        let mut difficulty = Difficulty::new(2);
        difficulty.losses = 30;
        difficulty.adjust_by_losses();
        assert_eq!(difficulty.difficulty, 1);
    }

    #[test]
    fn test_restore_prefers_dead_barriers() {
        let mut barriers = Barrier::row(4, 2.0);
        barriers[0].health.damage(1.0);
        barriers[2].health.damage(2.0);
        let mut rng = Pcg32::seed_from_u64(3);
        assert_eq!(restore_barrier(&mut barriers, 1.0, &mut rng), Some(2));
        assert_eq!(barriers[2].health.current, 2.0);
        assert_eq!(restore_barrier(&mut barriers, 1.0, &mut rng), Some(0));
        assert_eq!(restore_barrier(&mut barriers, 1.0, &mut rng), None);
    }

    #[test]
    fn test_restore_can_be_skipped() {
        let mut barriers = Barrier::row(2, 1.0);
        barriers[0].health.damage(1.0);
        let mut rng = Pcg32::seed_from_u64(3);
        assert_eq!(restore_barrier(&mut barriers, 0.0, &mut rng), None);
        assert!(barriers[0].health.is_dead());
    }

    proptest! {
        #[test]
        fn prop_monotonic_at_fixed_phase(phase in 1u8..=4) {
            let mut last_interval = f32::MAX;
            let mut last_speed = 0.0f32;
            for d in MIN_DIFFICULTY..=MAX_DIFFICULTY {
                let mut difficulty = Difficulty::new(d);
                difficulty.phase = phase;
                prop_assert!(difficulty.spawn_interval() <= last_interval);
                prop_assert!(difficulty.fall_speed() >= last_speed);
                last_interval = difficulty.spawn_interval();
                last_speed = difficulty.fall_speed();
            }
        }
    }
}
