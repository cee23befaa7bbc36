//! Meteor Units - an arcade unit-conversion game engine
//!
//! Falling meteors carry a conversion question; the player destroys a meteor by
//! firing the candidate that matches the converted value before it reaches the
//! barriers and the surface below.
//!
//! Core modules:
//! - `units`: Conversion catalog (length, weight, time, capacity)
//! - `question`: Candidate and distractor generation
//! - `sim`: Deterministic stage simulation (meteors, targeting, combat, scoring)
//! - `puzzle`: Answer-selection minigames (buttons, swap, slide, path)
//! - `settings`: Player preferences and stage configuration
//! - `records`: Stage result value objects for the persistence layer

pub mod error;
pub mod puzzle;
pub mod question;
pub mod records;
pub mod settings;
pub mod sim;
pub mod units;

pub use error::{GameError, Result};
pub use records::{StageRecords, StageResult};
pub use settings::{Settings, StageConfig, StageMode};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per rendered frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World bounds (meteors spawn at the top and fall toward y = 0)
    pub const WORLD_MIN_X: f32 = -8.0;
    pub const WORLD_MAX_X: f32 = 8.0;
    pub const SPAWN_Y: f32 = 12.0;
    /// Meteors knocked above this height are out of bounds
    pub const CEILING_Y: f32 = 20.0;
    pub const BARRIER_Y: f32 = 1.5;
    pub const SURFACE_Y: f32 = 0.0;

    /// The cannon sits on the surface, centered
    pub const CANNON_X: f32 = 0.0;
    pub const CANNON_Y: f32 = 0.5;

    /// Meteor collision radius
    pub const METEOR_RADIUS: f32 = 0.6;
    /// Hard cap on concurrent meteors
    pub const MAX_METEORS: usize = 12;
    /// Cap for the non-combat showcase mode
    pub const MAX_SHOWCASE_METEORS: usize = 10;
    /// Candidate answers carried by each meteor
    pub const CANDIDATE_COUNT: usize = 7;

    /// Reticle approach speed (units/s)
    pub const RETICLE_SPEED: f32 = 24.0;

    /// Shot travel speed (units/s)
    pub const SHOT_SPEED: f32 = 30.0;
    pub const SHOT_RADIUS: f32 = 0.2;
    /// Success wave expansion speed and final radius
    pub const WAVE_SPEED: f32 = 12.0;
    pub const WAVE_MAX_RADIUS: f32 = 4.0;
    /// Knockback impulse applied per hit
    pub const HIT_FORCE: f32 = 6.0;
    /// Gravity pulling knocked-back meteors down (units/s²)
    pub const KNOCKBACK_GRAVITY: f32 = 9.0;

    /// Damage dealt by a meteor impact
    pub const IMPACT_DAMAGE: f32 = 1.0;

    /// Combo timer (unscaled seconds)
    pub const COMBO_TIME: f32 = 16.0;
    /// Firing lockout after an incorrect answer (unscaled seconds)
    pub const STUN_TIME: f32 = 1.0;
}

/// Tolerance for comparing conversion values
pub const VALUE_TOLERANCE: f64 = 1e-4;

/// Round to a fixed number of decimal places
///
/// Every generated value goes through this so binary floating point drift
/// (e.g. `0.1 * 3.0`) never leaks into candidates.
#[inline]
pub fn round_to_places(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Relative comparison with a tiny absolute floor
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    let diff = (a - b).abs();
    diff < 1e-9 || diff <= VALUE_TOLERANCE * a.abs().max(b.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_places() {
        assert_eq!(round_to_places(1.23456, 3), 1.235);
        assert_eq!(round_to_places(0.1 * 3.0, 3), 0.3);
        assert_eq!(round_to_places(12.0, 3), 12.0);
    }

    #[test]
    fn test_approx_eq_relative() {
        assert!(approx_eq(12.0, 12.0));
        assert!(approx_eq(100_000.0, 100_005.0));
        assert!(!approx_eq(12.0, 7.0));
        assert!(!approx_eq(0.0001, 0.0));
    }
}
