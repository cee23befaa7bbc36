//! Player preferences and per-stage configuration
//!
//! Both are plain serde values; loading and saving them is the host's job.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{GameError, Result};
use crate::puzzle::PuzzleKind;
use crate::question::QuestionOptions;
use crate::sim::difficulty::{MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::sim::registry::SpawnLayout;
use crate::sim::state::GameSpeed;
use crate::units::UnitFamily;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Round every generated input up to a whole number
    pub no_decimals: bool,
    /// Allow fractional rendering of small metric inputs
    pub fraction_questions: bool,
    pub default_speed: GameSpeed,
    /// Overrides the stage's puzzle when set
    pub puzzle: Option<PuzzleKind>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            no_decimals: false,
            fraction_questions: true,
            default_speed: GameSpeed::Normal,
            puzzle: None,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| GameError::Parse {
            what: "settings",
            source,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| GameError::Parse {
            what: "settings",
            source,
        })
    }

    pub fn question_options(&self) -> QuestionOptions {
        QuestionOptions {
            no_decimals: self.no_decimals,
            fraction_questions: self.fraction_questions,
        }
    }
}

/// How a stage plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StageMode {
    /// Shots at a random spread of meteors
    #[default]
    Standard,
    /// Targeted meteors hold position; misses and successes knock meteors back
    Rush,
    /// Non-combat grid presentation, no damage
    Showcase,
}

impl StageMode {
    /// Live meteor cap
    pub fn cap(&self) -> usize {
        match self {
            StageMode::Standard | StageMode::Rush => MAX_METEORS,
            StageMode::Showcase => MAX_SHOWCASE_METEORS,
        }
    }

    pub fn layout(&self) -> SpawnLayout {
        match self {
            StageMode::Standard | StageMode::Rush => SpawnLayout::random(),
            StageMode::Showcase => SpawnLayout::grid(MAX_SHOWCASE_METEORS),
        }
    }

    pub fn knockback(&self) -> bool {
        matches!(self, StageMode::Rush)
    }

    pub fn damage(&self) -> bool {
        !matches!(self, StageMode::Showcase)
    }

    /// Targeted meteors stop falling until released
    pub fn holds_target(&self) -> bool {
        matches!(self, StageMode::Rush)
    }
}

/// Configuration for one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub name: String,
    pub mode: StageMode,
    pub difficulty: u8,
    pub puzzle: PuzzleKind,
    pub barrier_count: usize,
    pub barrier_health: f32,
    pub surface_health: f32,
    /// Chance a phase change restores a barrier
    pub barrier_restore_chance: f64,
    pub families: Vec<UnitFamily>,
    /// Rush: keep aiming at a target knocked back by a success wave
    pub retain_target_on_knockback: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            name: "stage-1".to_string(),
            mode: StageMode::Standard,
            difficulty: 1,
            puzzle: PuzzleKind::Buttons,
            barrier_count: 4,
            barrier_health: 3.0,
            surface_health: 3.0,
            barrier_restore_chance: 0.5,
            families: UnitFamily::ALL.to_vec(),
            retain_target_on_knockback: false,
        }
    }
}

impl StageConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|source| GameError::Parse {
            what: "stage config",
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| GameError::Parse {
            what: "stage config",
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty) {
            return Err(GameError::InvalidConfig(format!(
                "difficulty {} outside {}..={}",
                self.difficulty, MIN_DIFFICULTY, MAX_DIFFICULTY
            )));
        }
        if self.name.trim().is_empty() {
            return Err(GameError::InvalidConfig("stage name is empty".into()));
        }
        if self.barrier_count > 0 && self.barrier_health <= 0.0 {
            return Err(GameError::InvalidConfig(format!(
                "barrier health {} must be positive",
                self.barrier_health
            )));
        }
        if self.surface_health <= 0.0 {
            return Err(GameError::InvalidConfig(format!(
                "surface health {} must be positive",
                self.surface_health
            )));
        }
        if !(0.0..=1.0).contains(&self.barrier_restore_chance) {
            return Err(GameError::InvalidConfig(format!(
                "barrier restore chance {} outside 0..=1",
                self.barrier_restore_chance
            )));
        }
        if self.families.is_empty() {
            return Err(GameError::InvalidConfig("no unit families".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(StageConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_config() {
        let bad = [
            StageConfig {
                difficulty: 0,
                ..Default::default()
            },
            StageConfig {
                difficulty: 10,
                ..Default::default()
            },
            StageConfig {
                barrier_health: 0.0,
                ..Default::default()
            },
            StageConfig {
                surface_health: -1.0,
                ..Default::default()
            },
            StageConfig {
                barrier_restore_chance: 1.5,
                ..Default::default()
            },
            StageConfig {
                families: Vec::new(),
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_config_json_fills_defaults() {
        let config = StageConfig::from_json(r#"{"name":"rush-3","mode":"Rush","difficulty":3}"#)
            .unwrap();
        assert_eq!(config.mode, StageMode::Rush);
        assert_eq!(config.barrier_count, 4);
        assert_eq!(config.families.len(), UnitFamily::ALL.len());
    }

    #[test]
    fn test_config_json_validates() {
        let err = StageConfig::from_json(r#"{"difficulty":12}"#).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
        let err = StageConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, GameError::Parse { what: "stage config", .. }));
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings {
            no_decimals: true,
            puzzle: Some(PuzzleKind::Path),
            default_speed: GameSpeed::Fast,
            ..Default::default()
        };
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
        assert!(settings.question_options().no_decimals);
    }

    #[test]
    fn test_mode_rules() {
        assert_eq!(StageMode::Standard.cap(), 12);
        assert_eq!(StageMode::Showcase.cap(), 10);
        assert!(StageMode::Rush.knockback());
        assert!(!StageMode::Standard.knockback());
        assert!(!StageMode::Showcase.damage());
        assert!(matches!(StageMode::Showcase.layout(), SpawnLayout::Grid { .. }));
    }
}
