//! Stage state and the command API
//!
//! A [`Stage`] owns every simulation component for one stage attempt. The
//! presentation layer sends commands through its methods (or [`super::tick`]
//! inputs), reads entity state back through the public fields, and drains
//! queued [`GameEvent`]s once per frame.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::combat::{CombatContext, CombatResolver};
use super::difficulty::Difficulty;
use super::event::{GameEvent, KillReason};
use super::projectile::{Pool, PoolHandle, Shot, Wave};
use super::registry::{MeteorRegistry, SpawnParams};
use super::score::ScoreTracker;
use super::state::{Barrier, GameSpeed, MeteorId, SimClock, StagePhase, Surface};
use super::targeting::Targeting;
use crate::consts::*;
use crate::error::{GameError, Result};
use crate::puzzle::PuzzleInstance;
use crate::question::QuestionOptions;
use crate::records::StageResult;
use crate::settings::{Settings, StageConfig};
use crate::units::{self, ConversionTemplate};

#[derive(Debug, Clone)]
pub struct Stage {
    pub config: StageConfig,
    pub resolver: CombatResolver,
    /// Seed the stage RNG was created from
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub clock: SimClock,
    pub registry: MeteorRegistry,
    pub targeting: Targeting,
    pub shots: Pool<Shot>,
    pub waves: Pool<Wave>,
    pub barriers: Vec<Barrier>,
    pub surface: Surface,
    pub difficulty: Difficulty,
    /// Level this attempt is played at; loss recovery only affects the next one
    pub played_difficulty: u8,
    pub score: ScoreTracker,
    pub puzzle: PuzzleInstance,
    /// Scaled seconds until the next spawn attempt
    pub spawn_timer: f32,
    /// Unscaled seconds left before firing is allowed again
    pub stun_timer: f32,
    pub phase: StagePhase,
    pub(crate) events: Vec<GameEvent>,
    templates: Vec<ConversionTemplate>,
    options: QuestionOptions,
    default_speed: GameSpeed,
}

impl Stage {
    pub fn new(config: StageConfig, settings: &Settings, seed: u64) -> Result<Self> {
        config.validate()?;
        let templates = units::templates_for(&config.families);
        if templates.is_empty() {
            return Err(GameError::InvalidConfig(format!(
                "no conversions for families {:?}",
                config.families
            )));
        }

        let mode = config.mode;
        let mut puzzle = PuzzleInstance::new(settings.puzzle.unwrap_or(config.puzzle));
        puzzle.start();

        log::info!(
            "Stage {} starting ({:?}, difficulty {}, seed {})",
            config.name,
            mode,
            config.difficulty,
            seed
        );

        let difficulty = Difficulty::new(config.difficulty);
        Ok(Self {
            resolver: CombatResolver {
                retain_target_through_knockback: config.retain_target_on_knockback,
                ..CombatResolver::new(mode.knockback(), mode.damage())
            },
            seed,
            rng: Pcg32::seed_from_u64(seed),
            clock: SimClock::new(settings.default_speed),
            registry: MeteorRegistry::new(mode.cap(), mode.layout()),
            targeting: Targeting::new(cannon()),
            shots: Pool::new(),
            waves: Pool::new(),
            barriers: Barrier::row(config.barrier_count, config.barrier_health),
            surface: Surface::new(config.surface_health),
            played_difficulty: difficulty.difficulty,
            difficulty,
            score: ScoreTracker::new(),
            puzzle,
            spawn_timer: 0.0,
            stun_timer: 0.0,
            phase: StagePhase::Playing,
            events: Vec::new(),
            templates,
            options: settings.question_options(),
            default_speed: settings.default_speed,
            config,
        })
    }

    /// Events queued since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn shot_in_flight(&self) -> bool {
        self.shots.active_count() > 0
    }

    /// Whether an answer can be fired right now
    pub fn can_fire(&self) -> bool {
        self.phase == StagePhase::Playing
            && self.targeting.is_locked()
            && !self.shot_in_flight()
            && self.stun_timer <= 0.0
            && self.puzzle.accepts_input()
    }

    /// Fire the value in a candidate slot at the locked target.
    ///
    /// `Ok(None)` when firing is currently not allowed.
    pub fn fire_at_candidate(&mut self, index: usize) -> Result<Option<PoolHandle>> {
        if index >= CANDIDATE_COUNT {
            return Err(GameError::CandidateOutOfRange {
                index,
                count: CANDIDATE_COUNT,
            });
        }
        if !self.can_fire() {
            return Ok(None);
        }
        let Some(target) = self.targeting.target() else {
            return Ok(None);
        };
        let Some(meteor) = self.registry.get(target) else {
            return Ok(None);
        };

        let candidate = meteor.question.candidates[index];
        let origin = cannon();
        let dir = (meteor.pos - origin).try_normalize().unwrap_or(Vec2::Y);

        let (handle, shot) = self.shots.acquire();
        shot.value = candidate.value;
        shot.candidate = Some(index);
        shot.from_correct = candidate.correct;
        shot.target = Some(target);
        shot.pos = origin;
        shot.vel = dir * SHOT_SPEED;

        self.push_event(GameEvent::ShotFired {
            candidate: Some(index),
            value: candidate.value,
        });
        Ok(Some(handle))
    }

    /// Fire the candidate bound to a puzzle piece
    pub fn select_puzzle_piece(&mut self, piece_id: u32) -> Result<Option<PoolHandle>> {
        match self.puzzle.select(piece_id)? {
            Some(candidate) => self.fire_at_candidate(candidate),
            None => Ok(None),
        }
    }

    pub fn set_game_speed(&mut self, scale: f32) {
        let speed = GameSpeed::from_scale(scale);
        if speed != self.clock.speed {
            log::debug!("Game speed {:?} -> {:?}", self.clock.speed, speed);
            self.clock.speed = speed;
        }
    }

    pub fn set_cover(&mut self, active: bool) {
        self.puzzle.set_cover(active);
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            StagePhase::Playing => {
                self.phase = StagePhase::Paused;
                self.puzzle.stop();
            }
            StagePhase::Paused => {
                self.phase = StagePhase::Playing;
                self.puzzle.start();
            }
            StagePhase::Won | StagePhase::Lost => {}
        }
    }

    /// Try to spawn one meteor; `None` at the cap
    pub fn spawn_meteor(&mut self) -> Option<MeteorId> {
        let params = SpawnParams {
            templates: &self.templates,
            difficulty: self.difficulty.difficulty,
            options: self.options,
            fall_speed: self.difficulty.fall_speed(),
        };
        let id = self.registry.spawn(&params, &mut self.rng)?;
        if let Some(meteor) = self.registry.get(id) {
            let pos = meteor.pos;
            self.push_event(GameEvent::MeteorSpawned { id, pos });
        }
        Some(id)
    }

    /// Target the live meteor closest to the cannon when nothing is targeted
    pub fn auto_target(&mut self) -> Option<MeteorId> {
        if !self.targeting.is_idle() {
            return None;
        }
        let id = self.registry.closest_targetable(cannon())?;
        self.targeting.set_target(id, self.clock.scaled);
        if self.config.mode.holds_target() {
            if let Some(meteor) = self.registry.get_mut(id) {
                meteor.held = true;
            }
        }
        self.push_event(GameEvent::TargetAcquired(id));
        Some(id)
    }

    /// Split borrow for the combat resolver plus the impact targets
    pub(crate) fn combat_parts(&mut self) -> (CombatContext<'_>, &mut Vec<Barrier>, &mut Surface) {
        (
            CombatContext {
                registry: &mut self.registry,
                targeting: &mut self.targeting,
                score: &mut self.score,
                waves: &mut self.waves,
                events: &mut self.events,
                difficulty: self.difficulty.difficulty,
                now: self.clock.scaled,
            },
            &mut self.barriers,
            &mut self.surface,
        )
    }

    /// End the stage: clear the field, release the target, end the puzzle
    pub fn finish(&mut self, won: bool) {
        if self.phase.is_over() {
            return;
        }
        for meteor in self.registry.kill_all() {
            self.events.push(GameEvent::MeteorKilled {
                id: meteor.id,
                reason: KillReason::Cleared,
                pos: meteor.pos,
            });
        }
        if self.targeting.remove_target().is_some() {
            self.events.push(GameEvent::AnswersCleared);
        }
        self.shots.release_all();
        self.waves.release_all();
        self.puzzle.end();

        if won {
            self.phase = StagePhase::Won;
            self.events.push(GameEvent::StageWon);
            log::info!(
                "Stage {} won with {} points in {:.1}s",
                self.config.name,
                self.score.points,
                self.clock.unscaled
            );
        } else {
            self.phase = StagePhase::Lost;
            self.events.push(GameEvent::StageLost);
            self.difficulty.record_loss();
            self.difficulty.adjust_by_losses();
            log::info!(
                "Stage {} lost ({} losses, next difficulty {})",
                self.config.name,
                self.difficulty.losses,
                self.difficulty.difficulty
            );
        }
    }

    /// Fresh attempt at the same stage, keeping losses and base difficulty
    pub fn reset(&mut self) {
        self.registry.reset();
        self.targeting = Targeting::new(cannon());
        self.shots.release_all();
        self.waves.release_all();
        self.barriers = Barrier::row(self.config.barrier_count, self.config.barrier_health);
        self.surface = Surface::new(self.config.surface_health);
        self.score = ScoreTracker::new();
        self.difficulty.reset_phase();
        self.played_difficulty = self.difficulty.difficulty;
        self.puzzle.rebuild();
        self.puzzle.start();
        self.clock = SimClock::new(self.default_speed);
        self.spawn_timer = 0.0;
        self.stun_timer = 0.0;
        self.phase = StagePhase::Playing;
        self.events.clear();
        log::info!(
            "Stage {} reset (difficulty {}, losses {})",
            self.config.name,
            self.difficulty.difficulty,
            self.difficulty.losses
        );
    }

    /// Result record for the current attempt
    pub fn result(&self) -> StageResult {
        StageResult {
            name: self.config.name.clone(),
            time: self.clock.unscaled,
            score: self.score.final_score(
                self.played_difficulty,
                self.clock.slow_time,
                self.clock.fast_time,
            ),
            highest_combo: self.score.highest_combo,
            losses: self.difficulty.losses,
            cleared: self.phase == StagePhase::Won,
        }
    }
}

/// Where shots start and the reticle rests
pub fn cannon() -> Vec2 {
    Vec2::new(CANNON_X, CANNON_Y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{Lifecycle, PuzzleKind};
    use crate::settings::StageMode;
    use crate::sim::targeting::TargetPhase;

    fn stage(mode: StageMode) -> Stage {
        let config = StageConfig {
            mode,
            difficulty: 3,
            ..Default::default()
        };
        Stage::new(config, &Settings::default(), 7).unwrap()
    }

    /// Spawn, target and lock one meteor without ticking
    fn locked(stage: &mut Stage) -> MeteorId {
        let id = stage.spawn_meteor().unwrap();
        stage.auto_target();
        stage.targeting.phase = TargetPhase::Locked(id);
        stage.puzzle.bind(CANDIDATE_COUNT);
        id
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = StageConfig {
            difficulty: 0,
            ..Default::default()
        };
        assert!(Stage::new(config, &Settings::default(), 1).is_err());
    }

    #[test]
    fn test_settings_override_puzzle() {
        let settings = Settings {
            puzzle: Some(PuzzleKind::Swap),
            ..Default::default()
        };
        let stage = Stage::new(StageConfig::default(), &settings, 1).unwrap();
        assert_eq!(stage.puzzle.kind, PuzzleKind::Swap);
        assert_eq!(stage.puzzle.lifecycle, Lifecycle::Running);
    }

    #[test]
    fn test_cannot_fire_without_lock() {
        let mut stage = stage(StageMode::Standard);
        assert!(!stage.can_fire());
        assert_eq!(stage.fire_at_candidate(0).unwrap(), None);

        stage.spawn_meteor();
        stage.auto_target();
        // Approaching is not enough
        assert!(!stage.can_fire());
    }

    #[test]
    fn test_fire_out_of_range() {
        let mut stage = stage(StageMode::Standard);
        assert!(matches!(
            stage.fire_at_candidate(CANDIDATE_COUNT),
            Err(GameError::CandidateOutOfRange { index: 7, count: 7 })
        ));
    }

    #[test]
    fn test_fire_guards() {
        let mut stage = stage(StageMode::Standard);
        locked(&mut stage);
        assert!(stage.can_fire());

        stage.stun_timer = STUN_TIME;
        assert!(!stage.can_fire());
        stage.stun_timer = 0.0;

        stage.set_cover(true);
        assert!(!stage.can_fire());
        stage.set_cover(false);

        let handle = stage.fire_at_candidate(2).unwrap();
        assert!(handle.is_some());
        // One shot at a time
        assert!(!stage.can_fire());
        assert_eq!(stage.fire_at_candidate(3).unwrap(), None);
    }

    #[test]
    fn test_fire_copies_candidate() {
        let mut stage = stage(StageMode::Standard);
        let id = locked(&mut stage);
        let slot = stage.registry.get(id).unwrap().question.answer_slot;
        let handle = stage.fire_at_candidate(slot).unwrap().unwrap();
        let shot = stage.shots.get(handle).unwrap();
        assert!(shot.from_correct);
        assert_eq!(shot.target, Some(id));
        assert_eq!(shot.pos, cannon());
        assert!(stage.events().iter().any(|e| matches!(
            e,
            GameEvent::ShotFired { candidate: Some(s), .. } if *s == slot
        )));
    }

    #[test]
    fn test_select_piece_routes_to_candidate() {
        let mut stage = stage(StageMode::Standard);
        locked(&mut stage);
        assert!(stage.select_puzzle_piece(4).unwrap().is_some());
        let shot = stage.shots.iter().next().unwrap();
        assert_eq!(shot.candidate, Some(4));
        assert!(stage.select_puzzle_piece(42).is_err());
    }

    #[test]
    fn test_rush_holds_target() {
        let mut stage = stage(StageMode::Rush);
        let id = stage.spawn_meteor().unwrap();
        assert_eq!(stage.auto_target(), Some(id));
        assert!(stage.registry.get(id).unwrap().held);
        // Already targeting
        assert_eq!(stage.auto_target(), None);
    }

    #[test]
    fn test_finish_loss_adjusts_difficulty() {
        let mut stage = stage(StageMode::Standard);
        locked(&mut stage);
        stage.difficulty.losses = 2;
        stage.finish(false);
        assert_eq!(stage.phase, StagePhase::Lost);
        assert!(stage.registry.is_empty());
        assert!(stage.targeting.is_idle());
        assert_eq!(stage.puzzle.lifecycle, Lifecycle::Ended);
        assert_eq!(stage.difficulty.losses, 3);
        assert_eq!(stage.difficulty.difficulty, 2);
        assert!(stage.events().contains(&GameEvent::StageLost));

        // Idempotent
        stage.finish(false);
        assert_eq!(stage.difficulty.losses, 3);
    }

    #[test]
    fn test_reset_keeps_losses() {
        let mut stage = stage(StageMode::Standard);
        locked(&mut stage);
        stage.score.record_success(3);
        stage.finish(false);
        stage.reset();
        assert_eq!(stage.phase, StagePhase::Playing);
        assert_eq!(stage.difficulty.losses, 1);
        assert_eq!(stage.difficulty.base_difficulty, 3);
        assert_eq!(stage.score.points, 0);
        assert!(stage.registry.is_empty());
        assert_eq!(stage.puzzle.lifecycle, Lifecycle::Running);
        assert!(stage.events().is_empty());
    }

    #[test]
    fn test_result_record() {
        let mut stage = stage(StageMode::Standard);
        stage.score.points = 100;
        stage.score.highest_combo = 2;
        stage.finish(true);
        let result = stage.result();
        assert!(result.cleared);
        assert_eq!(result.name, "stage-1");
        // No time at slow or fast: both bonuses full
        assert_eq!(result.score, 100 + 150 + 200 + 150 + 150);
    }

    #[test]
    fn test_loss_result_scores_played_difficulty() {
        let mut stage = stage(StageMode::Standard);
        stage.difficulty.losses = 2;
        stage.finish(false);
        assert_eq!(stage.difficulty.difficulty, 2);
        // 50 * 3 plus both full speed bonuses
        assert_eq!(stage.result().score, 150 + 150 + 150);

        stage.reset();
        assert_eq!(stage.played_difficulty, 2);
        assert_eq!(stage.result().score, 100 + 150 + 150);
    }

    #[test]
    fn test_config_enables_knockback_retention() {
        let config = StageConfig {
            mode: StageMode::Rush,
            retain_target_on_knockback: true,
            ..Default::default()
        };
        let stage = Stage::new(config, &Settings::default(), 3).unwrap();
        assert!(stage.resolver.retain_target_through_knockback);
    }

    #[test]
    fn test_pause_stops_puzzle() {
        let mut stage = stage(StageMode::Standard);
        stage.toggle_pause();
        assert_eq!(stage.phase, StagePhase::Paused);
        assert_eq!(stage.puzzle.lifecycle, Lifecycle::Stopped);
        stage.toggle_pause();
        assert_eq!(stage.phase, StagePhase::Playing);
        assert_eq!(stage.puzzle.lifecycle, Lifecycle::Running);
    }

    #[test]
    fn test_game_speed() {
        let mut stage = stage(StageMode::Standard);
        stage.set_game_speed(2.0);
        assert_eq!(stage.clock.speed, GameSpeed::Fast);
        stage.set_game_speed(0.4);
        assert_eq!(stage.clock.speed, GameSpeed::Slow);
    }
}
