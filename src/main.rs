//! Meteor Units headless runner
//!
//! Plays one stage with an autopilot at a fixed timestep and prints the stage
//! result as JSON.
//!
//! Usage: `meteor-units [seed] [difficulty] [standard|rush|showcase]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use meteor_units::consts::*;
    use meteor_units::sim::{Stage, StagePhase, TickInput, tick};
    use meteor_units::{GameError, Result, Settings, StageConfig, StageMode, StageRecords};

    /// Simulated frame time (two sim steps per frame)
    const FRAME_DT: f32 = 1.0 / 30.0;
    /// Give up after this many seconds of play
    const TIME_LIMIT: f32 = 20.0 * 60.0;
    /// Unscaled seconds the autopilot "thinks" after a lock
    const THINK_TIME: f32 = 0.8;

    /// Answers every locked meteor correctly after a short delay, alternating
    /// between direct candidate fire and puzzle piece selection
    #[derive(Default)]
    struct Autopilot {
        locked_at: Option<f32>,
        answered: u32,
    }

    impl Autopilot {
        fn input(&mut self, stage: &Stage) -> TickInput {
            let mut input = TickInput::default();
            if !stage.targeting.is_locked() {
                self.locked_at = None;
                return input;
            }
            let now = stage.clock.unscaled;
            let locked_at = *self.locked_at.get_or_insert(now);
            if now - locked_at < THINK_TIME || !stage.can_fire() {
                return input;
            }

            let Some(meteor) = stage.targeting.target().and_then(|id| stage.registry.get(id))
            else {
                return input;
            };
            let slot = meteor.question.answer_slot;
            log::debug!("Answering {} with slot {}", meteor.question.prompt(), slot);

            match stage.puzzle.piece_for_candidate(slot) {
                Some(piece) if self.answered % 2 == 1 => input.select_piece = Some(piece.id),
                _ => input.fire_candidate = Some(slot),
            }
            self.answered += 1;
            self.locked_at = None;
            input
        }
    }

    struct Args {
        seed: u64,
        difficulty: u8,
        mode: StageMode,
    }

    fn parse_args() -> Result<Args> {
        let mut args = std::env::args().skip(1);
        let seed = match args.next() {
            Some(s) => s
                .parse()
                .map_err(|_| GameError::InvalidConfig(format!("bad seed {s:?}")))?,
            None => 42,
        };
        let difficulty = match args.next() {
            Some(s) => s
                .parse()
                .map_err(|_| GameError::InvalidConfig(format!("bad difficulty {s:?}")))?,
            None => 3,
        };
        let mode = match args.next().as_deref() {
            None | Some("standard") => StageMode::Standard,
            Some("rush") => StageMode::Rush,
            Some("showcase") => StageMode::Showcase,
            Some(other) => {
                return Err(GameError::InvalidConfig(format!("unknown mode {other:?}")));
            }
        };
        Ok(Args {
            seed,
            difficulty,
            mode,
        })
    }

    pub fn run() -> Result<()> {
        let args = parse_args()?;
        let config = StageConfig {
            name: format!("{:?}-{}", args.mode, args.difficulty).to_lowercase(),
            mode: args.mode,
            difficulty: args.difficulty,
            ..Default::default()
        };
        let mut stage = Stage::new(config, &Settings::default(), args.seed)?;
        let mut autopilot = Autopilot::default();
        let mut accumulator = 0.0f32;

        while stage.phase == StagePhase::Playing && stage.clock.unscaled < TIME_LIMIT {
            accumulator += FRAME_DT.min(0.1);
            let mut substeps = 0;
            while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = autopilot.input(&stage);
                tick(&mut stage, &input, SIM_DT);
                accumulator -= SIM_DT;
                substeps += 1;
            }
            for event in stage.drain_events() {
                log::trace!("{:?}", event);
            }
        }

        let result = stage.result();
        let mut records = StageRecords::new();
        records.submit(result.clone());
        log::info!(
            "Finished {} after {:.1}s: {:?} ({} cleared)",
            result.name,
            result.time,
            stage.phase,
            records.cleared_count()
        );

        let json = serde_json::to_string_pretty(&result).map_err(|source| GameError::Parse {
            what: "stage result",
            source,
        })?;
        println!("{json}");
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Meteor Units (headless) starting...");

    if let Err(err) = headless::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly on wasm
}
