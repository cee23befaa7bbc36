//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod combat;
pub mod difficulty;
pub mod event;
pub mod projectile;
pub mod registry;
pub mod score;
pub mod stage;
pub mod state;
pub mod targeting;
pub mod tick;

pub use combat::{CombatContext, CombatResolver, HitOutcome};
pub use difficulty::{Difficulty, DifficultyCurve};
pub use event::{Feedback, GameEvent, KillReason};
pub use projectile::{Pool, PoolHandle, Poolable, Shot, Wave};
pub use registry::{MeteorRegistry, SpawnLayout, SpawnParams};
pub use score::ScoreTracker;
pub use stage::Stage;
pub use state::{
    Barrier, Condition, GameSpeed, Health, Meteor, MeteorId, SimClock, StagePhase, Surface,
};
pub use targeting::{TargetPhase, Targeting, TargetingEvent};
pub use tick::{TickInput, tick};
