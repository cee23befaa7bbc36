//! Stage results and best-result records
//!
//! Produced by the simulation; reading and writing them is the host's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Outcome of one stage attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub name: String,
    /// Unscaled seconds played
    pub time: f32,
    pub score: u64,
    pub highest_combo: u32,
    pub losses: u32,
    pub cleared: bool,
}

impl StageResult {
    /// Whether this result should replace `other` as the best
    pub fn beats(&self, other: &StageResult) -> bool {
        match (self.cleared, other.cleared) {
            (true, false) => true,
            (false, true) => false,
            _ => self.score > other.score,
        }
    }
}

/// Best result per stage name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageRecords {
    pub stages: BTreeMap<String, StageResult>,
}

impl StageRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result; returns true if it became the stage's best
    pub fn submit(&mut self, result: StageResult) -> bool {
        match self.stages.get(&result.name) {
            Some(best) if !result.beats(best) => false,
            _ => {
                log::info!(
                    "New best for {}: {} (cleared: {})",
                    result.name,
                    result.score,
                    result.cleared
                );
                self.stages.insert(result.name.clone(), result);
                true
            }
        }
    }

    pub fn best(&self, name: &str) -> Option<&StageResult> {
        self.stages.get(name)
    }

    pub fn is_cleared(&self, name: &str) -> bool {
        self.best(name).is_some_and(|r| r.cleared)
    }

    pub fn cleared_count(&self) -> usize {
        self.stages.values().filter(|r| r.cleared).count()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| GameError::Parse {
            what: "stage records",
            source,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|source| GameError::Parse {
            what: "stage records",
            source,
        })
    }
}
