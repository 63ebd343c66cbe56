use serde::{Deserialize, Serialize};

use crate::util::{rounded_mean, std_dev};

pub const INITIAL_SPEED_MS: u64 = 30_000;
pub const MIN_SPEED_MS: u64 = 5_000;
pub const SPEED_STEP_MS: u64 = 1_000;
/// Successes needed to advance one level.
pub const CHALLENGES_PER_LEVEL: u32 = 5;

const BASE_POINTS: f64 = 100.0;

/// The linear difficulty rule: start at `initial_ms`, lose `step_ms` per
/// level, never go below `min_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedRule {
    pub initial_ms: u64,
    pub min_ms: u64,
    pub step_ms: u64,
}

impl Default for SpeedRule {
    fn default() -> Self {
        Self {
            initial_ms: INITIAL_SPEED_MS,
            min_ms: MIN_SPEED_MS,
            step_ms: SPEED_STEP_MS,
        }
    }
}

/// Points for one success: a flat 100 plus a tenth of the time left over.
pub fn points_for(reaction_time_ms: u64, speed_ms: u64) -> u64 {
    let bonus = speed_ms.saturating_sub(reaction_time_ms) as f64;
    (BASE_POINTS + bonus / 10.0).round() as u64
}

/// Score, level and speed for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTracker {
    rule: SpeedRule,
    score: u64,
    level: u32,
    speed_ms: u64,
    completed_count: u32,
    reaction_times: Vec<u64>,
}

impl Default for ScoreTracker {
    fn default() -> Self {
        Self::new(SpeedRule::default())
    }
}

impl ScoreTracker {
    pub fn new(rule: SpeedRule) -> Self {
        Self {
            speed_ms: rule.initial_ms.max(rule.min_ms),
            rule,
            score: 0,
            level: 1,
            completed_count: 0,
            reaction_times: Vec::new(),
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn speed_ms(&self) -> u64 {
        self.speed_ms
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_count
    }

    pub fn reaction_times(&self) -> &[u64] {
        &self.reaction_times
    }

    pub fn rule(&self) -> SpeedRule {
        self.rule
    }

    /// Record one success and return the points it earned.
    pub fn record_success(&mut self, reaction_time_ms: u64, speed_ms: u64) -> u64 {
        let points = points_for(reaction_time_ms, speed_ms);
        self.reaction_times.push(reaction_time_ms);
        self.completed_count += 1;
        self.score += points;
        points
    }

    /// Advance a level on every fifth success. Returns true when it did.
    pub fn maybe_level_up(&mut self) -> bool {
        if self.completed_count == 0 || self.completed_count % CHALLENGES_PER_LEVEL != 0 {
            return false;
        }
        self.level += 1;
        self.speed_ms = self
            .speed_ms
            .saturating_sub(self.rule.step_ms)
            .max(self.rule.min_ms);
        true
    }

    pub fn average_reaction_time(&self) -> u64 {
        rounded_mean(&self.reaction_times)
    }

    pub fn reaction_std_dev(&self) -> f64 {
        std_dev(&self.reaction_times).unwrap_or(0.0)
    }

    /// Percent of the way to the next level, in steps of 20.
    pub fn progress_within_level(&self) -> u32 {
        (self.completed_count % CHALLENGES_PER_LEVEL) * (100 / CHALLENGES_PER_LEVEL)
    }
}
