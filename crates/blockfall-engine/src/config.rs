//! Session configuration.
//!
//! [`GameConfig`] gathers every tunable rule of a session: board size,
//! piece generation, hold, lock delay, scoring and fall speed. It is
//! serde-friendly so front ends can load it from a file; every field has a
//! default, so a partial document is enough.
//!
//! ```
//! use blockfall_engine::{GameConfig, GeneratorPolicy};
//!
//! let config: GameConfig = serde_json::from_str(r#"{ "generator": "uniform", "lock_delay_ms": 0 }"#).unwrap();
//! assert_eq!(config.generator, GeneratorPolicy::Uniform);
//! assert_eq!(config.rows, 20);
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{MAX_SHAPE_SIZE, PieceSeed};

/// Largest supported board side.
pub const MAX_BOARD_SIDE: usize = 256;

/// How the next shape is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorPolicy {
    /// Shuffled bag of all seven shapes, refilled when empty.
    #[default]
    Bag,
    /// Independent uniform draw per piece; repeats are unbounded.
    Uniform,
}

/// How a spawned piece gets its color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorPolicy {
    /// Uniform draw from the palette at every spawn.
    #[default]
    RandomPerSpawn,
    /// Fixed color per shape kind.
    PerShape,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("board size {rows}x{cols} is out of range")]
    BoardSize { rows: usize, cols: usize },
    #[display("score table must not be empty")]
    EmptyScoreTable,
    #[display("level-up threshold must be positive")]
    ZeroLevelThreshold,
    #[display("fall interval must be positive")]
    ZeroFallInterval,
    #[display("minimum fall interval ({min_ms}ms) exceeds base fall interval ({base_ms}ms)")]
    MinIntervalAboveBase { min_ms: u64, base_ms: u64 },
}

/// Rules for a game session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub generator: GeneratorPolicy,
    pub color: ColorPolicy,
    /// Enables [`Intent::Hold`](crate::Intent::Hold) and [`Intent::Restore`](crate::Intent::Restore).
    pub hold_enabled: bool,
    /// Grace period before a grounded piece locks. `0` locks on the first
    /// failed downward move.
    pub lock_delay_ms: u64,
    /// Points awarded per number of lines cleared at once, indexed by count.
    pub score_table: Vec<u64>,
    pub level_up_threshold: u64,
    pub base_fall_interval_ms: u64,
    pub fall_interval_step_ms: u64,
    pub min_fall_interval_ms: u64,
    /// Fixed seed for reproducible piece sequences. A fresh random seed is
    /// used for every game when unset.
    pub seed: Option<PieceSeed>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 20,
            cols: 10,
            generator: GeneratorPolicy::Bag,
            color: ColorPolicy::RandomPerSpawn,
            hold_enabled: true,
            lock_delay_ms: 500,
            score_table: vec![0, 100, 300, 500, 800],
            level_up_threshold: 600,
            base_fall_interval_ms: 400,
            fall_interval_step_ms: 50,
            min_fall_interval_ms: 50,
            seed: None,
        }
    }
}

impl GameConfig {
    /// The minimal rule set: uniform shapes, fixed colors, no hold, no lock
    /// delay and a constant 500ms fall tick.
    #[must_use]
    pub fn classic() -> Self {
        Self {
            generator: GeneratorPolicy::Uniform,
            color: ColorPolicy::PerShape,
            hold_enabled: false,
            lock_delay_ms: 0,
            base_fall_interval_ms: 500,
            fall_interval_step_ms: 0,
            min_fall_interval_ms: 500,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: PieceSeed) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn lock_delay(&self) -> Duration {
        Duration::from_millis(self.lock_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let side_ok = |n: usize| (MAX_SHAPE_SIZE..=MAX_BOARD_SIDE).contains(&n);
        if !side_ok(self.rows) || !side_ok(self.cols) {
            return Err(ConfigError::BoardSize {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.score_table.is_empty() {
            return Err(ConfigError::EmptyScoreTable);
        }
        if self.level_up_threshold == 0 {
            return Err(ConfigError::ZeroLevelThreshold);
        }
        if self.min_fall_interval_ms == 0 {
            return Err(ConfigError::ZeroFallInterval);
        }
        if self.min_fall_interval_ms > self.base_fall_interval_ms {
            return Err(ConfigError::MinIntervalAboveBase {
                min_ms: self.min_fall_interval_ms,
                base_ms: self.base_fall_interval_ms,
            });
        }
        Ok(())
    }
}
