use std::time::Duration;

use crate::GameConfig;

/// Score, level and fall-speed bookkeeping for a session.
///
/// - **Score**: sum of line-clear awards from a configurable table
///   (`[0, 100, 300, 500, 800]` by default, indexed by lines cleared at once)
/// - **Level**: `score / level_up_threshold + 1`
/// - **Fall interval**: `max(min, base - step * (level - 1))`
///
/// It also keeps the statistics a front end may want to show: locked pieces,
/// total cleared lines and a histogram of clears by size.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use blockfall_engine::{GameConfig, ScoreTracker};
///
/// let mut tracker = ScoreTracker::new(&GameConfig::default());
/// tracker.on_lines_cleared(4);
/// assert_eq!(tracker.level(), 1);
///
/// assert_eq!(tracker.recompute_level(), Some(Duration::from_millis(350)));
/// assert_eq!(tracker.score(), 800);
/// assert_eq!(tracker.level(), 2);
/// assert_eq!(tracker.line_cleared_counter()[4], 1);
/// ```
#[derive(Debug, Clone)]
pub struct ScoreTracker {
    score_table: Vec<u64>,
    level_up_threshold: u64,
    base_interval: Duration,
    interval_step: Duration,
    min_interval: Duration,
    score: u64,
    level: u64,
    completed_pieces: usize,
    total_cleared_lines: usize,
    line_cleared_counter: Vec<usize>,
}

impl ScoreTracker {
    /// Creates a tracker at level 1 with all counters at zero.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            score_table: config.score_table.clone(),
            level_up_threshold: config.level_up_threshold.max(1),
            base_interval: Duration::from_millis(config.base_fall_interval_ms),
            interval_step: Duration::from_millis(config.fall_interval_step_ms),
            min_interval: Duration::from_millis(config.min_fall_interval_ms),
            score: 0,
            level: 1,
            completed_pieces: 0,
            total_cleared_lines: 0,
            line_cleared_counter: vec![0; config.score_table.len()],
        }
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Returns the current level, starting at 1.
    #[must_use]
    pub fn level(&self) -> u64 {
        self.level
    }

    /// Returns the total number of pieces that have been locked.
    #[must_use]
    pub fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    #[must_use]
    pub fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Returns how many locks cleared each number of lines.
    ///
    /// Index `n` counts locks that cleared exactly `n` lines; clears larger
    /// than the score table are counted in the last bucket.
    #[must_use]
    pub fn line_cleared_counter(&self) -> &[usize] {
        &self.line_cleared_counter
    }

    /// Returns the points for clearing `lines` at once.
    ///
    /// Counts past the end of the table award its last entry.
    #[must_use]
    pub fn points_for(&self, lines: usize) -> u64 {
        let index = lines.min(self.score_table.len().saturating_sub(1));
        self.score_table.get(index).copied().unwrap_or(0)
    }

    /// Records a lock that cleared `lines` rows and returns the score gained.
    pub fn on_lines_cleared(&mut self, lines: usize) -> u64 {
        let delta = self.points_for(lines);
        self.completed_pieces += 1;
        self.total_cleared_lines += lines;
        let bucket = lines.min(self.line_cleared_counter.len().saturating_sub(1));
        if let Some(count) = self.line_cleared_counter.get_mut(bucket) {
            *count += 1;
        }
        self.score = self.score.saturating_add(delta);
        delta
    }

    /// Re-derives the level from the score.
    ///
    /// Returns the new fall interval when the level went up, so the owner of
    /// the fall-tick schedule can replace it.
    pub fn recompute_level(&mut self) -> Option<Duration> {
        let level = self.score / self.level_up_threshold + 1;
        if level <= self.level {
            return None;
        }
        self.level = level;
        Some(self.fall_interval())
    }

    /// Returns the fall-tick interval for the current level.
    #[must_use]
    pub fn fall_interval(&self) -> Duration {
        let steps = u32::try_from(self.level - 1).unwrap_or(u32::MAX);
        self.base_interval
            .saturating_sub(self.interval_step.saturating_mul(steps))
            .max(self.min_interval)
    }
}
