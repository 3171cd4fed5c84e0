//! Timer abstraction for fall ticks and lock delays.
//!
//! The session never reads a clock. It asks a [`Scheduler`] for one-shot and
//! periodic timers and is told, through
//! [`GameSession::handle_timer`](crate::GameSession::handle_timer), when one
//! of them fires. Two implementations are provided:
//!
//! - [`ManualScheduler`] - a virtual clock advanced explicitly, for tests and
//!   headless simulation
//! - [`WallClockScheduler`] - backed by [`Instant`], for interactive front ends

use std::time::{Duration, Instant};

/// Handle of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Source of one-shot and periodic timers.
pub trait Scheduler {
    /// Schedules a timer that fires once, `delay` from now.
    fn schedule_after(&mut self, delay: Duration) -> TimerId;

    /// Schedules a timer that fires every `interval`, first `interval` from now.
    fn schedule_every(&mut self, interval: Duration) -> TimerId;

    /// Cancels a timer. Cancelling an unknown or already fired timer is a no-op.
    fn cancel(&mut self, id: TimerId);
}

/// Smallest period of a repeating timer.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy)]
struct Timer {
    id: TimerId,
    deadline: Duration,
    period: Option<Duration>,
}

/// Pending timers keyed by deadline, measured from an arbitrary epoch.
#[derive(Debug, Clone, Default)]
struct TimerQueue {
    next_id: u64,
    timers: Vec<Timer>,
}

impl TimerQueue {
    fn insert(&mut self, deadline: Duration, period: Option<Duration>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            deadline,
            period: period.map(|p| p.max(MIN_PERIOD)),
        });
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.timers.iter().map(|t| t.deadline).min()
    }

    /// Removes (or re-arms, if periodic) the earliest timer due at `now`.
    ///
    /// Timers with equal deadlines fire in creation order.
    fn pop_due(&mut self, now: Duration) -> Option<(TimerId, Duration)> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(_, t)| (t.deadline, t.id))
            .map(|(i, _)| i)?;
        let Timer {
            id,
            deadline,
            period,
        } = self.timers[index];
        match period {
            Some(period) => self.timers[index].deadline += period,
            None => {
                self.timers.swap_remove(index);
            }
        }
        Some((id, deadline))
    }
}

/// Deterministic scheduler driven by an explicit virtual clock.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use blockfall_engine::{ManualScheduler, Scheduler as _};
///
/// let mut scheduler = ManualScheduler::new();
/// let tick = scheduler.schedule_every(Duration::from_millis(100));
///
/// let target = Duration::from_millis(250);
/// assert_eq!(scheduler.pop_due_until(target), Some(tick));
/// assert_eq!(scheduler.pop_due_until(target), Some(tick));
/// assert_eq!(scheduler.pop_due_until(target), None);
/// assert_eq!(scheduler.now(), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    now: Duration,
    queue: TimerQueue,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.timers.len()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }

    /// Fires the earliest timer due at or before `target`, moving the clock
    /// to its deadline.
    ///
    /// Call repeatedly until it returns `None`, then [`Self::advance_to`]
    /// `target`. Timers scheduled in between are measured from the deadline
    /// of the timer that just fired.
    pub fn pop_due_until(&mut self, target: Duration) -> Option<TimerId> {
        let (id, deadline) = self.queue.pop_due(target)?;
        self.now = self.now.max(deadline);
        Some(id)
    }

    /// Moves the clock forward to `target` without firing anything.
    pub fn advance_to(&mut self, target: Duration) {
        self.now = self.now.max(target);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&mut self, delay: Duration) -> TimerId {
        self.queue.insert(self.now + delay, None)
    }

    fn schedule_every(&mut self, interval: Duration) -> TimerId {
        let interval = interval.max(MIN_PERIOD);
        self.queue.insert(self.now + interval, Some(interval))
    }

    fn cancel(&mut self, id: TimerId) {
        self.queue.cancel(id);
    }
}

/// Scheduler measuring deadlines against the system's monotonic clock.
///
/// A front end loop sleeps for [`Self::time_until_next`] (or until input
/// arrives) and then drains [`Self::pop_due`].
#[derive(Debug, Clone)]
pub struct WallClockScheduler {
    epoch: Instant,
    queue: TimerQueue,
}

impl Default for WallClockScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClockScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            queue: TimerQueue::default(),
        }
    }

    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Fires the earliest timer whose deadline has passed.
    pub fn pop_due(&mut self) -> Option<TimerId> {
        let now = self.now();
        self.queue.pop_due(now).map(|(id, _)| id)
    }

    /// Time left until the next deadline, or `None` when nothing is armed.
    #[must_use]
    pub fn time_until_next(&self) -> Option<Duration> {
        let deadline = self.queue.next_deadline()?;
        Some(deadline.saturating_sub(self.now()))
    }
}

impl Scheduler for WallClockScheduler {
    fn schedule_after(&mut self, delay: Duration) -> TimerId {
        let deadline = self.now() + delay;
        self.queue.insert(deadline, None)
    }

    fn schedule_every(&mut self, interval: Duration) -> TimerId {
        let interval = interval.max(MIN_PERIOD);
        let deadline = self.now() + interval;
        self.queue.insert(deadline, Some(interval))
    }

    fn cancel(&mut self, id: TimerId) {
        self.queue.cancel(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut scheduler = ManualScheduler::new();
        let late = scheduler.schedule_after(ms(300));
        let early = scheduler.schedule_after(ms(100));

        assert_eq!(scheduler.pop_due_until(ms(1000)), Some(early));
        assert_eq!(scheduler.now(), ms(100));
        assert_eq!(scheduler.pop_due_until(ms(1000)), Some(late));
        assert_eq!(scheduler.pop_due_until(ms(1000)), None);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_ties_fire_in_creation_order() {
        let mut scheduler = ManualScheduler::new();
        let first = scheduler.schedule_after(ms(100));
        let second = scheduler.schedule_every(ms(100));

        assert_eq!(scheduler.pop_due_until(ms(100)), Some(first));
        assert_eq!(scheduler.pop_due_until(ms(100)), Some(second));
        assert_eq!(scheduler.pop_due_until(ms(100)), None);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut scheduler = ManualScheduler::new();
        let id = scheduler.schedule_after(ms(50));
        scheduler.cancel(id);
        scheduler.cancel(id);

        assert_eq!(scheduler.pop_due_until(ms(100)), None);
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_timer_scheduled_after_fire_uses_fire_time() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule_after(ms(100));
        scheduler.pop_due_until(ms(1000));

        let follow_up = scheduler.schedule_after(ms(50));
        assert_eq!(scheduler.next_deadline(), Some(ms(150)));
        assert_eq!(scheduler.pop_due_until(ms(1000)), Some(follow_up));

        scheduler.advance_to(ms(1000));
        assert_eq!(scheduler.now(), ms(1000));
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let mut scheduler = ManualScheduler::new();
        let id = scheduler.schedule_every(Duration::ZERO);
        let mut fired = 0;
        while scheduler.pop_due_until(ms(5)) == Some(id) {
            fired += 1;
        }
        assert_eq!(fired, 5);
    }

    #[test]
    fn test_wall_clock_fires_elapsed_timers() {
        let mut scheduler = WallClockScheduler::new();
        let now = scheduler.schedule_after(Duration::ZERO);
        let later = scheduler.schedule_after(Duration::from_secs(3600));

        assert_eq!(scheduler.pop_due(), Some(now));
        assert_eq!(scheduler.pop_due(), None);
        assert!(scheduler.time_until_next().is_some_and(|d| d > ms(1000)));

        scheduler.cancel(later);
        assert_eq!(scheduler.time_until_next(), None);
    }
}
