use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Interval growth for status polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Delay after the first non-terminal status.
    pub initial: Duration,
    /// Upper bound on any single delay.
    pub max: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(1000),
            max: Duration::from_millis(60_000),
        }
    }
}

impl PollSchedule {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max }
    }

    /// Delay before poll `attempt + 1`, where `attempt` starts at 1.
    /// delay = min(initial * 2^(attempt - 1), max)
    pub fn interval_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(factor)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

/// Everything that shapes a single poll loop.
///
/// With no deadline and no cancellation token the loop runs until the job
/// reaches a terminal status.
#[derive(Debug, Clone, Default)]
pub struct PollOptions {
    pub schedule: PollSchedule,
    pub deadline: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl PollOptions {
    pub fn new(schedule: PollSchedule) -> Self {
        Self {
            schedule,
            ..Default::default()
        }
    }

    /// Gives up with [`JobError::PollDeadlineExceeded`](crate::JobError::PollDeadlineExceeded)
    /// once `deadline` has elapsed since the first poll.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_double_until_capped() {
        let schedule = PollSchedule::new(Duration::from_millis(1000), Duration::from_millis(5000));
        assert_eq!(schedule.interval_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(schedule.interval_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(schedule.interval_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(schedule.interval_for_attempt(4), Duration::from_millis(5000));
        assert_eq!(schedule.interval_for_attempt(40), Duration::from_millis(5000));
    }

    #[test]
    fn default_schedule_matches_service_guidance() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.initial, Duration::from_secs(1));
        assert_eq!(schedule.max, Duration::from_secs(60));
    }

    #[test]
    fn max_below_initial_caps_first_interval() {
        let schedule = PollSchedule::new(Duration::from_secs(10), Duration::from_secs(3));
        assert_eq!(schedule.interval_for_attempt(1), Duration::from_secs(3));
    }

    #[test]
    fn default_options_are_unbounded() {
        let options = PollOptions::default();
        assert!(options.deadline.is_none());
        assert!(options.cancel.is_none());
    }
}
