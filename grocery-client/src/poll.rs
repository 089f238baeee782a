//! 状态轮询
//!
//! Bounded status polling shared by the order and restock workflows. The
//! service is asked immediately, then once per interval, until a terminal
//! status shows up, the attempt cap is reached or the caller cancels.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::ClientConfig;

/// How a status string reported by the service is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Completed,
    Failed,
    Cancelled,
    /// Anything else, including unknown values
    Pending,
}

impl StatusClass {
    pub fn is_terminal(self) -> bool {
        !matches!(self, StatusClass::Pending)
    }
}

/// Classify a polled status.
///
/// Completion is exact equality with `COMPLETED`; failure is any status
/// containing `FAILED`. So `PAYMENT_FAILED` fails while `COMPLETED_LATE`
/// keeps polling.
pub fn classify_status(status: &str) -> StatusClass {
    if status == "COMPLETED" {
        StatusClass::Completed
    } else if status.contains("FAILED") {
        StatusClass::Failed
    } else if status == "CANCELLED" {
        StatusClass::Cancelled
    } else {
        StatusClass::Pending
    }
}

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// A terminal status was observed
    Terminal(T),
    /// Attempt cap reached without a terminal status. The workflow stays in
    /// progress and may be polled again.
    TimedOut { attempts: u32 },
    /// Caller gave up (e.g. Ctrl-C)
    Cancelled { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn terminal(self) -> Option<T> {
        match self {
            PollOutcome::Terminal(value) => Some(value),
            _ => None,
        }
    }
}

/// Attempt counter plus inter-poll delay
#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl PollSchedule {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
            attempts: 0,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.poll_interval, config.max_poll_attempts)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Claim the next attempt (1-based), `None` once the cap is reached
    pub fn next_attempt(&mut self) -> Option<u32> {
        if self.is_exhausted() {
            return None;
        }
        self.attempts += 1;
        Some(self.attempts)
    }

    /// Sleep one interval. Returns `false` if `cancel` fired first.
    pub async fn wait(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.interval) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_asymmetry() {
        assert_eq!(classify_status("COMPLETED"), StatusClass::Completed);
        assert_eq!(classify_status("COMPLETED_LATE"), StatusClass::Pending);
        assert_eq!(classify_status("PAYMENT_FAILED"), StatusClass::Failed);
        assert_eq!(classify_status("FAILED_DISPATCH"), StatusClass::Failed);
        assert_eq!(classify_status("CANCELLED"), StatusClass::Cancelled);
        assert_eq!(classify_status("PROCESSING"), StatusClass::Pending);
        assert_eq!(classify_status("completed"), StatusClass::Pending);
        assert_eq!(classify_status(""), StatusClass::Pending);
    }

    #[test]
    fn test_schedule_caps_attempts() {
        let mut schedule = PollSchedule::new(Duration::from_secs(2), 3);
        assert_eq!(schedule.next_attempt(), Some(1));
        assert_eq!(schedule.next_attempt(), Some(2));
        assert_eq!(schedule.next_attempt(), Some(3));
        assert!(schedule.is_exhausted());
        assert_eq!(schedule.next_attempt(), None);
        assert_eq!(schedule.attempts(), 3);
    }

    #[test]
    fn test_zero_cap_still_polls_once() {
        let mut schedule = PollSchedule::new(Duration::ZERO, 0);
        assert_eq!(schedule.next_attempt(), Some(1));
        assert_eq!(schedule.next_attempt(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_one_interval() {
        let schedule = PollSchedule::new(Duration::from_secs(2), 5);
        let start = tokio::time::Instant::now();
        assert!(schedule.wait(&CancellationToken::new()).await);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_early_on_cancel() {
        let schedule = PollSchedule::new(Duration::from_secs(60), 5);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let start = tokio::time::Instant::now();
        assert!(!schedule.wait(&cancel).await);
        assert!(start.elapsed() < Duration::from_secs(60));
    }
}
