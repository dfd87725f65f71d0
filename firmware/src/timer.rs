//! One-shot report timer.

use core::time::Duration;

use crate::config::REPORT_PERIOD;

/// A single one-shot alarm. Firing disarms it; it must be rearmed
/// explicitly, so at most one alarm is ever pending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportTimer {
    period_ms: u64,
    /// Deadline in milliseconds, `None` when disarmed.
    deadline: Option<u64>,
}

impl Default for ReportTimer {
    fn default() -> Self {
        Self::new(REPORT_PERIOD)
    }
}

impl ReportTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period_ms: u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            deadline: None,
        }
    }

    /// Arm the alarm one period after `now_ms`. Ignored while already armed.
    pub fn arm(&mut self, now_ms: u64) {
        if self.deadline.is_none() {
            self.deadline = Some(now_ms.saturating_add(self.period_ms));
        }
    }

    /// Returns true exactly once when the deadline has passed.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once() {
        let mut timer = ReportTimer::new(Duration::from_millis(10));
        assert!(!timer.fire(100));

        timer.arm(0);
        assert!(!timer.fire(9));
        assert!(timer.fire(10));
        assert!(!timer.fire(11));
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_no_overlapping_alarms() {
        let mut timer = ReportTimer::new(Duration::from_millis(10));
        timer.arm(0);
        timer.arm(5);
        assert_eq!(timer.deadline(), Some(10));
    }

    #[test]
    fn test_late_poll() {
        let mut timer = ReportTimer::default();
        timer.arm(0);
        assert!(timer.fire(3500));
        timer.arm(3500);
        assert_eq!(timer.deadline(), Some(4500));
    }

    #[test]
    fn test_oversized_period_saturates() {
        let mut timer = ReportTimer::new(Duration::MAX);
        timer.arm(1);
        assert_eq!(timer.deadline(), Some(u64::MAX));
        assert!(!timer.fire(u64::MAX - 1));
    }
}
