use chrono::{DateTime, Duration, Utc};

/// "Time since last run" guard for a periodic check
#[derive(Debug, Clone)]
pub struct PeriodicTimer {
    interval: Duration,
    last: Option<DateTime<Utc>>,
    /// The first call only arms the timer
    warmup: bool,
}

impl PeriodicTimer {
    pub fn new(interval_secs: u32) -> Self {
        Self {
            interval: Duration::seconds(i64::from(interval_secs)),
            last: None,
            warmup: false,
        }
    }

    /// Timer whose first due moment only arms it
    pub fn with_warmup(interval_secs: u32) -> Self {
        Self {
            warmup: true,
            ..Self::new(interval_secs)
        }
    }

    /// Whether the check should run now; marks the run when it should
    pub fn fire(&mut self, now: DateTime<Utc>) -> bool {
        match self.last {
            None => {
                self.last = Some(now);
                !self.warmup
            }
            Some(last) if now > last + self.interval => {
                self.last = Some(now);
                true
            }
            Some(_) => false,
        }
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_interval() {
        let start = Utc::now();
        let mut timer = PeriodicTimer::new(30);
        assert!(timer.fire(start));
        assert!(!timer.fire(start + Duration::seconds(30)));
        assert!(timer.fire(start + Duration::seconds(31)));
        assert!(!timer.fire(start + Duration::seconds(40)));
    }

    #[test]
    fn test_warmup_skips_first_run() {
        let start = Utc::now();
        let mut timer = PeriodicTimer::with_warmup(35);
        assert!(!timer.fire(start));
        assert_eq!(timer.last_run(), Some(start));
        assert!(timer.fire(start + Duration::seconds(36)));
    }
}
