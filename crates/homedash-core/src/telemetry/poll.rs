//! When to fetch the status page again in HTTP poll mode.

pub const DEFAULT_POLL_PERIOD_MS: u64 = 15 * 60 * 1_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollSchedule {
    period_ms: u64,
    last_poll_ms: Option<u64>,
    forced: bool,
}

impl PollSchedule {
    pub const fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            last_poll_ms: None,
            forced: false,
        }
    }

    /// Requests a poll at the next opportunity regardless of the period.
    pub fn force(&mut self) {
        self.forced = true;
    }

    /// First call is always due, then every `period_ms`, or right after
    /// [`force`](Self::force).
    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_poll_ms {
            None => true,
            Some(_) if self.forced => true,
            Some(last) => now_ms.saturating_sub(last) > self.period_ms,
        }
    }

    pub fn mark_polled(&mut self, now_ms: u64) {
        self.last_poll_ms = Some(now_ms);
        self.forced = false;
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_PERIOD_MS)
    }
}
