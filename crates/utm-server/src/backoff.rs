//! Exponential backoff with jitter for the ingestion loop.
//!
//! Keeps an unreachable feed from being polled in a tight loop while still retrying
//! sooner than the regular refresh interval.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
    jitter_ratio: f64,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let base = base.max(Duration::from_millis(1));
        let max = max.max(base);
        Self {
            base,
            max,
            current: base,
            jitter_ratio: 0.2,
        }
    }

    pub fn reset(&mut self) {
        self.current = self.base;
    }

    /// Delay before the next attempt after a failure. Doubles up to `max`, plus jitter.
    pub fn fail(&mut self) -> Duration {
        let delay = add_jitter(self.current, self.jitter_ratio);
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }
}

fn add_jitter(delay: Duration, ratio: f64) -> Duration {
    if !(0.0..=1.0).contains(&ratio) {
        return delay;
    }

    let jitter_ms_max = ((delay.as_millis() as f64) * ratio) as u128;
    if jitter_ms_max == 0 {
        return delay;
    }

    let now_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    let jitter_ms = (now_nanos as u128) % (jitter_ms_max + 1);
    delay + Duration::from_millis(jitter_ms as u64)
}
