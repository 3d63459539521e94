//! Minimum-interval request throttle.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between consecutive requests.
///
/// The first call also waits one full interval, so a freshly started loop
/// never fires immediately.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep until the next request is allowed, then mark it as started.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        let now = Instant::now();
        let ready_at = match *last {
            Some(previous) => previous + self.interval,
            None => now + self.interval,
        };
        if ready_at > now {
            tokio::time::sleep_until(ready_at).await;
        }
        *last = Some(Instant::now());
    }
}
