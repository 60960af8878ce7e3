use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Spaces outbound requests so that at most `n` are issued per second, no
/// matter how many tasks share the gate. The first tick is immediate.
pub struct RateGate {
    ticker: Mutex<Interval>,
}

impl RateGate {
    /// Must be called from within a Tokio runtime.
    pub fn per_second(requests: u32) -> Self {
        let period = Duration::from_secs(1) / requests.max(1);
        let mut ticker = interval(period);
        // Idle periods must not bank ticks for a later burst.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            ticker: Mutex::new(ticker),
        }
    }

    pub async fn acquire(&self) {
        self.ticker.lock().await.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::task::JoinSet;
    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn spaces_acquisitions() {
        let gate = RateGate::per_second(5);
        let start = Instant::now();
        for _ in 0..3 {
            gate.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(400));
        assert!(start.elapsed() < Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn shared_across_tasks() {
        let gate = Arc::new(RateGate::per_second(10));
        let start = Instant::now();
        let mut tasks = JoinSet::new();
        for _ in 0..5 {
            let gate = Arc::clone(&gate);
            tasks.spawn(async move {
                gate.acquire().await;
                Instant::now()
            });
        }

        let mut issued = Vec::new();
        while let Some(at) = tasks.join_next().await {
            issued.push(at.unwrap());
        }
        issued.sort();

        assert!(issued[4] - start >= Duration::from_millis(400));
        for pair in issued.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_does_not_allow_bursts() {
        let gate = RateGate::per_second(5);
        gate.acquire().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let start = Instant::now();
        gate.acquire().await;
        gate.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
