use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Time source for the status polling loop
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio's timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that only advances when slept on; sleeping returns immediately
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every duration passed to `sleep`, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock().unwrap_or_else(|e| e.into_inner()) += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_clock_advances_on_sleep() {
        let clock = ManualClock::new();
        let before = clock.now();

        clock.sleep(Duration::from_secs(10)).await;
        clock.sleep(Duration::from_secs(5)).await;

        assert_eq!(clock.now() - before, Duration::from_secs(15));
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(10), Duration::from_secs(5)]
        );
    }
}
