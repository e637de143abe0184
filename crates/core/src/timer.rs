//! Restartable elapsed-time tracker.

use std::time::Duration;
use tokio::time::Instant;

/// Measures time since a baseline that can be moved to "now".
///
/// Built on the tokio clock so paused-time tests control it.
#[derive(Debug, Clone, Copy)]
pub struct ElapsedTimer {
    baseline: Instant,
}

impl ElapsedTimer {
    /// Start measuring from now.
    pub fn new() -> Self {
        Self {
            baseline: Instant::now(),
        }
    }

    /// Rebind the baseline to now.
    pub fn reset(&mut self) {
        self.baseline = Instant::now();
    }

    /// Time since the baseline.
    pub fn get(&self) -> Duration {
        Instant::now().saturating_duration_since(self.baseline)
    }

    /// Milliseconds since the baseline.
    pub fn get_ms(&self) -> u64 {
        u64::try_from(self.get().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for ElapsedTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_measures_elapsed() {
        let timer = ElapsedTimer::new();
        assert_eq!(timer.get_ms(), 0);

        tokio::time::advance(Duration::from_millis(120)).await;
        assert_eq!(timer.get_ms(), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_moves_baseline() {
        let mut timer = ElapsedTimer::new();
        tokio::time::advance(Duration::from_millis(500)).await;

        timer.reset();
        assert_eq!(timer.get(), Duration::ZERO);

        tokio::time::advance(Duration::from_millis(30)).await;
        assert_eq!(timer.get_ms(), 30);
    }
}
