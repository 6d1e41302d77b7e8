//! Second-granular timed waits.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Suspends the calling task for whole seconds, reporting each one.
///
/// Ticks are scheduled against the instant the countdown started, so a
/// late wake-up shortens the next wait instead of pushing every later tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Countdown;

impl Countdown {
    /// Wait `seconds` seconds, calling `on_progress(elapsed, total)` after
    /// each completed second with `elapsed` running `1..=seconds`.
    ///
    /// `seconds == 0` returns immediately without calling `on_progress`.
    pub async fn tick<F>(seconds: u64, mut on_progress: F)
    where
        F: FnMut(u64, u64),
    {
        let started = Instant::now();
        for elapsed in 1..=seconds {
            sleep_until(started + Duration::from_secs(elapsed)).await;
            on_progress(elapsed, seconds);
        }
    }
}
