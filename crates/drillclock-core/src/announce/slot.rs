//! The exclusive slot held from a round's "ready" prompt through its "start"
//! prompt, so two programs never interleave those announcements.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::debug;

/// Binary mutual exclusion shared by every program runner.
#[derive(Debug, Clone, Default)]
pub struct ExclusiveSlot {
    inner: Arc<Mutex<()>>,
}

/// Proof of holding the slot. Dropping it releases the slot, on every exit
/// path including unwinding.
#[derive(Debug)]
pub struct SlotGuard {
    _guard: OwnedMutexGuard<()>,
    holder: String,
    acquired_at: Instant,
}

impl ExclusiveSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the slot is free and take it.
    pub async fn acquire(&self, holder: &str) -> SlotGuard {
        let requested = Instant::now();
        let guard = Arc::clone(&self.inner).lock_owned().await;
        let acquired_at = Instant::now();
        debug!(
            holder,
            waited_ms = (acquired_at - requested).as_millis() as u64,
            "slot acquired"
        );
        SlotGuard {
            _guard: guard,
            holder: holder.to_string(),
            acquired_at,
        }
    }

    /// Take the slot only if nobody holds it.
    pub fn try_acquire(&self, holder: &str) -> Option<SlotGuard> {
        let guard = Arc::clone(&self.inner).try_lock_owned().ok()?;
        Some(SlotGuard {
            _guard: guard,
            holder: holder.to_string(),
            acquired_at: Instant::now(),
        })
    }
}

impl SlotGuard {
    pub fn holder(&self) -> &str {
        &self.holder
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        debug!(
            holder = %self.holder,
            held_ms = self.acquired_at.elapsed().as_millis() as u64,
            "slot released"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn holders_never_overlap() {
        let slot = ExclusiveSlot::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let slot = slot.clone();
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            handles.push(tokio::spawn(async move {
                for _ in 0..5 {
                    let _guard = slot.acquire(&format!("p{i}")).await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recorded_intervals_are_disjoint() {
        let slot = ExclusiveSlot::new();
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for name in ["a", "b", "c"] {
            let slot = slot.clone();
            let log = Arc::clone(&log);
            handles.push(tokio::spawn(async move {
                let guard = slot.acquire(name).await;
                let start = Instant::now();
                tokio::time::sleep(Duration::from_secs(1)).await;
                let end = Instant::now();
                drop(guard);
                log.lock().unwrap().push((start, end));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut intervals = log.lock().unwrap().clone();
        intervals.sort();
        assert_eq!(intervals.len(), 3);
        for pair in intervals.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "overlap: {pair:?}");
        }
    }

    #[tokio::test]
    async fn released_when_holder_panics() {
        let slot = ExclusiveSlot::new();
        let held = slot.clone();
        let result = tokio::spawn(async move {
            let _guard = held.acquire("doomed").await;
            panic!("runner fault");
        })
        .await;
        assert!(result.unwrap_err().is_panic());

        let guard = slot.try_acquire("next").expect("slot must be free");
        assert_eq!(guard.holder(), "next");
    }

    #[tokio::test]
    async fn try_acquire_fails_while_held() {
        let slot = ExclusiveSlot::new();
        let _guard = slot.acquire("a").await;
        assert!(slot.try_acquire("b").is_none());
    }
}
