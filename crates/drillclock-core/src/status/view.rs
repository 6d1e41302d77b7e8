use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::registry::{StatusRegistry, StatusRow};

/// Receives the full, ordered status table on every refresh.
///
/// Called repeatedly; must cope with unchanged rows between calls.
pub trait StatusSink: Send {
    fn render(&mut self, rows: &[StatusRow]);
}

/// Periodically forwards the registry to a [`StatusSink`].
#[derive(Debug, Clone)]
pub struct StatusView {
    registry: Arc<StatusRegistry>,
    refresh: Duration,
}

impl StatusView {
    pub fn new(registry: Arc<StatusRegistry>, refresh: Duration) -> Self {
        Self { registry, refresh }
    }

    /// Render until every program is terminal, then render once more and
    /// hand the sink back.
    pub async fn run<S: StatusSink>(self, mut sink: S) -> S {
        let mut ticker = interval(self.refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut renders = 0u64;
        loop {
            ticker.tick().await;
            // Check before reading rows so the last render already shows
            // every program in its terminal state.
            let done = self.registry.all_terminal();
            sink.render(&self.registry.rows());
            renders += 1;
            if done {
                break;
            }
        }
        debug!(renders, "status view finished");
        sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{ProgramPhase, ProgressSnapshot};

    #[derive(Default)]
    struct Capture(Vec<Vec<StatusRow>>);

    impl StatusSink for Capture {
        fn render(&mut self, rows: &[StatusRow]) {
            self.0.push(rows.to_vec());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_everything_is_terminal() {
        let mut registry = StatusRegistry::new();
        let a = registry.register("a", ProgressSnapshot::waiting(1)).unwrap();
        let b = registry.register("b", ProgressSnapshot::waiting(1)).unwrap();
        let registry = Arc::new(registry);

        let view = StatusView::new(Arc::clone(&registry), Duration::from_millis(500));
        let handle = tokio::spawn(view.run(Capture::default()));

        tokio::time::sleep(Duration::from_millis(1200)).await;
        a.publish(ProgressSnapshot::completed());
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(!handle.is_finished());
        drop(b);

        let capture = handle.await.unwrap();
        let last = capture.0.last().unwrap();
        assert_eq!(last[0].phase, ProgramPhase::Completed);
        assert_eq!(last[1].phase, ProgramPhase::Faulted);
        assert!(capture.0.len() >= 5);
        assert!(capture.0[..capture.0.len() - 1]
            .iter()
            .all(|rows| rows[1].phase == ProgramPhase::Waiting));
    }

    #[tokio::test(start_paused = true)]
    async fn renders_once_when_already_done() {
        let mut registry = StatusRegistry::new();
        let w = registry.register("a", ProgressSnapshot::waiting(0)).unwrap();
        w.publish(ProgressSnapshot::completed());
        let view = StatusView::new(Arc::new(registry), Duration::from_millis(500));
        let capture = view.run(Capture::default()).await;
        assert_eq!(capture.0.len(), 1);
    }
}
