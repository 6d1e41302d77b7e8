//! Program progress registry.
//!
//! Each program gets exactly one [`StatusWriter`], handed to its runner.
//! Writers replace the whole snapshot at once, so readers never observe a
//! half-updated entry. The registry itself is immutable once the session
//! starts and can be shared freely between readers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::warn;

use crate::error::{CoreError, Result};
use crate::timer::{ProgramPhase, ProgressSnapshot};

/// One line of the status table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRow {
    pub name: String,
    pub phase: ProgramPhase,
    pub phase_label: String,
    pub elapsed: u64,
    pub total: u64,
    pub remaining: u64,
    pub rounds_remaining: u32,
}

impl StatusRow {
    fn new(name: &str, snap: &ProgressSnapshot) -> Self {
        Self {
            name: name.to_string(),
            phase: snap.phase,
            phase_label: snap.phase.label().to_string(),
            elapsed: snap.elapsed,
            total: snap.total,
            remaining: snap.remaining(),
            rounds_remaining: snap.rounds_remaining,
        }
    }
}

/// Read side: program name to latest snapshot, in registration order.
#[derive(Debug, Default)]
pub struct StatusRegistry {
    entries: IndexMap<String, watch::Receiver<ProgressSnapshot>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a program and return the only writer for it.
    pub fn register(
        &mut self,
        program: impl Into<String>,
        initial: ProgressSnapshot,
    ) -> Result<StatusWriter> {
        let program = program.into();
        if self.entries.contains_key(&program) {
            return Err(CoreError::Custom(format!(
                "program '{program}' is already registered"
            )));
        }
        let (tx, rx) = watch::channel(initial);
        self.entries.insert(program.clone(), rx);
        Ok(StatusWriter { program, tx })
    }

    pub fn get(&self, program: &str) -> Option<ProgressSnapshot> {
        self.entries.get(program).map(|rx| *rx.borrow())
    }

    /// Every program's current row, in registration order.
    pub fn rows(&self) -> Vec<StatusRow> {
        self.entries
            .iter()
            .map(|(name, rx)| StatusRow::new(name, &rx.borrow()))
            .collect()
    }

    /// True once every program has completed or faulted.
    pub fn all_terminal(&self) -> bool {
        self.entries
            .values()
            .all(|rx| rx.borrow().phase.is_terminal())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write side for a single program.
///
/// Dropping a writer whose snapshot is not terminal marks the program
/// `Faulted`, so an aborted runner never looks like it is still running.
#[derive(Debug)]
pub struct StatusWriter {
    program: String,
    tx: watch::Sender<ProgressSnapshot>,
}

impl StatusWriter {
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Replace the snapshot.
    pub fn publish(&self, snapshot: ProgressSnapshot) {
        self.tx.send_replace(snapshot);
    }

    pub fn current(&self) -> ProgressSnapshot {
        *self.tx.borrow()
    }
}

impl Drop for StatusWriter {
    fn drop(&mut self) {
        let last = self.current();
        if !last.phase.is_terminal() {
            warn!(program = %self.program, phase = %last.phase, "status writer dropped mid-run");
            self.tx.send_replace(last.faulted());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_registration_order() {
        let mut registry = StatusRegistry::new();
        let _b = registry.register("bravo", ProgressSnapshot::waiting(2)).unwrap();
        let _a = registry.register("alpha", ProgressSnapshot::waiting(5)).unwrap();

        let rows = registry.rows();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["bravo", "alpha"]);
        assert_eq!(rows[1].rounds_remaining, 5);
        assert_eq!(rows[0].phase_label, "waiting");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = StatusRegistry::new();
        let _w = registry.register("alpha", ProgressSnapshot::waiting(1)).unwrap();
        assert!(registry.register("alpha", ProgressSnapshot::waiting(1)).is_err());
    }

    #[test]
    fn publish_replaces_whole_snapshot() {
        let mut registry = StatusRegistry::new();
        let writer = registry.register("alpha", ProgressSnapshot::waiting(3)).unwrap();

        let snap = ProgressSnapshot::timed(ProgramPhase::RoundHold, 10, 3).with_elapsed(4);
        writer.publish(snap);
        assert_eq!(registry.get("alpha"), Some(snap));

        let row = &registry.rows()[0];
        assert_eq!((row.elapsed, row.total, row.remaining), (4, 10, 6));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn dropping_unfinished_writer_marks_faulted() {
        let mut registry = StatusRegistry::new();
        let writer = registry.register("alpha", ProgressSnapshot::waiting(3)).unwrap();
        writer.publish(ProgressSnapshot::timed(ProgramPhase::Preparing, 5, 3));
        assert!(!registry.all_terminal());

        drop(writer);
        let snap = registry.get("alpha").unwrap();
        assert_eq!(snap.phase, ProgramPhase::Faulted);
        assert_eq!(snap.rounds_remaining, 3);
        assert!(registry.all_terminal());
    }

    #[test]
    fn dropping_completed_writer_keeps_completed() {
        let mut registry = StatusRegistry::new();
        let writer = registry.register("alpha", ProgressSnapshot::waiting(1)).unwrap();
        writer.publish(ProgressSnapshot::completed());
        drop(writer);
        assert_eq!(registry.get("alpha"), Some(ProgressSnapshot::completed()));
    }
}
