use serde::{Deserialize, Serialize};

/// Where a program is in its sequence.
///
/// ```text
/// Waiting -> Preparing -> (RoundReady -> RoundHold -> RoundRest) x rounds -> Completed
/// ```
///
/// `Faulted` is entered instead of `Completed` when a runner aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramPhase {
    Waiting,
    Preparing,
    RoundReady,
    RoundHold,
    RoundRest,
    Completed,
    Faulted,
}

impl ProgramPhase {
    /// Short label for status tables.
    pub fn label(self) -> &'static str {
        match self {
            ProgramPhase::Waiting => "waiting",
            ProgramPhase::Preparing => "preparing",
            ProgramPhase::RoundReady => "ready",
            ProgramPhase::RoundHold => "hold",
            ProgramPhase::RoundRest => "rest",
            ProgramPhase::Completed => "completed",
            ProgramPhase::Faulted => "faulted",
        }
    }

    /// No further updates will follow.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProgramPhase::Completed | ProgramPhase::Faulted)
    }
}

impl std::fmt::Display for ProgramPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress of one program, always replaced as a whole.
///
/// `elapsed <= total` holds for every value built through the constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub phase: ProgramPhase,
    /// Seconds elapsed in the current phase.
    pub elapsed: u64,
    /// Length of the current phase; 0 when idle or finished.
    pub total: u64,
    pub rounds_remaining: u32,
}

impl ProgressSnapshot {
    /// Initial state before the runner starts.
    pub fn waiting(rounds: u32) -> Self {
        Self::idle(ProgramPhase::Waiting, rounds)
    }

    /// A phase without a visible timer.
    pub fn idle(phase: ProgramPhase, rounds_remaining: u32) -> Self {
        Self {
            phase,
            elapsed: 0,
            total: 0,
            rounds_remaining,
        }
    }

    /// Start of a timed phase lasting `total` seconds.
    pub fn timed(phase: ProgramPhase, total: u64, rounds_remaining: u32) -> Self {
        Self {
            phase,
            elapsed: 0,
            total,
            rounds_remaining,
        }
    }

    pub fn completed() -> Self {
        Self::idle(ProgramPhase::Completed, 0)
    }

    /// Same phase, `elapsed` advanced and clamped to `total`.
    pub fn with_elapsed(self, elapsed: u64) -> Self {
        Self {
            elapsed: elapsed.min(self.total),
            ..self
        }
    }

    /// Terminal marker for an aborted runner; keeps the last round count.
    pub fn faulted(self) -> Self {
        Self::idle(ProgramPhase::Faulted, self.rounds_remaining)
    }

    /// Seconds left in the current phase.
    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.elapsed)
    }
}
