//! Program runner.
//!
//! Drives one training program from start to finish:
//!
//! ```text
//! Waiting -> Preparing -> (RoundReady -> RoundHold -> RoundRest) x rounds -> Completed
//! ```
//!
//! The runner owns its [`StatusWriter`] and its [`Publisher`]. Both are
//! released when `run` returns or unwinds, which is how the rest of the
//! session learns that this program is finished, whether it completed or not.

use std::sync::Arc;

use tracing::{debug, info};

use super::countdown::Countdown;
use super::phase::{ProgramPhase, ProgressSnapshot};
use crate::announce::{Announcement, ExclusiveSlot, Publisher};
use crate::config::Phrases;
use crate::error::RunnerError;
use crate::plan::{GlobalTiming, TrainingPlan};
use crate::status::StatusWriter;

/// Everything runners share.
#[derive(Debug, Clone)]
pub struct RunnerContext {
    pub timing: GlobalTiming,
    pub phrases: Arc<Phrases>,
    pub slot: ExclusiveSlot,
    /// Program and round at which the runner panics while holding the slot.
    #[cfg(test)]
    pub(crate) panic_at: Option<(String, u32)>,
}

impl RunnerContext {
    pub fn new(timing: GlobalTiming, phrases: Arc<Phrases>, slot: ExclusiveSlot) -> Self {
        Self {
            timing,
            phrases,
            slot,
            #[cfg(test)]
            panic_at: None,
        }
    }
}

/// State machine for a single program.
#[derive(Debug)]
pub struct ProgramRunner {
    program: String,
    plan: TrainingPlan,
    ctx: RunnerContext,
    status: StatusWriter,
    announcer: Publisher,
}

impl ProgramRunner {
    pub fn new(
        plan: TrainingPlan,
        ctx: RunnerContext,
        status: StatusWriter,
        announcer: Publisher,
    ) -> Self {
        Self {
            program: status.program().to_string(),
            plan,
            ctx,
            status,
            announcer,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run every phase to completion.
    ///
    /// On error the runner stops immediately; dropping `self` then releases
    /// the slot (if held), marks the snapshot faulted and retires the
    /// publisher.
    pub async fn run(self) -> Result<(), RunnerError> {
        let rounds = self.plan.rounds;
        let timing = self.ctx.timing;
        info!(program = %self.program, rounds, "program started");

        self.timed(ProgramPhase::Preparing, timing.prepare_time, rounds)
            .await;

        for round in 1..=rounds {
            let rounds_remaining = rounds - round + 1;
            self.status.publish(ProgressSnapshot::idle(
                ProgramPhase::RoundReady,
                rounds_remaining,
            ));

            {
                let _slot = self.ctx.slot.acquire(&self.program).await;
                self.announce(self.ctx.phrases.ready_for(round))?;
                #[cfg(test)]
                {
                    if self.ctx.panic_at.as_ref() == Some(&(self.program.clone(), round)) {
                        panic!("{} broke down in round {round}", self.program);
                    }
                }
                Countdown::tick(timing.ready_time, |_, _| {}).await;
                self.announce(self.ctx.phrases.start.clone())?;
            }

            self.timed(ProgramPhase::RoundHold, self.plan.hold_time, rounds_remaining)
                .await;
            self.announce(self.ctx.phrases.down.clone())?;
            self.timed(ProgramPhase::RoundRest, self.plan.rest_time, rounds_remaining)
                .await;
            debug!(program = %self.program, round, "round finished");
        }

        self.announce(self.ctx.phrases.complete.clone())?;
        self.status.publish(ProgressSnapshot::completed());
        info!(program = %self.program, "program completed");
        Ok(())
    }

    async fn timed(&self, phase: ProgramPhase, seconds: u64, rounds_remaining: u32) {
        let start = ProgressSnapshot::timed(phase, seconds, rounds_remaining);
        self.status.publish(start);
        Countdown::tick(seconds, |elapsed, _| {
            self.status.publish(start.with_elapsed(elapsed));
        })
        .await;
    }

    fn announce(&self, text: String) -> Result<(), RunnerError> {
        self.announcer
            .publish(Announcement::new(self.program.clone(), text))
            .map_err(|source| RunnerError::Announce {
                program: self.program.clone(),
                source,
            })
    }
}
