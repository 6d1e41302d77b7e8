use serde::{Deserialize, Serialize};

/// One training program: `rounds` cycles of ready, hold and rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub rounds: u32,
    /// Hold duration in seconds.
    #[serde(default)]
    pub hold_time: u64,
    /// Rest duration in seconds.
    #[serde(default)]
    pub rest_time: u64,
}

/// Timing shared by every program in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlobalTiming {
    /// Preparation before the first round, in seconds.
    #[serde(default)]
    pub prepare_time: u64,
    /// Pause between the "ready" and "start" prompts, in seconds.
    #[serde(default)]
    pub ready_time: u64,
}

impl TrainingPlan {
    pub fn new(rounds: u32, hold_time: u64, rest_time: u64) -> Self {
        Self {
            rounds,
            hold_time,
            rest_time,
        }
    }

    /// Seconds spent in one ready/hold/rest cycle.
    ///
    /// Uses saturating arithmetic so absurd configs cannot overflow.
    pub fn round_secs(&self, timing: &GlobalTiming) -> u64 {
        timing
            .ready_time
            .saturating_add(self.hold_time)
            .saturating_add(self.rest_time)
    }

    /// Expected wall-clock length of the program, ignoring slot contention.
    pub fn estimated_secs(&self, timing: &GlobalTiming) -> u64 {
        timing
            .prepare_time
            .saturating_add(self.round_secs(timing).saturating_mul(u64::from(self.rounds)))
    }
}
