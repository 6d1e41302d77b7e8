mod countdown;
mod phase;
mod runner;

pub use countdown::Countdown;
pub use phase::{ProgramPhase, ProgressSnapshot};
pub use runner::{ProgramRunner, RunnerContext};
