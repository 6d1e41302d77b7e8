//! # drillclock Core Library
//!
//! This library runs several timed training programs side by side and voices
//! their prompts through a single audio output. The `drillclock` CLI is a thin
//! layer over it that supplies the config file, a terminal table and a speech
//! command.
//!
//! ## Architecture
//!
//! - **Program runners**: one task per program, stepping through
//!   prepare and then `rounds` cycles of ready, hold and rest
//! - **Announcements**: a many-producer queue drained by one consumer that
//!   speaks each line to completion before taking the next
//! - **Exclusive slot**: keeps each round's "ready ... start" pair contiguous
//!   across programs
//! - **Status**: single-writer snapshots per program, polled by a view
//!
//! ## Key Components
//!
//! - [`Supervisor`]: launches a [`Session`] and decides when it is over
//! - [`ProgramRunner`]: per-program state machine
//! - [`StatusRegistry`]: progress snapshots read by [`StatusView`]
//! - [`Config`]: TOML/JSON session configuration

pub mod announce;
pub mod config;
pub mod duration;
pub mod error;
pub mod plan;
pub mod status;
pub mod supervisor;
pub mod timer;

pub use announce::{Announcement, CommandSpeech, ExclusiveSlot, SilentSpeech, SpeechEngine};
pub use config::Config;
pub use error::{AnnounceError, ConfigError, CoreError, RunnerError, SpeechError};
pub use plan::{GlobalTiming, TrainingPlan};
pub use status::{StatusRegistry, StatusRow, StatusSink, StatusView};
pub use supervisor::{Session, SessionReport, Supervisor};
pub use timer::{Countdown, ProgramPhase, ProgramRunner, ProgressSnapshot};
