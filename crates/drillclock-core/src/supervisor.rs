//! Session supervisor.
//!
//! Builds the shared state, launches one runner task per program plus the
//! status view, and drives the announcement consumer loop on the calling
//! task. The loop ends only when every publisher has been dropped and the
//! queue is empty; each runner drops its publisher when it returns or
//! unwinds, so a faulted program cannot hold the session open.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::announce::{channel, Announcement, Consumed, Consumer, ExclusiveSlot, SpeechEngine};
use crate::config::{Config, Phrases};
use crate::error::{Result, RunnerError, SpeechError};
use crate::plan::{GlobalTiming, TrainingPlan};
use crate::status::{StatusRegistry, StatusSink, StatusView};
use crate::timer::{ProgramRunner, ProgressSnapshot, RunnerContext};

/// Everything a session needs, already validated.
#[derive(Debug, Clone)]
pub struct Session {
    pub plans: IndexMap<String, TrainingPlan>,
    pub timing: GlobalTiming,
    pub phrases: Phrases,
    pub refresh: Duration,
    pub poll: Duration,
}

impl Session {
    pub fn new(plans: IndexMap<String, TrainingPlan>, timing: GlobalTiming) -> Self {
        let defaults = Config::default();
        Self {
            plans,
            timing,
            phrases: defaults.phrases,
            refresh: defaults.view.refresh(),
            poll: defaults.announcer.poll(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            plans: config.plans.clone(),
            timing: config.timing(),
            phrases: config.phrases.clone(),
            refresh: config.view.refresh(),
            poll: config.announcer.poll(),
        }
    }
}

/// What happened during a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Every announcement handed to the speech engine, in playback order.
    /// The last entry is the closing line, spoken directly and never queued.
    pub spoken: Vec<Announcement>,
    pub speech_failures: usize,
    /// Programs whose runner aborted.
    pub faulted: Vec<String>,
}

/// Runs a [`Session`] against a speech engine.
pub struct Supervisor {
    session: Session,
    speech: Arc<dyn SpeechEngine>,
    #[cfg(test)]
    panic_at: Option<(String, u32)>,
}

impl Supervisor {
    pub fn new(session: Session, speech: Arc<dyn SpeechEngine>) -> Self {
        Self {
            session,
            speech,
            #[cfg(test)]
            panic_at: None,
        }
    }

    /// Run the whole session and return once the final announcement has
    /// been spoken.
    pub async fn run<S>(self, sink: S) -> Result<SessionReport>
    where
        S: StatusSink + 'static,
    {
        let started_at = Utc::now();
        #[cfg(test)]
        let panic_at = self.panic_at.clone();
        let Supervisor { session, speech, .. } = self;
        let Session {
            plans,
            timing,
            phrases,
            refresh,
            poll,
        } = session;
        let phrases = Arc::new(phrases);

        let mut registry = StatusRegistry::new();
        let mut writers = Vec::with_capacity(plans.len());
        for (name, plan) in &plans {
            writers.push(registry.register(name.clone(), ProgressSnapshot::waiting(plan.rounds))?);
        }
        let registry = Arc::new(registry);

        let (publisher, mut consumer) = channel();
        publisher.publish(Announcement::system(phrases.begins.clone()))?;

        #[allow(unused_mut)]
        let mut ctx = RunnerContext::new(timing, Arc::clone(&phrases), ExclusiveSlot::new());
        #[cfg(test)]
        {
            ctx.panic_at = panic_at;
        }
        let mut runners = Vec::with_capacity(plans.len());
        for (plan, writer) in plans.values().zip(writers) {
            let runner = ProgramRunner::new(*plan, ctx.clone(), writer, publisher.clone());
            runners.push(spawn_runner(runner));
        }
        // Only runners may keep the channel open from here on.
        drop(publisher);
        info!(programs = runners.len(), "session started");

        let view = tokio::spawn(StatusView::new(Arc::clone(&registry), refresh).run(sink));

        let mut spoken = Vec::new();
        let mut speech_failures = 0;
        consume_all(&speech, &mut consumer, poll, &mut spoken, &mut speech_failures).await;

        let mut faulted = Vec::new();
        for (program, handle) in runners {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => faulted.push(err.program().to_string()),
                Err(join_err) => {
                    let err = RunnerError::Panicked {
                        program: program.clone(),
                        message: join_err.to_string(),
                    };
                    error!(error = %err, "runner aborted");
                    faulted.push(program);
                }
            }
        }

        if let Err(join_err) = view.await {
            warn!(error = %join_err, "status view aborted");
        }

        let finished = Announcement::system(phrases.finished.clone());
        if let Err(err) = speak(&speech, &finished).await {
            warn!(error = %err, "final announcement failed");
            speech_failures += 1;
        }
        spoken.push(finished);

        info!(
            spoken = spoken.len(),
            speech_failures,
            faulted = faulted.len(),
            "session finished"
        );
        Ok(SessionReport {
            started_at,
            finished_at: Utc::now(),
            spoken,
            speech_failures,
            faulted,
        })
    }
}

/// Speak queued announcements one at a time until the channel closes.
async fn consume_all(
    speech: &Arc<dyn SpeechEngine>,
    consumer: &mut Consumer,
    poll: Duration,
    spoken: &mut Vec<Announcement>,
    speech_failures: &mut usize,
) {
    loop {
        match consumer.consume(poll).await {
            Consumed::Item(announcement) => {
                debug!(text = %announcement.spoken(), "dequeued");
                if let Err(err) = speak(speech, &announcement).await {
                    warn!(error = %err, "speech failed; continuing");
                    *speech_failures += 1;
                }
                spoken.push(announcement);
            }
            Consumed::Empty => {
                debug!(live = consumer.live_producers(), "announcement queue idle");
            }
            Consumed::Closed => break,
        }
    }
}

/// Block on the speech engine without stalling the async workers.
async fn speak(speech: &Arc<dyn SpeechEngine>, announcement: &Announcement) -> Result<(), SpeechError> {
    let speech = Arc::clone(speech);
    let text = announcement.spoken();
    tokio::task::spawn_blocking(move || speech.speak(&text))
        .await
        .map_err(|err| SpeechError::Aborted(err.to_string()))?
}

/// Spawn a runner, logging a fault at its own boundary.
fn spawn_runner(runner: ProgramRunner) -> (String, JoinHandle<Result<(), RunnerError>>) {
    let program = runner.program().to_string();
    let handle = tokio::spawn(async move {
        let result = runner.run().await;
        if let Err(err) = &result {
            error!(error = %err, "runner aborted");
        }
        result
    });
    (program, handle)
}
