use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::Args;
use drillclock_core::duration::format_duration;
use drillclock_core::{CommandSpeech, Config, Session, SilentSpeech, SpeechEngine, Supervisor};

use crate::output::{CaptionTarget, CaptionedSpeech, Captions, NoTable, TableRenderer};

#[derive(Args)]
pub struct RunArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    /// Show announcements without playing audio
    #[arg(long)]
    mute: bool,
    /// Do not draw the status table
    #[arg(long)]
    no_table: bool,
}

fn speech_engine(config: &Config, mute: bool, target: CaptionTarget) -> Arc<dyn SpeechEngine> {
    let command = config
        .speech
        .command
        .as_deref()
        .and_then(CommandSpeech::from_argv);
    match command {
        Some(command) if !mute => Arc::new(CaptionedSpeech::new(command, target)),
        _ => Arc::new(CaptionedSpeech::new(SilentSpeech, target)),
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(args.config.as_deref())?;
    let session = Session::from_config(&config);
    tracing::info!(
        programs = session.plans.len(),
        prepare_time = session.timing.prepare_time,
        ready_time = session.timing.ready_time,
        "config loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()?;

    let report = if args.no_table {
        let speech = speech_engine(&config, args.mute, CaptionTarget::Stdout);
        runtime.block_on(Supervisor::new(session, speech).run(NoTable))?
    } else {
        let captions = Captions::default();
        let speech = speech_engine(&config, args.mute, CaptionTarget::Table(captions.clone()));
        runtime.block_on(Supervisor::new(session, speech).run(TableRenderer::new(captions)))?
    };

    let secs = (report.finished_at - report.started_at).num_seconds().max(0) as u64;
    println!(
        "session finished at {} after {}: {} announcements, {} speech failures",
        report.finished_at.with_timezone(&Local).format("%H:%M:%S"),
        format_duration(secs),
        report.spoken.len(),
        report.speech_failures
    );

    if !report.faulted.is_empty() {
        return Err(format!("programs aborted: {}", report.faulted.join(", ")).into());
    }
    Ok(())
}
