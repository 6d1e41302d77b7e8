//! Integration tests for whole sessions.
//!
//! All tests run on a paused clock, so multi-second programs finish instantly
//! and their timing is deterministic.

use drillclock_core::{
    Config, GlobalTiming, ProgramPhase, Session, SpeechEngine, SpeechError, StatusRow, StatusSink,
    Supervisor, TrainingPlan,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

impl Recorder {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Lines spoken for one program, without the program prefix.
    fn program_lines(&self, program: &str) -> Vec<String> {
        let prefix = format!("{program} ");
        self.lines()
            .iter()
            .filter_map(|line| line.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

impl SpeechEngine for Recorder {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Frames(Arc<Mutex<Vec<Vec<StatusRow>>>>);

impl StatusSink for Frames {
    fn render(&mut self, rows: &[StatusRow]) {
        self.0.lock().unwrap().push(rows.to_vec());
    }
}

fn session(plans: &[(&str, TrainingPlan)], prepare_time: u64, ready_time: u64) -> Session {
    Session::new(
        plans
            .iter()
            .map(|(name, plan)| (name.to_string(), *plan))
            .collect(),
        GlobalTiming {
            prepare_time,
            ready_time,
        },
    )
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn single_program_scenario() {
    let recorder = Arc::new(Recorder::default());
    let supervisor = Supervisor::new(
        session(&[("pistol", TrainingPlan::new(2, 2, 1))], 1, 1),
        recorder.clone(),
    );

    let started = Instant::now();
    let report = supervisor.run(Frames::default()).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(
        recorder.program_lines("pistol"),
        vec![
            "round 1 ready",
            "start",
            "down",
            "round 2 ready",
            "start",
            "down",
            "all rounds complete",
        ]
    );
    assert!(elapsed >= Duration::from_secs(9), "took {elapsed:?}");
    assert!(elapsed <= Duration::from_secs(10), "took {elapsed:?}");
    assert!(report.faulted.is_empty());
}

#[tokio::test(start_paused = true)]
async fn simultaneous_bursts_never_interleave() {
    let plan = TrainingPlan::new(3, 2, 1);
    let recorder = Arc::new(Recorder::default());
    let supervisor = Supervisor::new(
        session(&[("alpha", plan), ("bravo", plan), ("charlie", plan)], 1, 1),
        recorder.clone(),
    );
    supervisor.run(Frames::default()).await.unwrap();

    let lines = recorder.lines();
    for (i, line) in lines.iter().enumerate() {
        let Some((program, text)) = line.split_once(' ') else {
            continue;
        };
        if text.starts_with("round ") && text.ends_with(" ready") {
            let burst_end = lines[i + 1..]
                .iter()
                .position(|l| l == &format!("{program} start"))
                .map(|offset| i + 1 + offset)
                .expect("every ready has a start");
            for between in &lines[i + 1..burst_end] {
                assert!(
                    !between.ends_with(" ready") && !between.ends_with(" start"),
                    "{between:?} interleaved with {program}'s burst"
                );
            }
        }
    }

    for program in ["alpha", "bravo", "charlie"] {
        let own = recorder.program_lines(program);
        assert_eq!(own.len(), 3 * 3 + 1);
        assert_eq!(own.last().map(String::as_str), Some("all rounds complete"));
    }
    assert_eq!(lines.first().map(String::as_str), Some("training begins"));
    assert_eq!(lines.last().map(String::as_str), Some("all training complete"));
}

#[tokio::test(start_paused = true)]
async fn status_frames_respect_invariants() {
    let frames = Frames::default();
    let supervisor = Supervisor::new(
        session(
            &[
                ("long", TrainingPlan::new(3, 3, 2)),
                ("short", TrainingPlan::new(1, 1, 0)),
                ("none", TrainingPlan::new(0, 0, 0)),
            ],
            2,
            1,
        ),
        Arc::new(Recorder::default()),
    );
    supervisor.run(frames.clone()).await.unwrap();

    let frames = frames.0.lock().unwrap().clone();
    assert!(frames.len() > 2);

    let initial_rounds = [3, 1, 0];
    let mut last_rounds = initial_rounds;
    for rows in &frames {
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["long", "short", "none"]);
        for (i, row) in rows.iter().enumerate() {
            assert!(row.elapsed <= row.total, "{row:?}");
            assert_eq!(row.remaining, row.total - row.elapsed);
            if row.phase == ProgramPhase::Completed {
                assert_eq!(row.rounds_remaining, 0, "{row:?}");
            }
            if initial_rounds[i] > 0 && row.phase != ProgramPhase::Completed {
                assert!(row.rounds_remaining > 0, "{row:?}");
            }
            assert!(row.rounds_remaining <= last_rounds[i]);
            assert!(last_rounds[i] - row.rounds_remaining <= 1, "skipped a round: {row:?}");
            last_rounds[i] = row.rounds_remaining;
        }
    }

    let last = frames.last().unwrap();
    assert!(last.iter().all(|r| r.phase == ProgramPhase::Completed));
    assert!(last.iter().all(|r| r.rounds_remaining == 0));
}

#[tokio::test(start_paused = true)]
async fn config_phrases_reach_the_speaker() {
    let config = Config::parse(
        r#"
prepare_time = 0
ready_time = 2

[phrases]
begins = "session on"
ready = "shot {round}"
start = "fire"
down = "cease"
complete = "done"
finished = "range closed"

[plans.air]
rounds = 2
hold_time = 1
rest_time = 1
"#,
        false,
    )
    .unwrap();

    let recorder = Arc::new(Recorder::default());
    let supervisor = Supervisor::new(Session::from_config(&config), recorder.clone());
    let report = supervisor.run(Frames::default()).await.unwrap();

    assert_eq!(
        recorder.lines(),
        vec![
            "session on",
            "air shot 1",
            "air fire",
            "air cease",
            "air shot 2",
            "air fire",
            "air cease",
            "air done",
            "range closed",
        ]
    );
    assert_eq!(report.spoken.len(), 9);
}

#[tokio::test(start_paused = true)]
async fn many_programs_all_finish_exactly_once() {
    let plans: Vec<(String, TrainingPlan)> = (0..8)
        .map(|i| (format!("p{i}"), TrainingPlan::new(i % 3 + 1, i as u64 % 4, 1)))
        .collect();
    let borrowed: Vec<(&str, TrainingPlan)> =
        plans.iter().map(|(n, p)| (n.as_str(), *p)).collect();

    let recorder = Arc::new(Recorder::default());
    let supervisor = Supervisor::new(session(&borrowed, 1, 1), recorder.clone());
    let report = supervisor.run(Frames::default()).await.unwrap();

    for (name, plan) in &plans {
        let own = recorder.program_lines(name);
        let completes = own.iter().filter(|l| *l == "all rounds complete").count();
        assert_eq!(completes, 1, "{name}");
        assert_eq!(own.len() as u32, plan.rounds * 3 + 1, "{name}");
    }
    assert_eq!(report.speech_failures, 0);
    assert!(report.faulted.is_empty());
}
