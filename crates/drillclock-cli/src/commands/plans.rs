use std::path::PathBuf;

use clap::Args;
use comfy_table::{Cell, CellAlignment};
use drillclock_core::duration::format_duration;
use drillclock_core::Config;
use serde::Serialize;

use crate::output::{header, new_table};

#[derive(Args)]
pub struct PlansArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct PlanSummary<'a> {
    name: &'a str,
    rounds: u32,
    hold_time: u64,
    rest_time: u64,
    estimated_secs: u64,
}

pub fn run(args: PlansArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(args.config.as_deref())?;
    let timing = config.timing();

    let summaries: Vec<PlanSummary> = config
        .plans
        .iter()
        .map(|(name, plan)| PlanSummary {
            name,
            rounds: plan.rounds,
            hold_time: plan.hold_time,
            rest_time: plan.rest_time,
            estimated_secs: plan.estimated_secs(&timing),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let mut table = new_table();
    table.set_header(header(&["PROGRAM", "ROUNDS", "HOLD", "REST", "ESTIMATE"]));
    for s in &summaries {
        table.add_row(vec![
            Cell::new(s.name),
            Cell::new(s.rounds).set_alignment(CellAlignment::Right),
            Cell::new(format!("{}s", s.hold_time)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{}s", s.rest_time)).set_alignment(CellAlignment::Right),
            Cell::new(format_duration(s.estimated_secs)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");

    // Programs run side by side, so the longest one bounds the session.
    let longest = summaries.iter().map(|s| s.estimated_secs).max().unwrap_or(0);
    println!(
        "prepare {}s, ready {}s, session at least {}",
        timing.prepare_time,
        timing.ready_time,
        format_duration(longest)
    );
    Ok(())
}
