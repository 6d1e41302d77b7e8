//! Terminal output: the live status table and announcement captions.

use std::collections::VecDeque;
use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex, PoisonError};

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use crossterm::cursor::MoveToPreviousLine;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use drillclock_core::duration::format_clock;
use drillclock_core::{ProgramPhase, SpeechEngine, SpeechError, StatusRow, StatusSink};

/// Recent announcement texts, shared between the speaker and the table.
#[derive(Debug, Clone, Default)]
pub struct Captions(Arc<Mutex<VecDeque<String>>>);

const CAPTION_LINES: usize = 3;

impl Captions {
    fn push(&self, text: &str) {
        let mut lines = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() == CAPTION_LINES {
            lines.pop_front();
        }
        lines.push_back(text.to_string());
    }

    fn snapshot(&self) -> Vec<String> {
        let lines = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        lines.iter().cloned().collect()
    }
}

/// Where caption text goes.
pub enum CaptionTarget {
    /// Shown under the status table.
    Table(Captions),
    /// Printed to stdout as it is spoken.
    Stdout,
}

/// Speech engine decorator that shows each line before speaking it.
pub struct CaptionedSpeech<E> {
    inner: E,
    target: CaptionTarget,
}

impl<E: SpeechEngine> CaptionedSpeech<E> {
    pub fn new(inner: E, target: CaptionTarget) -> Self {
        Self { inner, target }
    }
}

impl<E: SpeechEngine> SpeechEngine for CaptionedSpeech<E> {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        match &self.target {
            CaptionTarget::Table(captions) => captions.push(text),
            CaptionTarget::Stdout => println!(">> {text}"),
        }
        self.inner.speak(text)
    }
}

/// Renders the status table to stdout.
///
/// On a terminal the table is redrawn in place; otherwise a frame is only
/// printed when it differs from the previous one.
pub struct TableRenderer {
    captions: Captions,
    redraw: bool,
    drawn_lines: usize,
    last: Vec<StatusRow>,
}

impl TableRenderer {
    pub fn new(captions: Captions) -> Self {
        Self {
            captions,
            redraw: std::io::stdout().is_terminal(),
            drawn_lines: 0,
            last: Vec::new(),
        }
    }
}

impl StatusSink for TableRenderer {
    fn render(&mut self, rows: &[StatusRow]) {
        if !self.redraw && rows == self.last.as_slice() {
            return;
        }
        self.last = rows.to_vec();

        let mut lines: Vec<String> = status_table(rows)
            .to_string()
            .lines()
            .map(str::to_owned)
            .collect();
        if self.redraw {
            lines.extend(self.captions.snapshot().into_iter().map(|c| format!(">> {c}")));
        }

        let mut out = std::io::stdout().lock();
        if self.redraw && self.drawn_lines > 0 {
            let up = u16::try_from(self.drawn_lines).unwrap_or(u16::MAX);
            let _ = queue!(out, MoveToPreviousLine(up), Clear(ClearType::FromCursorDown));
        }
        for line in &lines {
            let _ = writeln!(out, "{line}");
        }
        if !self.redraw {
            let _ = writeln!(out);
        }
        let _ = out.flush();
        self.drawn_lines = lines.len();
    }
}

/// Discards every frame.
pub struct NoTable;

impl StatusSink for NoTable {
    fn render(&mut self, _rows: &[StatusRow]) {}
}

/// Header cells in the bold, centred style shared by every table.
pub fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| {
            Cell::new(title)
                .set_alignment(CellAlignment::Center)
                .add_attribute(Attribute::Bold)
        })
        .collect()
}

/// An empty table with the CLI's border style.
pub fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn phase_cell(row: &StatusRow) -> Cell {
    let cell = Cell::new(&row.phase_label);
    match row.phase {
        ProgramPhase::Completed => cell.fg(Color::Green),
        ProgramPhase::Faulted => cell.fg(Color::Red),
        ProgramPhase::RoundReady => cell.fg(Color::Yellow),
        _ => cell,
    }
}

fn status_table(rows: &[StatusRow]) -> Table {
    let mut table = new_table();
    table.set_header(header(&["PROGRAM", "PHASE", "TIME", "REMAINING", "ROUNDS"]));
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.name),
            phase_cell(row),
            Cell::new(format!("{}/{}", format_clock(row.elapsed), format_clock(row.total)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format_clock(row.remaining)).set_alignment(CellAlignment::Right),
            Cell::new(row.rounds_remaining).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
