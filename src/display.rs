// src/display.rs

use chrono::{DateTime, Local};
use std::io::{self, Write};

use crate::extract::Reading;

/// What the board currently shows. Owned by the poller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub event: Option<String>,
    pub heat: Option<String>,
    /// Last-updated text, already formatted for display.
    pub updated: Option<String>,
    pub mode: &'static str,
}

impl DisplayState {
    pub fn new(mode: &'static str) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Merge a reading in field by field. Missing fields keep their old
    /// value, so a populated board never goes back to blank.
    /// Returns whether anything visible changed.
    pub fn apply(&mut self, reading: Reading) -> bool {
        let mut changed = false;
        if let Some(event) = reading.event {
            changed |= replace(&mut self.event, event);
        }
        if let Some(heat) = reading.heat {
            changed |= replace(&mut self.heat, heat);
        }
        if let Some(time) = reading.time {
            changed |= replace(&mut self.updated, friendly_time(&time));
        }
        changed
    }
}

fn replace(slot: &mut Option<String>, value: String) -> bool {
    if slot.as_deref() == Some(value.as_str()) {
        return false;
    }
    *slot = Some(value);
    true
}

/// RFC 3339 timestamps become local `HH:MM:SS`; anything else is shown raw.
pub fn friendly_time(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(dt) => dt.with_timezone(&Local).format("%H:%M:%S").to_string(),
        Err(_) => raw.trim().to_string(),
    }
}

/// The display collaborator. Gets the whole state each time it changes.
pub trait Render {
    fn render(&mut self, state: &DisplayState);
}

/// Plain-text board on any writer, normally stdout.
pub struct TextBoard<W: Write> {
    out: W,
    clear: bool,
}

impl TextBoard<io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: io::stdout(),
            clear: true,
        }
    }
}

impl<W: Write> TextBoard<W> {
    /// A board that appends frames without clearing the screen.
    pub fn plain(out: W) -> Self {
        Self { out, clear: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, state: &DisplayState) -> io::Result<()> {
        if self.clear {
            // clear screen + home cursor
            write!(self.out, "\x1b[2J\x1b[H")?;
        }
        let blank = "--";
        writeln!(self.out, "EVENT  {}", state.event.as_deref().unwrap_or(blank))?;
        writeln!(self.out, "HEAT   {}", state.heat.as_deref().unwrap_or(blank))?;
        match &state.updated {
            Some(t) => writeln!(self.out, "[{}]  updated {}", state.mode, t)?,
            None => writeln!(self.out, "[{}]", state.mode)?,
        }
        self.out.flush()
    }
}

impl<W: Write> Render for TextBoard<W> {
    fn render(&mut self, state: &DisplayState) {
        if let Err(e) = self.draw(state) {
            tracing::warn!(error = %e, "failed to draw board");
        }
    }
}
