//! Destinations for reconciliation output.
//!
//! The reconciler pushes each unmatched observation into a [`ReportSink`] as
//! soon as it is found, so the caller chooses where the report goes.

use std::fmt;
use std::io::{self, Write};

use crate::model::{Observation, Side};

pub const DEFAULT_LEFT_LABEL: &str = "person";
pub const DEFAULT_RIGHT_LABEL: &str = "metric";

pub trait ReportSink {
    /// `obs` from `side` has no counterpart on the other side.
    fn unmatched(&mut self, side: Side, obs: &Observation);
    /// Called once, after both passes, when nothing was unmatched.
    fn matched_all(&mut self);
}

impl ReportSink for () {
    fn unmatched(&mut self, _side: Side, _obs: &Observation) {}
    fn matched_all(&mut self) {}
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Human-readable report, one line per event.
///
/// The first write error stops further output and is returned by
/// [`TextReport::finish`].
pub struct TextReport<W: Write> {
    out: W,
    left_label: String,
    right_label: String,
    lines: usize,
    error: Option<io::Error>,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self::with_labels(out, DEFAULT_LEFT_LABEL, DEFAULT_RIGHT_LABEL)
    }

    pub fn with_labels(out: W, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            out,
            left_label: left.into(),
            right_label: right.into(),
            lines: 0,
            error: None,
        }
    }

    pub fn lines_written(&self) -> usize {
        self.lines
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn label(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left_label,
            Side::Right => &self.right_label,
        }
    }

    fn write_line(&mut self, line: fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        match writeln!(self.out, "{line}") {
            Ok(()) => self.lines += 1,
            Err(e) => self.error = Some(e),
        }
    }
}

impl<W: Write> ReportSink for TextReport<W> {
    fn unmatched(&mut self, side: Side, obs: &Observation) {
        let label = self.label(side).to_string();
        self.write_line(format_args!("No matching value found for {label} item {obs}."));
    }

    fn matched_all(&mut self) {
        self.write_line(format_args!("Everything is matched."));
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Unmatched(Side, Observation),
    MatchedAll,
}

/// Records events in arrival order.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub events: Vec<SinkEvent>,
}

impl ReportSink for CollectSink {
    fn unmatched(&mut self, side: Side, obs: &Observation) {
        self.events.push(SinkEvent::Unmatched(side, obs.clone()));
    }

    fn matched_all(&mut self) {
        self.events.push(SinkEvent::MatchedAll);
    }
}
