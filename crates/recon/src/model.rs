use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// A single (timestamp, value) sample.
///
/// The timestamp is kept as integer text so both sources compare by string
/// identity rather than through a float round trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub timestamp: String,
    pub value: f64,
}

impl Observation {
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }

    /// Timestamp order first, value order second.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.value.total_cmp(&other.value))
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.timestamp, self.value)
    }
}

/// Ordered observations from one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ObservationSequence {
    items: Vec<Observation>,
}

impl ObservationSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, obs: Observation) {
        self.items.push(obs);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Observation> {
        self.items
    }

    /// Sort by timestamp text, ties broken by value.
    pub fn sort_canonical(&mut self) {
        self.items.sort_by(Observation::canonical_cmp);
    }

    /// Drop exact (timestamp, value) duplicates. Requires canonical order.
    pub fn dedup_exact(&mut self) {
        self.items
            .dedup_by(|a, b| a.timestamp == b.timestamp && a.value == b.value);
    }
}

impl From<Vec<Observation>> for ObservationSequence {
    fn from(items: Vec<Observation>) -> Self {
        Self { items }
    }
}

impl FromIterator<Observation> for ObservationSequence {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ObservationSequence {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub left_total: usize,
    pub right_total: usize,
    pub left_only: usize,
    pub right_only: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    /// Left items with no counterpart on the right.
    pub left_only: Vec<Observation>,
    /// Right items with no counterpart on the left.
    pub right_only: Vec<Observation>,
    pub fully_matched: bool,
    pub summary: ReconSummary,
}

impl ReconciliationReport {
    pub fn unmatched(&self, side: Side) -> &[Observation] {
        match side {
            Side::Left => &self.left_only,
            Side::Right => &self.right_only,
        }
    }

    /// Swap sides, as if the inputs had been passed the other way round.
    pub fn mirrored(self) -> Self {
        Self {
            left_only: self.right_only,
            right_only: self.left_only,
            fully_matched: self.fully_matched,
            summary: ReconSummary {
                left_total: self.summary.right_total,
                right_total: self.summary.left_total,
                left_only: self.summary.right_only,
                right_only: self.summary.left_only,
            },
        }
    }
}
