use std::collections::HashSet;

use log::debug;

use crate::config::DEFAULT_MATCH_DECIMALS;
use crate::model::{Observation, ObservationSequence, ReconSummary, ReconciliationReport, Side};
use crate::report::ReportSink;

/// Values are equal when they print identically at `decimals` places.
///
/// Rounding is on the exact binary value, ties to even, so `1.05` (stored
/// just above) rounds up while `3.05` (stored just below) rounds down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundingPolicy {
    pub decimals: u32,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_DECIMALS)
    }
}

impl RoundingPolicy {
    pub fn new(decimals: u32) -> Self {
        Self { decimals }
    }

    /// Rounded text of `value`; `-0.0` folds into `0.0`.
    pub fn key(&self, value: f64) -> String {
        let text = format!("{:.*}", self.decimals as usize, value);
        match text.strip_prefix('-') {
            Some(abs) if abs.bytes().all(|b| b == b'0' || b == b'.') => abs.to_string(),
            _ => text,
        }
    }

    pub fn matches(&self, a: &Observation, b: &Observation) -> bool {
        a.timestamp == b.timestamp && self.key(a.value) == self.key(b.value)
    }
}

type MatchKey<'a> = (&'a str, String);

fn index<'a>(seq: &'a ObservationSequence, policy: &RoundingPolicy) -> HashSet<MatchKey<'a>> {
    seq.iter()
        .map(|o| (o.timestamp.as_str(), policy.key(o.value)))
        .collect()
}

fn unmatched_pass<'a, S: ReportSink + ?Sized>(
    side: Side,
    seq: &'a ObservationSequence,
    other: &HashSet<MatchKey<'a>>,
    policy: &RoundingPolicy,
    sink: &mut S,
) -> Vec<Observation> {
    let mut only = Vec::new();
    for obs in seq {
        if !other.contains(&(obs.timestamp.as_str(), policy.key(obs.value))) {
            sink.unmatched(side, obs);
            only.push(obs.clone());
        }
    }
    only
}

/// Reconcile without streaming output.
pub fn reconcile(
    left: &ObservationSequence,
    right: &ObservationSequence,
    policy: &RoundingPolicy,
) -> ReconciliationReport {
    reconcile_into(left, right, policy, &mut ())
}

/// Check every observation of each side for a counterpart on the other.
///
/// Unmatched items reach `sink` in discovery order, left side first. Every
/// duplicate is checked on its own, so two identical unmatched items are
/// both reported.
pub fn reconcile_into<S: ReportSink + ?Sized>(
    left: &ObservationSequence,
    right: &ObservationSequence,
    policy: &RoundingPolicy,
    sink: &mut S,
) -> ReconciliationReport {
    let left_keys = index(left, policy);
    let right_keys = index(right, policy);

    let left_only = unmatched_pass(Side::Left, left, &right_keys, policy, sink);
    let right_only = unmatched_pass(Side::Right, right, &left_keys, policy, sink);

    let fully_matched = left_only.is_empty() && right_only.is_empty();
    if fully_matched {
        sink.matched_all();
    }

    debug!(
        "reconciled {} left / {} right: {} left-only, {} right-only",
        left.len(),
        right.len(),
        left_only.len(),
        right_only.len()
    );

    ReconciliationReport {
        summary: ReconSummary {
            left_total: left.len(),
            right_total: right.len(),
            left_only: left_only.len(),
            right_only: right_only.len(),
        },
        left_only,
        right_only,
        fully_matched,
    }
}
