//! Day lookup shared by both normalizers.
//!
//! One table maps each day to the tag found in metric file names, the token
//! found in person file names, and the anchor date for relative timestamps.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::{ChannelConfig, DayConfig, DAY_PLACEHOLDER, INDEX_PLACEHOLDER};
use crate::error::ReconError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Day {
    pub number: u32,
    pub tag: String,
    pub token: String,
    pub anchor: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTable {
    days: Vec<Day>,
}

impl DayTable {
    pub fn from_config(days: &[DayConfig]) -> Self {
        Self {
            days: days
                .iter()
                .map(|d| Day {
                    number: d.number,
                    tag: d.tag(),
                    token: d.token(),
                    anchor: d.anchor,
                })
                .collect(),
        }
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn get(&self, number: u32) -> Option<&Day> {
        self.days.iter().find(|d| d.number == number)
    }

    /// First day whose tag occurs in `filename`, in table order.
    pub fn resolve(&self, filename: &str) -> Result<&Day, ReconError> {
        self.days
            .iter()
            .find(|d| filename.contains(d.tag.as_str()))
            .ok_or_else(|| ReconError::UnrecognizedDayTag(filename.to_string()))
    }
}

/// Channel identifiers recorded on `day`: every index of the first pattern,
/// then every index of the next.
pub fn channel_columns(day: &Day, channels: &ChannelConfig) -> Vec<String> {
    let day_number = day.number.to_string();
    channels
        .patterns
        .iter()
        .flat_map(|pattern| {
            let day_number = &day_number;
            (1..=channels.count).map(move |i| {
                pattern
                    .replace(INDEX_PLACEHOLDER, &i.to_string())
                    .replace(DAY_PLACEHOLDER, day_number)
            })
        })
        .collect()
}
