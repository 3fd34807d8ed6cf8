// Delta report between two archive dates. Derived values only; nothing here is stored.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Devices with a snapshot on both dates.
    pub entries: Vec<ReportEntry>,
    /// Devices missing a snapshot on one or both dates. Excluded from totals.
    pub incomplete: Vec<IncompleteEntry>,
    /// Sorted by group name.
    pub groups: Vec<GroupAggregate>,
    /// Archived names that no configured device carries.
    pub unknown_devices: Vec<String>,
    pub total_start: u64,
    pub total_end: u64,
    pub total_delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub device_name: String,
    pub start_counter: u64,
    pub end_counter: u64,
    /// Negative when the counter was reset or the device replaced.
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAggregate {
    pub group_name: String,
    pub start_total: u64,
    pub end_total: u64,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompleteEntry {
    pub device_name: String,
    pub missing: MissingSide,
    /// The counter from the side that is present, if any.
    pub counter: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingSide {
    /// No baseline on the start date.
    Start,
    /// No snapshot on the end date.
    End,
    Both,
}

/// Signed difference of two counters, saturating at the i64 range.
pub fn signed_delta(start: u64, end: u64) -> i64 {
    let diff = i128::from(end) - i128::from(start);
    i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
}
