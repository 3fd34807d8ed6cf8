use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One archived counter reading: a device's page count on a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub date: NaiveDate,
    pub device_name: String,
    pub counter: u64,
}

/// What `put` did with a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PutOutcome {
    /// No snapshot existed for the key; the reading was stored.
    Inserted,
    /// A snapshot existed and refresh was off; the first value of the day was kept.
    Unchanged,
    /// A snapshot existed and was overwritten.
    Refreshed,
}
