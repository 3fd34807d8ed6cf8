use serde::Serialize;

use super::PutOutcome;

/// Per-device result of one collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResult {
    pub device_name: String,
    pub description: String,
    pub outcome: CollectionOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CollectionOutcome {
    Collected { counter: u64, stored: PutOutcome },
    NoAnswer,
    /// The device answered but the archive write failed.
    StoreFailed { counter: u64, error: String },
}

impl CollectionResult {
    pub fn counter(&self) -> Option<u64> {
        match &self.outcome {
            CollectionOutcome::Collected { counter, .. }
            | CollectionOutcome::StoreFailed { counter, .. } => Some(*counter),
            CollectionOutcome::NoAnswer => None,
        }
    }

    pub fn is_collected(&self) -> bool {
        matches!(self.outcome, CollectionOutcome::Collected { .. })
    }
}
