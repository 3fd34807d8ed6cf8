// Delta report between two archive dates, per device and per group.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::archive_repo::ArchiveRepo;
use crate::error::StoreError;
use crate::models::{
    DeviceDescriptor, GroupAggregate, IncompleteEntry, MissingSide, Report, ReportEntry, Snapshot,
    signed_delta,
};

/// Reads both dates from the archive and builds the report. A failed read aborts the report.
pub async fn build(
    repo: &ArchiveRepo,
    devices: &[DeviceDescriptor],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Report, StoreError> {
    if start_date > end_date {
        warn!(%start_date, %end_date, "start date is after end date; deltas will be inverted");
    }
    let start = repo.list(start_date).await?;
    let end = repo.list(end_date).await?;
    let report = compute(start_date, end_date, devices, &start, &end);
    info!(
        %start_date,
        %end_date,
        matched = report.entries.len(),
        incomplete = report.incomplete.len(),
        total_delta = report.total_delta,
        "report built"
    );
    Ok(report)
}

/// Pure delta computation over two snapshot sets.
///
/// Devices with a snapshot on both dates become entries and count toward the totals and their
/// groups. Devices missing either side are listed as incomplete instead. Archived names that no
/// configured device carries are reported as unknown; matched ones still count toward totals.
pub fn compute(
    start_date: NaiveDate,
    end_date: NaiveDate,
    devices: &[DeviceDescriptor],
    start: &[Snapshot],
    end: &[Snapshot],
) -> Report {
    let start_by_name: HashMap<&str, u64> = start
        .iter()
        .map(|s| (s.device_name.as_str(), s.counter))
        .collect();
    let end_by_name: HashMap<&str, u64> = end
        .iter()
        .map(|s| (s.device_name.as_str(), s.counter))
        .collect();
    let configured: HashMap<&str, &DeviceDescriptor> =
        devices.iter().map(|d| (d.name.as_str(), d)).collect();

    let unknown: BTreeSet<&str> = start_by_name
        .keys()
        .chain(end_by_name.keys())
        .copied()
        .filter(|name| !configured.contains_key(name))
        .collect();

    // Configuration order first, then unknown names alphabetically.
    let names = devices
        .iter()
        .map(|d| d.name.as_str())
        .chain(unknown.iter().copied());

    let mut entries = Vec::new();
    let mut incomplete = Vec::new();
    let mut groups: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    let mut total_start: u64 = 0;
    let mut total_end: u64 = 0;

    for name in names {
        match (start_by_name.get(name), end_by_name.get(name)) {
            (Some(&start_counter), Some(&end_counter)) => {
                total_start = total_start.saturating_add(start_counter);
                total_end = total_end.saturating_add(end_counter);
                if let Some(device) = configured.get(name) {
                    for group in &device.groups {
                        let totals = groups.entry(group.as_str()).or_insert((0, 0));
                        totals.0 = totals.0.saturating_add(start_counter);
                        totals.1 = totals.1.saturating_add(end_counter);
                    }
                }
                entries.push(ReportEntry {
                    device_name: name.to_string(),
                    start_counter,
                    end_counter,
                    delta: signed_delta(start_counter, end_counter),
                });
            }
            (None, Some(&counter)) => incomplete.push(IncompleteEntry {
                device_name: name.to_string(),
                missing: MissingSide::Start,
                counter: Some(counter),
            }),
            (Some(&counter), None) => incomplete.push(IncompleteEntry {
                device_name: name.to_string(),
                missing: MissingSide::End,
                counter: Some(counter),
            }),
            (None, None) => incomplete.push(IncompleteEntry {
                device_name: name.to_string(),
                missing: MissingSide::Both,
                counter: None,
            }),
        }
    }

    if !unknown.is_empty() {
        warn!(
            devices = ?unknown,
            "archive holds snapshots for devices missing from the configuration"
        );
    }

    Report {
        start_date,
        end_date,
        entries,
        incomplete,
        groups: groups
            .into_iter()
            .map(|(group_name, (start_total, end_total))| GroupAggregate {
                group_name: group_name.to_string(),
                start_total,
                end_total,
                delta: signed_delta(start_total, end_total),
            })
            .collect(),
        unknown_devices: unknown.into_iter().map(str::to_string).collect(),
        total_start,
        total_end,
        total_delta: signed_delta(total_start, total_end),
    }
}
