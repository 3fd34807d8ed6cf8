// Report engine tests: deltas, totals, groups, incomplete ranges, unknown devices

mod common;

use common::{date, device, snapshot, temp_repo, write_raw_rows};
use pagetally::archive_repo::ArchiveRepo;
use pagetally::error::StoreError;
use pagetally::models::{GroupAggregate, IncompleteEntry, MissingSide, Report, ReportEntry};
use pagetally::report;
use tempfile::TempDir;

fn entry<'a>(r: &'a Report, device_name: &str) -> Option<&'a ReportEntry> {
    r.entries.iter().find(|e| e.device_name == device_name)
}

fn group<'a>(r: &'a Report, group_name: &str) -> Option<&'a GroupAggregate> {
    r.groups.iter().find(|g| g.group_name == group_name)
}

fn incomplete<'a>(r: &'a Report, device_name: &str) -> Option<&'a IncompleteEntry> {
    r.incomplete.iter().find(|e| e.device_name == device_name)
}

#[test]
fn delta_for_matched_device_counts_toward_totals() {
    let (s, e) = (date(2024, 3, 1), date(2024, 3, 31));
    let devices = vec![device("x", &[])];
    let r = report::compute(
        s,
        e,
        &devices,
        &[snapshot(s, "x", 1000)],
        &[snapshot(e, "x", 1230)],
    );

    let matched = entry(&r, "x").unwrap();
    assert_eq!(matched.start_counter, 1000);
    assert_eq!(matched.end_counter, 1230);
    assert_eq!(matched.delta, 230);
    assert_eq!(r.total_start, 1000);
    assert_eq!(r.total_end, 1230);
    assert_eq!(r.total_delta, 230);
    assert!(r.incomplete.is_empty());
    assert_eq!(r.start_date, s);
    assert_eq!(r.end_date, e);
}

#[test]
fn group_sums_every_member() {
    let (s, e) = (date(2024, 3, 1), date(2024, 3, 31));
    let devices = vec![
        device("a", &["floor2"]),
        device("b", &["floor2"]),
        device("c", &["floor3"]),
    ];
    let r = report::compute(
        s,
        e,
        &devices,
        &[snapshot(s, "a", 400), snapshot(s, "b", 650), snapshot(s, "c", 10)],
        &[snapshot(e, "a", 500), snapshot(e, "b", 700), snapshot(e, "c", 15)],
    );

    let floor2 = group(&r, "floor2").unwrap();
    assert_eq!(floor2.start_total, 1050);
    assert_eq!(floor2.end_total, 1200);
    assert_eq!(floor2.delta, 150);

    let floor3 = group(&r, "floor3").unwrap();
    assert_eq!(floor3.delta, 5);

    let names: Vec<_> = r.groups.iter().map(|g| g.group_name.as_str()).collect();
    assert_eq!(names, vec!["floor2", "floor3"]);
}

#[test]
fn device_in_several_groups_counts_in_each() {
    let (s, e) = (date(2024, 3, 1), date(2024, 3, 2));
    let devices = vec![device("a", &["color", "floor2"]), device("b", &["floor2"])];
    let r = report::compute(
        s,
        e,
        &devices,
        &[snapshot(s, "a", 100), snapshot(s, "b", 100)],
        &[snapshot(e, "a", 130), snapshot(e, "b", 110)],
    );

    assert_eq!(group(&r, "color").unwrap().delta, 30);
    assert_eq!(group(&r, "floor2").unwrap().delta, 40);
    // Totals count each device once.
    assert_eq!(r.total_delta, 40);
}

#[test]
fn missing_baseline_is_incomplete_and_excluded_from_totals() {
    let (s, e) = (date(2024, 3, 1), date(2024, 3, 31));
    let devices = vec![device("old", &["g"]), device("new", &["g"])];
    let r = report::compute(
        s,
        e,
        &devices,
        &[snapshot(s, "old", 100)],
        &[snapshot(e, "old", 120), snapshot(e, "new", 5000)],
    );

    assert!(entry(&r, "new").is_none());
    let new = incomplete(&r, "new").unwrap();
    assert_eq!(new.missing, MissingSide::Start);
    assert_eq!(new.counter, Some(5000));

    assert_eq!(r.total_start, 100);
    assert_eq!(r.total_end, 120);
    assert_eq!(r.total_delta, 20);
    assert_eq!(group(&r, "g").unwrap().end_total, 120);
}

#[test]
fn missing_end_snapshot_is_incomplete() {
    let (s, e) = (date(2024, 3, 1), date(2024, 3, 31));
    let devices = vec![device("gone", &[])];
    let r = report::compute(s, e, &devices, &[snapshot(s, "gone", 77)], &[]);

    let gone = incomplete(&r, "gone").unwrap();
    assert_eq!(gone.missing, MissingSide::End);
    assert_eq!(gone.counter, Some(77));
    assert!(r.entries.is_empty());
    assert_eq!(r.total_start, 0);
    assert_eq!(r.total_delta, 0);
}

#[test]
fn configured_device_without_any_snapshot_is_flagged() {
    let (s, e) = (date(2024, 3, 1), date(2024, 3, 31));
    let devices = vec![device("silent", &["g"])];
    let r = report::compute(s, e, &devices, &[], &[]);

    let silent = incomplete(&r, "silent").unwrap();
    assert_eq!(silent.missing, MissingSide::Both);
    assert_eq!(silent.counter, None);
    assert!(r.groups.is_empty());
}

#[test]
fn negative_delta_is_reported_unmodified() {
    let (s, e) = (date(2024, 3, 1), date(2024, 3, 31));
    let devices = vec![device("reset", &["g"])];
    let r = report::compute(
        s,
        e,
        &devices,
        &[snapshot(s, "reset", 5000)],
        &[snapshot(e, "reset", 100)],
    );

    assert_eq!(entry(&r, "reset").unwrap().delta, -4900);
    assert_eq!(r.total_delta, -4900);
    assert_eq!(group(&r, "g").unwrap().delta, -4900);
}

#[test]
fn unknown_archived_device_is_listed_not_fatal() {
    let (s, e) = (date(2024, 3, 1), date(2024, 3, 31));
    let devices = vec![device("known", &["g"])];
    let r = report::compute(
        s,
        e,
        &devices,
        &[snapshot(s, "known", 10), snapshot(s, "retired", 1000)],
        &[snapshot(e, "known", 20), snapshot(e, "retired", 1100)],
    );

    assert_eq!(r.unknown_devices, vec!["retired".to_string()]);
    assert_eq!(entry(&r, "retired").unwrap().delta, 100);
    assert_eq!(r.total_delta, 110);
    // Not in any group.
    assert_eq!(group(&r, "g").unwrap().delta, 10);
}

#[test]
fn entries_follow_configuration_order() {
    let (s, e) = (date(2024, 3, 1), date(2024, 3, 2));
    let devices = vec![device("zeta", &[]), device("alpha", &[])];
    let r = report::compute(
        s,
        e,
        &devices,
        &[snapshot(s, "alpha", 1), snapshot(s, "zeta", 1)],
        &[snapshot(e, "alpha", 2), snapshot(e, "zeta", 2)],
    );
    let names: Vec<_> = r.entries.iter().map(|e| e.device_name.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha"]);
}

#[test]
fn same_start_and_end_date_gives_zero_deltas() {
    let d = date(2024, 3, 1);
    let devices = vec![device("a", &["g"])];
    let snaps = [snapshot(d, "a", 500)];
    let r = report::compute(d, d, &devices, &snaps, &snaps);
    assert_eq!(entry(&r, "a").unwrap().delta, 0);
    assert_eq!(group(&r, "g").unwrap().delta, 0);
}

#[tokio::test]
async fn build_reads_both_dates_from_archive() {
    let (_dir, repo) = temp_repo().await;
    let (s, e) = (date(2024, 3, 1), date(2024, 3, 31));
    let devices = vec![device("a", &["floor2"]), device("b", &["floor2"])];

    repo.put(s, "a", 400, false).await.unwrap();
    repo.put(s, "b", 650, false).await.unwrap();
    repo.put(e, "a", 500, false).await.unwrap();
    repo.put(e, "b", 700, false).await.unwrap();
    // Another day must not leak into the report.
    repo.put(date(2024, 3, 15), "a", 450, false).await.unwrap();

    let r = report::build(&repo, &devices, s, e).await.unwrap();
    assert_eq!(r.total_delta, 150);
    assert_eq!(group(&r, "floor2").unwrap().delta, 150);
    assert_eq!(r.entries.len(), 2);
}

#[tokio::test]
async fn build_aborts_when_a_snapshot_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("archive.db");
    write_raw_rows(
        &path,
        &[("2024-03-01", "hall", 1000), ("2024-03-31", "hall", -1)],
    )
    .await;
    let repo = ArchiveRepo::open(path.to_str().unwrap()).await.unwrap();

    let devices = vec![device("hall", &[])];
    let result = report::build(&repo, &devices, date(2024, 3, 1), date(2024, 3, 31)).await;
    assert!(matches!(result, Err(StoreError::Corrupt(_))));
}
