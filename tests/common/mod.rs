// Shared test helpers
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use pagetally::archive_repo::ArchiveRepo;
use pagetally::models::{DeviceDescriptor, Snapshot};
use pagetally::reader::CounterReader;
use pagetally::snmp::Oid;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn device(name: &str, groups: &[&str]) -> DeviceDescriptor {
    DeviceDescriptor {
        name: name.into(),
        description: format!("{name} description"),
        query_target: Oid::page_count(),
        address: "127.0.0.1".into(),
        groups: groups.iter().map(|g| g.to_string()).collect(),
    }
}

pub fn snapshot(date: NaiveDate, name: &str, counter: u64) -> Snapshot {
    Snapshot {
        date,
        device_name: name.into(),
        counter,
    }
}

/// Opens a fresh archive in a temp dir. Keep the TempDir alive for the test's duration.
pub async fn temp_repo() -> (TempDir, ArchiveRepo) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("archive.db");
    let repo = ArchiveRepo::open(path.to_str().unwrap()).await.unwrap();
    (dir, repo)
}

/// Writes rows straight into an `archive` table, bypassing the repo, the way the older
/// collector did: no constraints, dates as text.
pub async fn write_raw_rows(path: &Path, rows: &[(&str, &str, i64)]) {
    let opts = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    sqlx::query("CREATE TABLE IF NOT EXISTS archive (created DATE, name TEXT, pages INT)")
        .execute(&pool)
        .await
        .unwrap();
    for (created, name, pages) in rows {
        sqlx::query("INSERT INTO archive VALUES ($1, $2, $3)")
            .bind(*created)
            .bind(*name)
            .bind(*pages)
            .execute(&pool)
            .await
            .unwrap();
    }
    pool.close().await;
}

/// Answers from a fixed table; devices not in the table do not answer.
pub struct MockReader {
    answers: HashMap<String, u64>,
    pub calls: Mutex<Vec<String>>,
}

impl MockReader {
    pub fn new(answers: &[(&str, u64)]) -> Self {
        Self {
            answers: answers.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CounterReader for MockReader {
    async fn read(&self, device: &DeviceDescriptor) -> Option<u64> {
        self.calls.lock().unwrap().push(device.name.clone());
        self.answers.get(&device.name).copied()
    }
}
