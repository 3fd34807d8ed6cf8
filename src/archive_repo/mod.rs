// SQLite snapshot archive. One row per (date, device); first write of the day wins unless
// the caller asks for a refresh. Dates are stored as `YYYY-MM-DD` text.

mod schema;

use crate::error::StoreError;
use crate::models::{PutOutcome, Snapshot};
use chrono::NaiveDate;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct ArchiveRepo {
    pool: SqlitePool,
}

impl ArchiveRepo {
    /// Connect to SQLite at `path`, create parent dir and DB if missing, enable WAL + pragmas.
    /// A single connection keeps every write serialized.
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    /// Connect and create the schema in one step.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let repo = Self::connect(path).await?;
        repo.init().await?;
        Ok(repo)
    }

    pub async fn init(&self) -> Result<(), StoreError> {
        schema::init_archive_table(&self.pool).await?;
        Ok(())
    }

    /// Stores `counter` for `(date, device_name)`. An existing row is left alone unless
    /// `refresh` is set, in which case its counter is overwritten.
    #[instrument(skip(self), fields(repo = "archive", operation = "put"))]
    pub async fn put(
        &self,
        date: NaiveDate,
        device_name: &str,
        counter: u64,
        refresh: bool,
    ) -> Result<PutOutcome, StoreError> {
        let pages = i64::try_from(counter).map_err(|_| StoreError::CounterOutOfRange(counter))?;
        let created = format_date(date);

        let mut tx = self.pool.begin().await?;
        let existing = sqlx::query("SELECT pages FROM archive WHERE created = $1 AND name = $2")
            .bind(&created)
            .bind(device_name)
            .fetch_optional(&mut *tx)
            .await?;

        let outcome = match (existing, refresh) {
            (None, _) => {
                sqlx::query("INSERT INTO archive (created, name, pages) VALUES ($1, $2, $3)")
                    .bind(&created)
                    .bind(device_name)
                    .bind(pages)
                    .execute(&mut *tx)
                    .await?;
                PutOutcome::Inserted
            }
            (Some(_), false) => PutOutcome::Unchanged,
            (Some(_), true) => {
                sqlx::query("UPDATE archive SET pages = $1 WHERE created = $2 AND name = $3")
                    .bind(pages)
                    .bind(&created)
                    .bind(device_name)
                    .execute(&mut *tx)
                    .await?;
                PutOutcome::Refreshed
            }
        };
        tx.commit().await?;
        Ok(outcome)
    }

    pub async fn get(&self, date: NaiveDate, device_name: &str) -> Result<Option<u64>, StoreError> {
        let row = sqlx::query("SELECT pages FROM archive WHERE created = $1 AND name = $2")
            .bind(format_date(date))
            .bind(device_name)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let pages: i64 = row.try_get("pages")?;
        Ok(Some(counter_from_row(device_name, pages)?))
    }

    /// All snapshots for `date`, ordered by device name.
    #[instrument(skip(self), fields(repo = "archive", operation = "list"))]
    pub async fn list(&self, date: NaiveDate) -> Result<Vec<Snapshot>, StoreError> {
        let rows =
            sqlx::query("SELECT name, pages FROM archive WHERE created = $1 ORDER BY name ASC")
                .bind(format_date(date))
                .fetch_all(&self.pool)
                .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let device_name: String = row.try_get("name")?;
            let pages: i64 = row.try_get("pages")?;
            let counter = counter_from_row(&device_name, pages)?;
            out.push(Snapshot {
                date,
                device_name,
                counter,
            });
        }
        Ok(out)
    }

    /// Archived dates with their snapshot counts, oldest first.
    pub async fn list_dates(&self) -> Result<Vec<(NaiveDate, u64)>, StoreError> {
        let rows = sqlx::query(
            "SELECT CAST(created AS TEXT) AS created, COUNT(*) AS snapshots
             FROM archive GROUP BY created ORDER BY created ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let created: String = row.try_get("created")?;
            let snapshots: i64 = row.try_get("snapshots")?;
            let date = NaiveDate::parse_from_str(&created, DATE_FORMAT)
                .map_err(|e| StoreError::Corrupt(format!("date {created:?}: {e}")))?;
            out.push((date, snapshots.max(0) as u64));
        }
        Ok(out)
    }

    /// Deletes every snapshot. Returns the number of rows removed.
    #[instrument(skip(self), fields(repo = "archive", operation = "clear"))]
    pub async fn clear(&self) -> Result<u64, StoreError> {
        let r = sqlx::query("DELETE FROM archive")
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }

    /// Reclaim space after deletes.
    #[instrument(skip(self), fields(repo = "archive", operation = "vacuum"))]
    pub async fn vacuum(&self) -> Result<(), StoreError> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn counter_from_row(device_name: &str, pages: i64) -> Result<u64, StoreError> {
    u64::try_from(pages)
        .map_err(|_| StoreError::Corrupt(format!("negative counter {pages} for {device_name}")))
}
