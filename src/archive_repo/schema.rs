// Archive table: `archive (created DATE, name TEXT, pages INT)`, one row per device per day.
// Databases written by the earlier collector have no unique index and may hold duplicates;
// those are collapsed to the first-written row before the index is created.

use sqlx::SqlitePool;
use tracing::warn;

const UNIQUE_INDEX: &str = "idx_archive_created_name";

pub(super) async fn init_archive_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS archive (
            created DATE NOT NULL,
            name TEXT NOT NULL,
            pages INT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    let indexed = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'index' AND name = $1")
        .bind(UNIQUE_INDEX)
        .fetch_optional(pool)
        .await?
        .is_some();
    if indexed {
        return Ok(());
    }

    let removed = sqlx::query(
        "DELETE FROM archive WHERE rowid NOT IN (SELECT MIN(rowid) FROM archive GROUP BY created, name)",
    )
    .execute(pool)
    .await?
    .rows_affected();
    if removed > 0 {
        warn!(
            operation = "init_archive_table",
            removed, "collapsed duplicate archive rows, kept first value of each day"
        );
    }

    sqlx::query(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {UNIQUE_INDEX} ON archive(created, name)"
    ))
    .execute(pool)
    .await?;

    Ok(())
}
