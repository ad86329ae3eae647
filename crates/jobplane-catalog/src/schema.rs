//! Database schema management.

use rusqlite::Connection;
use tokio_rusqlite::Error;

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS job_configurations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_name TEXT NOT NULL,
    job_group TEXT NOT NULL DEFAULT 'DEFAULT',
    job_type TEXT NOT NULL,
    cron_expression TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    job_data TEXT NOT NULL DEFAULT '',
    is_deleted INTEGER NOT NULL DEFAULT 0,
    sync_status TEXT NOT NULL DEFAULT 'Unregistered',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- At most one active row per job key
CREATE UNIQUE INDEX IF NOT EXISTS idx_job_configurations_active_key
    ON job_configurations(job_name, job_group)
    WHERE is_deleted = 0;

CREATE INDEX IF NOT EXISTS idx_job_configurations_name
    ON job_configurations(job_name);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='job_configurations'")
            .unwrap();
        assert!(stmt.exists([]).unwrap());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn test_partial_unique_index_ignores_deleted_rows() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let insert = "INSERT INTO job_configurations
            (job_name, job_group, job_type, cron_expression, is_deleted, created_at, updated_at)
            VALUES ('a', 'DEFAULT', 'builtin.noop', '0 * * * * *', ?1, 'now', 'now')";

        conn.execute(insert, [1]).unwrap();
        conn.execute(insert, [0]).unwrap();
        assert!(conn.execute(insert, [0]).is_err());
    }
}
