use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            r#"
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                email       TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL
            );

            -- Append-only. `id` breaks ties between records written in the
            -- same instant.
            CREATE TABLE day_record (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                content_date  TEXT NOT NULL,
                raw_text      TEXT NOT NULL,
                price         TEXT,
                created_at    TEXT NOT NULL
            );

            CREATE INDEX idx_day_record_date
                ON day_record(content_date, created_at);

            CREATE TABLE watch (
                id          TEXT PRIMARY KEY,
                "user"      TEXT NOT NULL REFERENCES users(id),
                watch_date  TEXT NOT NULL,
                is_enabled  INTEGER NOT NULL DEFAULT 1,
                last_price  TEXT,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_watch_active
                ON watch(is_enabled, watch_date);

            INSERT INTO schema_version (version) VALUES (1);
            "#,
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
