use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use farewatch_types::{DayRecord, NewDayRecord, Price, User, Watch, WatchUpdate};

use crate::Database;
use crate::models::{DayRecordRow, UserRow, WatchRow, format_date, format_timestamp};

const WATCH_COLUMNS: &str = r#"id, "user", watch_date, is_enabled, last_price, updated_at"#;

impl Database {
    // -- Users --

    /// Returns false if the email is already registered.
    pub fn create_user(&self, user: &User) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, email, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (email) DO NOTHING",
                (user.id.to_string(), &user.email, format_timestamp(&user.created_at)),
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "id", &id.to_string()))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    // -- Day records --

    /// Inserts the whole batch in one transaction, stamped with `created_at`.
    pub fn insert_day_records(
        &self,
        records: Vec<NewDayRecord>,
        created_at: DateTime<Utc>,
    ) -> Result<Vec<DayRecord>> {
        let stamp = format_timestamp(&created_at);
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO day_record (content_date, raw_text, price, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for record in &records {
                    stmt.execute((
                        format_date(&record.content_date),
                        &record.raw_text,
                        record.price.as_ref().map(Price::as_str),
                        &stamp,
                    ))?;
                }
            }
            tx.commit()?;
            Ok(())
        })?;

        Ok(records
            .into_iter()
            .map(|r| DayRecord {
                content_date: r.content_date,
                raw_text: r.raw_text,
                price: r.price,
                created_at,
            })
            .collect())
    }

    pub fn get_latest_day_record(&self, date: NaiveDate) -> Result<Option<DayRecord>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT content_date, raw_text, price, created_at
                     FROM day_record
                     WHERE content_date = ?1
                     ORDER BY created_at DESC, id DESC
                     LIMIT 1",
                    [format_date(&date)],
                    |row| {
                        Ok(DayRecordRow {
                            content_date: row.get(0)?,
                            raw_text: row.get(1)?,
                            price: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;

            row.map(DayRecord::try_from).transpose()
        })
    }

    // -- Watches --

    pub fn create_watch(&self, watch: &Watch) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                r#"INSERT INTO watch (id, "user", watch_date, is_enabled, last_price, updated_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                (
                    watch.id.to_string(),
                    watch.user.to_string(),
                    format_date(&watch.watch_date),
                    watch.is_enabled,
                    watch.last_price.as_ref().map(Price::as_str),
                    format_timestamp(&watch.updated_at),
                ),
            )?;
            Ok(())
        })
    }

    pub fn get_watch(&self, id: Uuid) -> Result<Option<Watch>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {WATCH_COLUMNS} FROM watch WHERE id = ?1");
            let row = conn
                .query_row(&sql, [id.to_string()], watch_row)
                .optional()?;
            row.map(Watch::try_from).transpose()
        })
    }

    /// Enabled watches dated on or after `from`, oldest date first.
    pub fn get_active_watches(&self, from: NaiveDate) -> Result<Vec<Watch>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {WATCH_COLUMNS} FROM watch
                 WHERE is_enabled = 1 AND watch_date >= ?1
                 ORDER BY watch_date, id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([format_date(&from)], watch_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(Watch::try_from).collect()
        })
    }

    pub fn apply_watch_update(&self, id: Uuid, update: &WatchUpdate) -> Result<()> {
        let updated_at = format_timestamp(&update.updated_at);
        let changed = self.with_conn_mut(|conn| {
            let changed = match &update.last_price {
                Some(last_price) => conn.execute(
                    "UPDATE watch SET last_price = ?1, updated_at = ?2 WHERE id = ?3",
                    (
                        last_price.as_ref().map(Price::as_str),
                        &updated_at,
                        id.to_string(),
                    ),
                )?,
                None => conn.execute(
                    "UPDATE watch SET updated_at = ?1 WHERE id = ?2",
                    (&updated_at, id.to_string()),
                )?,
            };
            Ok(changed)
        })?;

        if changed == 0 {
            bail!("watch {} not found", id);
        }
        Ok(())
    }

    // Disabling leaves updated_at alone; only reconciliation passes stamp it.

    /// Returns false if the watch does not exist.
    pub fn disable_watch(&self, id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE watch SET is_enabled = 0 WHERE id = ?1",
                [id.to_string()],
            )?;
            Ok(changed > 0)
        })
    }

    /// Disables every enabled watch dated before `today`.
    pub fn disable_expired_watches(&self, today: NaiveDate) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE watch SET is_enabled = 0
                 WHERE is_enabled = 1 AND watch_date < ?1",
                [format_date(&today)],
            )?;
            Ok(changed)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<User>> {
    let sql = format!("SELECT id, email, created_at FROM users WHERE {column} = ?1");
    let row = conn
        .query_row(&sql, [value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                created_at: row.get(2)?,
            })
        })
        .optional()?;

    row.map(User::try_from).transpose()
}

fn watch_row(row: &Row) -> rusqlite::Result<WatchRow> {
    Ok(WatchRow {
        id: row.get(0)?,
        user: row.get(1)?,
        watch_date: row.get(2)?,
        is_enabled: row.get(3)?,
        last_price: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
