//! Database row types. These map directly to SQLite rows and are converted
//! into the shared `farewatch-types` models at the query boundary.
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use farewatch_types::{DayRecord, Price, User, Watch};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

pub struct DayRecordRow {
    pub content_date: String,
    pub raw_text: String,
    pub price: Option<String>,
    pub created_at: String,
}

pub struct WatchRow {
    pub id: String,
    pub user: String,
    pub watch_date: String,
    pub is_enabled: bool,
    pub last_price: Option<String>,
    pub updated_at: String,
}

/// Fixed-width UTC timestamps so that text ordering matches time ordering.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("corrupt {field} '{value}'"))
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).with_context(|| format!("corrupt {field} '{value}'"))
}

fn parse_price(value: Option<String>, field: &str) -> Result<Option<Price>> {
    value
        .map(|v| v.parse::<Price>().with_context(|| format!("corrupt {field}")))
        .transpose()
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id.parse().with_context(|| format!("corrupt user id '{}'", row.id))?,
            email: row.email,
            created_at: parse_timestamp(&row.created_at, "created_at")?,
        })
    }
}

impl TryFrom<DayRecordRow> for DayRecord {
    type Error = anyhow::Error;

    fn try_from(row: DayRecordRow) -> Result<Self> {
        Ok(DayRecord {
            content_date: parse_date(&row.content_date, "content_date")?,
            raw_text: row.raw_text,
            price: parse_price(row.price, "price")?,
            created_at: parse_timestamp(&row.created_at, "created_at")?,
        })
    }
}

impl TryFrom<WatchRow> for Watch {
    type Error = anyhow::Error;

    fn try_from(row: WatchRow) -> Result<Self> {
        Ok(Watch {
            id: row.id.parse().with_context(|| format!("corrupt watch id '{}'", row.id))?,
            user: row
                .user
                .parse()
                .with_context(|| format!("corrupt user '{}' on watch '{}'", row.user, row.id))?,
            watch_date: parse_date(&row.watch_date, "watch_date")?,
            is_enabled: row.is_enabled,
            last_price: parse_price(row.last_price, "last_price")?,
            updated_at: parse_timestamp(&row.updated_at, "updated_at")?,
        })
    }
}
