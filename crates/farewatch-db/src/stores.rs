//! Store traits backed by sqlite. Queries are blocking, so each call runs
//! on the blocking pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use farewatch_core::{DayRecordStore, UserDirectory, WatchStore};
use farewatch_types::{DayRecord, NewDayRecord, User, Watch, WatchUpdate};

use crate::Database;

async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("spawn_blocking join error")?
}

#[async_trait]
impl DayRecordStore for Database {
    async fn insert_batch(&self, records: Vec<NewDayRecord>) -> Result<Vec<DayRecord>> {
        let db = self.clone();
        blocking(move || db.insert_day_records(records, Utc::now())).await
    }

    async fn latest_by_date(&self, date: NaiveDate) -> Result<Option<DayRecord>> {
        let db = self.clone();
        blocking(move || db.get_latest_day_record(date)).await
    }
}

#[async_trait]
impl WatchStore for Database {
    async fn active_watches(&self, from: NaiveDate) -> Result<Vec<Watch>> {
        let db = self.clone();
        blocking(move || db.get_active_watches(from)).await
    }

    async fn update_watch(&self, id: Uuid, update: WatchUpdate) -> Result<()> {
        let db = self.clone();
        blocking(move || db.apply_watch_update(id, &update)).await
    }
}

#[async_trait]
impl UserDirectory for Database {
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let db = self.clone();
        blocking(move || db.get_user_by_id(id)).await
    }
}
