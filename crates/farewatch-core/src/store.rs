//! Storage collaborators consumed by the recorder and the reconciler.
//!
//! Implementations live outside this crate (sqlite in `farewatch-db`, fakes
//! in tests) and are injected as `Arc<dyn ...>`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use farewatch_types::{DayRecord, NewDayRecord, User, Watch, WatchUpdate};

#[async_trait]
pub trait DayRecordStore: Send + Sync {
    /// Appends the batch, stamping each record with its write time.
    /// All records are persisted or none are.
    async fn insert_batch(&self, records: Vec<NewDayRecord>) -> Result<Vec<DayRecord>>;

    /// The record with the greatest `created_at` for `date`, if any.
    async fn latest_by_date(&self, date: NaiveDate) -> Result<Option<DayRecord>>;
}

#[async_trait]
pub trait WatchStore: Send + Sync {
    /// Enabled watches whose `watch_date` is on or after `from`.
    async fn active_watches(&self, from: NaiveDate) -> Result<Vec<Watch>>;

    async fn update_watch(&self, id: Uuid, update: WatchUpdate) -> Result<()>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>>;
}
