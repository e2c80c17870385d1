//! In-memory collaborators for exercising the core without a database or a
//! mail provider.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use farewatch_core::{
    DayRecordStore, DeliveryId, MailTransport, Notifier, Reconciler, UserDirectory, WatchStore,
};
use farewatch_types::{DayRecord, NewDayRecord, Price, User, Watch, WatchUpdate};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, h, 0, 0).unwrap()
}

pub fn price(s: &str) -> Price {
    s.parse().unwrap()
}

#[derive(Default)]
struct Inner {
    days: Vec<DayRecord>,
    watches: Vec<Watch>,
    users: Vec<User>,
    fail_insert: bool,
    fail_list: bool,
    fail_day_lookup: HashSet<NaiveDate>,
    fail_update: HashSet<Uuid>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().users.push(User {
            id,
            email: email.to_string(),
            created_at: at(0),
        });
        id
    }

    pub fn add_watch(&self, user: Uuid, watch_date: NaiveDate, last_price: Option<Price>) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().watches.push(Watch {
            id,
            user,
            watch_date,
            is_enabled: true,
            last_price,
            updated_at: at(0),
        });
        id
    }

    pub fn disable_watch(&self, id: Uuid) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(w) = inner.watches.iter_mut().find(|w| w.id == id) {
            w.is_enabled = false;
        }
    }

    pub fn add_day(&self, content_date: NaiveDate, price: Option<Price>, created_at: DateTime<Utc>) {
        self.inner.lock().unwrap().days.push(DayRecord {
            content_date,
            raw_text: format!("label for {content_date}"),
            price,
            created_at,
        });
    }

    pub fn watch(&self, id: Uuid) -> Watch {
        self.inner
            .lock()
            .unwrap()
            .watches
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .unwrap()
    }

    pub fn day_count(&self) -> usize {
        self.inner.lock().unwrap().days.len()
    }

    pub fn fail_insert(&self, fail: bool) {
        self.inner.lock().unwrap().fail_insert = fail;
    }

    pub fn fail_list(&self, fail: bool) {
        self.inner.lock().unwrap().fail_list = fail;
    }

    pub fn fail_day_lookup(&self, date: NaiveDate) {
        self.inner.lock().unwrap().fail_day_lookup.insert(date);
    }

    pub fn fail_update(&self, id: Uuid, fail: bool) {
        let mut inner = self.inner.lock().unwrap();
        if fail {
            inner.fail_update.insert(id);
        } else {
            inner.fail_update.remove(&id);
        }
    }
}

#[async_trait]
impl DayRecordStore for MemoryStore {
    async fn insert_batch(&self, records: Vec<NewDayRecord>) -> Result<Vec<DayRecord>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_insert {
            bail!("store unavailable");
        }
        let now = Utc::now();
        let stamped: Vec<DayRecord> = records
            .into_iter()
            .map(|r| DayRecord {
                content_date: r.content_date,
                raw_text: r.raw_text,
                price: r.price,
                created_at: now,
            })
            .collect();
        inner.days.extend(stamped.iter().cloned());
        Ok(stamped)
    }

    async fn latest_by_date(&self, date: NaiveDate) -> Result<Option<DayRecord>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_day_lookup.contains(&date) {
            bail!("day record lookup timed out");
        }
        // max_by_key keeps the last of equal keys, i.e. the most recent insert.
        Ok(inner
            .days
            .iter()
            .filter(|r| r.content_date == date)
            .max_by_key(|r| r.created_at)
            .cloned())
    }
}

#[async_trait]
impl WatchStore for MemoryStore {
    async fn active_watches(&self, from: NaiveDate) -> Result<Vec<Watch>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_list {
            bail!("watch table unavailable");
        }
        Ok(inner
            .watches
            .iter()
            .filter(|w| w.is_enabled && w.watch_date >= from)
            .cloned()
            .collect())
    }

    async fn update_watch(&self, id: Uuid, update: WatchUpdate) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_update.contains(&id) {
            bail!("write rejected");
        }
        let Some(watch) = inner.watches.iter_mut().find(|w| w.id == id) else {
            bail!("watch {id} not found");
        };
        if let Some(last_price) = update.last_price {
            watch.last_price = last_price;
        }
        watch.updated_at = update.updated_at;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }
}

#[derive(Debug, Clone)]
pub struct Sent {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_for(&self, to: &str, fail: bool) {
        let mut failing = self.failing.lock().unwrap();
        if fail {
            failing.insert(to.to_string());
        } else {
            failing.remove(to);
        }
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<DeliveryId> {
        if self.failing.lock().unwrap().contains(to) {
            bail!("mail provider returned 503");
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(Sent {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(DeliveryId(format!("<{}@test>", sent.len())))
    }
}

pub fn reconciler(store: &Arc<MemoryStore>, transport: &Arc<RecordingTransport>) -> Reconciler {
    Reconciler::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Notifier::new(transport.clone()),
    )
}
