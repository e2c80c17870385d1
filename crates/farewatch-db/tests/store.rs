use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use farewatch_core::{
    DayRecordStore, DeliveryId, MailTransport, Notifier, Reconciler, UserDirectory, WatchStore,
};
use farewatch_db::Database;
use farewatch_types::{NewDayRecord, Price, User, Watch, WatchUpdate};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
}

fn price(s: &str) -> Price {
    s.parse().unwrap()
}

fn day(content_date: NaiveDate, p: Option<&str>) -> NewDayRecord {
    NewDayRecord {
        content_date,
        raw_text: format!("Standard seat - {content_date} - {}", p.unwrap_or("no seats")),
        price: p.map(price),
    }
}

fn seed_user(db: &Database, email: &str) -> Uuid {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        created_at: noon(),
    };
    assert!(db.create_user(&user).unwrap());
    user.id
}

fn seed_watch(db: &Database, user: Uuid, watch_date: NaiveDate) -> Uuid {
    let watch = Watch {
        id: Uuid::new_v4(),
        user,
        watch_date,
        is_enabled: true,
        last_price: None,
        updated_at: noon(),
    };
    db.create_watch(&watch).unwrap();
    watch.id
}

#[test]
fn reopening_a_database_keeps_its_rows() {
    let path = std::env::temp_dir().join(format!("farewatch_{}.db", Uuid::new_v4()));

    let user = {
        let db = Database::open(&path).unwrap();
        seed_user(&db, "ana@example.com")
    };
    let db = Database::open(&path).unwrap();
    assert_eq!(db.get_user_by_id(user).unwrap().unwrap().email, "ana@example.com");
    assert_eq!(db.get_user_by_email("ana@example.com").unwrap().unwrap().id, user);
    assert!(db.get_user_by_email("bob@example.com").unwrap().is_none());

    drop(db);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn inserted_batch_is_latest_for_its_date() {
    let db = Database::open_in_memory().unwrap();

    db.insert_batch(vec![day(date(2024, 8, 2), Some("900"))]).await.unwrap();
    let written = db
        .insert_batch(vec![day(date(2024, 8, 1), None), day(date(2024, 8, 2), Some("810.67"))])
        .await
        .unwrap();

    let latest = db.latest_by_date(date(2024, 8, 2)).await.unwrap().unwrap();
    assert_eq!(latest.price, Some(price("810.67")));
    assert_eq!(latest.raw_text, written[1].raw_text);

    let unavailable = db.latest_by_date(date(2024, 8, 1)).await.unwrap().unwrap();
    assert_eq!(unavailable.price, None);

    assert!(db.latest_by_date(date(2024, 8, 3)).await.unwrap().is_none());
}

#[test]
fn same_instant_ties_go_to_the_last_insert() {
    let db = Database::open_in_memory().unwrap();
    let at = noon();

    db.insert_day_records(vec![day(date(2024, 8, 2), Some("1"))], at).unwrap();
    db.insert_day_records(vec![day(date(2024, 8, 2), Some("2"))], at).unwrap();
    db.insert_day_records(vec![day(date(2024, 8, 2), Some("0"))], at - Duration::hours(1))
        .unwrap();

    let latest = db.get_latest_day_record(date(2024, 8, 2)).unwrap().unwrap();
    assert_eq!(latest.price, Some(price("2")));
    assert_eq!(latest.created_at, at);
}

#[tokio::test]
async fn active_watches_skip_disabled_and_past_dates() {
    let db = Database::open_in_memory().unwrap();
    let user = seed_user(&db, "ana@example.com");
    seed_watch(&db, user, date(2024, 6, 30));
    let today = seed_watch(&db, user, date(2024, 7, 1));
    let later = seed_watch(&db, user, date(2024, 8, 2));
    let disabled = seed_watch(&db, user, date(2024, 8, 3));
    assert!(db.disable_watch(disabled).unwrap());

    let active = db.active_watches(date(2024, 7, 1)).await.unwrap();
    let ids: Vec<Uuid> = active.iter().map(|w| w.id).collect();
    assert_eq!(ids, vec![today, later]);
}

#[tokio::test]
async fn touch_keeps_last_price_and_advance_replaces_it() {
    let db = Database::open_in_memory().unwrap();
    let user = seed_user(&db, "ana@example.com");
    let id = seed_watch(&db, user, date(2024, 8, 2));
    let later = noon() + Duration::hours(1);

    db.update_watch(id, WatchUpdate::advance(Some(price("810.67")), noon()))
        .await
        .unwrap();
    db.update_watch(id, WatchUpdate::touch(later)).await.unwrap();

    let watch = db.get_watch(id).unwrap().unwrap();
    assert_eq!(watch.last_price, Some(price("810.67")));
    assert_eq!(watch.updated_at, later);

    db.update_watch(id, WatchUpdate::advance(None, later)).await.unwrap();
    assert_eq!(db.get_watch(id).unwrap().unwrap().last_price, None);
}

#[tokio::test]
async fn updating_an_unknown_watch_fails() {
    let db = Database::open_in_memory().unwrap();
    let err = db
        .update_watch(Uuid::new_v4(), WatchUpdate::touch(noon()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn watch_requires_an_existing_user() {
    let db = Database::open_in_memory().unwrap();
    let watch = Watch {
        id: Uuid::new_v4(),
        user: Uuid::new_v4(),
        watch_date: date(2024, 8, 2),
        is_enabled: true,
        last_price: None,
        updated_at: noon(),
    };
    assert!(db.create_watch(&watch).is_err());
}

#[test]
fn expired_watches_are_disabled_not_deleted() {
    let db = Database::open_in_memory().unwrap();
    let user = seed_user(&db, "ana@example.com");
    let past = seed_watch(&db, user, date(2024, 6, 30));
    let future = seed_watch(&db, user, date(2024, 8, 2));

    assert_eq!(db.disable_expired_watches(date(2024, 7, 5)).unwrap(), 1);
    assert_eq!(db.disable_expired_watches(date(2024, 7, 5)).unwrap(), 0);

    let past = db.get_watch(past).unwrap().unwrap();
    assert!(!past.is_enabled);
    assert_eq!(past.updated_at, noon());
    assert!(db.get_watch(future).unwrap().unwrap().is_enabled);
}

#[test]
fn unsubscribing_keeps_the_last_reconciliation_time() {
    let db = Database::open_in_memory().unwrap();
    let user = seed_user(&db, "ana@example.com");
    let id = seed_watch(&db, user, date(2024, 8, 2));

    assert!(db.disable_watch(id).unwrap());
    assert!(!db.disable_watch(Uuid::new_v4()).unwrap());

    let watch = db.get_watch(id).unwrap().unwrap();
    assert!(!watch.is_enabled);
    assert_eq!(watch.updated_at, noon());
}

#[test]
fn duplicate_email_is_not_inserted() {
    let db = Database::open_in_memory().unwrap();
    let first = seed_user(&db, "ana@example.com");
    let second = User {
        id: Uuid::new_v4(),
        email: "ana@example.com".to_string(),
        created_at: noon(),
    };

    assert!(!db.create_user(&second).unwrap());
    assert_eq!(db.get_user_by_email("ana@example.com").unwrap().unwrap().id, first);
    assert!(db.get_user_by_id(second.id).unwrap().is_none());
}

#[tokio::test]
async fn user_directory_resolves_email() {
    let db = Database::open_in_memory().unwrap();
    let id = seed_user(&db, "ana@example.com");

    assert_eq!(db.user_by_id(id).await.unwrap().unwrap().email, "ana@example.com");
    assert!(db.user_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[derive(Default)]
struct Outbox(Mutex<Vec<(String, String)>>);

#[async_trait]
impl MailTransport for Outbox {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<DeliveryId> {
        self.0.lock().unwrap().push((to.to_string(), subject.to_string()));
        Ok(DeliveryId("queued".into()))
    }
}

#[tokio::test]
async fn reconciler_over_sqlite_is_idempotent() {
    let db = Database::open_in_memory().unwrap();
    let user = seed_user(&db, "ana@example.com");
    let id = seed_watch(&db, user, date(2024, 8, 2));
    db.insert_batch(vec![day(date(2024, 8, 2), Some("810.67"))]).await.unwrap();

    let outbox = Arc::new(Outbox::default());
    let store = Arc::new(db.clone());
    let reconciler = Reconciler::new(
        store.clone(),
        store.clone(),
        store,
        Notifier::new(outbox.clone()),
    );

    let first = reconciler.run_pass_at(noon()).await.unwrap();
    let second = reconciler.run_pass_at(noon() + Duration::hours(1)).await.unwrap();

    assert_eq!(first.notified, 1);
    assert_eq!(second.notified, 0);
    assert_eq!(second.unchanged, 1);
    assert_eq!(
        outbox.0.lock().unwrap().as_slice(),
        &[("ana@example.com".to_string(), "Price change alert for 2024-08-02".to_string())]
    );

    let watch = db.get_watch(id).unwrap().unwrap();
    assert_eq!(watch.last_price, Some(price("810.67")));
    assert_eq!(watch.updated_at, noon() + Duration::hours(1));
}
