//! Watch reconciliation: compare every active watch against the latest day
//! record for its date and notify the owner when the price moved.
//!
//! A pass is strictly sequential. Each watch is fully fetched, compared,
//! notified and persisted before the next one starts. Notification happens
//! before persistence, so delivery is at-least-once: if the state write fails
//! after a send, `last_price` stays behind and the next pass sends again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use farewatch_types::{Watch, WatchUpdate};

use crate::notifier::{Notifier, NotifyError, PriceChange};
use crate::store::{DayRecordStore, UserDirectory, WatchStore};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("failed to list active watches: {0:#}")]
    ListWatches(#[source] anyhow::Error),
}

/// Why a single watch could not be reconciled. Never aborts a pass.
#[derive(Debug, thiserror::Error)]
enum WatchError {
    #[error("day record lookup failed: {0:#}")]
    DayRecord(anyhow::Error),
    #[error("user lookup failed: {0:#}")]
    UserLookup(anyhow::Error),
    #[error("user {0} not found")]
    UserNotFound(Uuid),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("failed to refresh watch: {0:#}")]
    Touch(anyhow::Error),
}

/// What happened to one watch during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Price changed, email sent, state advanced.
    Notified,
    /// Price unchanged, only `updated_at` refreshed.
    Unchanged,
    /// No day record for the date yet; watch untouched.
    NoRecord,
    /// Lookup, send or refresh failed; watch state not advanced.
    Failed,
    /// Email sent but the new state could not be written.
    PersistFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub examined: usize,
    pub notified: usize,
    pub unchanged: usize,
    pub no_record: usize,
    pub failed: usize,
    pub persist_failed: usize,
}

impl PassReport {
    fn tally(&mut self, outcome: WatchOutcome) {
        self.examined += 1;
        match outcome {
            WatchOutcome::Notified => self.notified += 1,
            WatchOutcome::Unchanged => self.unchanged += 1,
            WatchOutcome::NoRecord => self.no_record += 1,
            WatchOutcome::Failed => self.failed += 1,
            WatchOutcome::PersistFailed => self.persist_failed += 1,
        }
    }
}

pub struct Reconciler {
    days: Arc<dyn DayRecordStore>,
    watches: Arc<dyn WatchStore>,
    users: Arc<dyn UserDirectory>,
    notifier: Notifier,
}

impl Reconciler {
    pub fn new(
        days: Arc<dyn DayRecordStore>,
        watches: Arc<dyn WatchStore>,
        users: Arc<dyn UserDirectory>,
        notifier: Notifier,
    ) -> Self {
        Self {
            days,
            watches,
            users,
            notifier,
        }
    }

    pub async fn run_pass(&self) -> Result<PassReport, ReconcileError> {
        self.run_pass_at(Utc::now()).await
    }

    /// Runs one pass as if the current time were `now`. Watches dated before
    /// `now`'s UTC date are not considered.
    pub async fn run_pass_at(&self, now: DateTime<Utc>) -> Result<PassReport, ReconcileError> {
        let today = now.date_naive();
        let watches = self
            .watches
            .active_watches(today)
            .await
            .map_err(ReconcileError::ListWatches)?;

        debug!(count = watches.len(), from = %today, "Reconciling active watches");

        let mut report = PassReport::default();
        for watch in &watches {
            let outcome = match self.reconcile_watch(watch, now).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(watch_id = %watch.id, date = %watch.watch_date, "Skipping watch: {}", e);
                    WatchOutcome::Failed
                }
            };
            report.tally(outcome);
        }

        info!(
            examined = report.examined,
            notified = report.notified,
            unchanged = report.unchanged,
            no_record = report.no_record,
            failed = report.failed,
            persist_failed = report.persist_failed,
            "Reconciliation pass complete"
        );
        Ok(report)
    }

    async fn reconcile_watch(
        &self,
        watch: &Watch,
        now: DateTime<Utc>,
    ) -> Result<WatchOutcome, WatchError> {
        let Some(record) = self
            .days
            .latest_by_date(watch.watch_date)
            .await
            .map_err(WatchError::DayRecord)?
        else {
            debug!(watch_id = %watch.id, date = %watch.watch_date, "No day record yet");
            return Ok(WatchOutcome::NoRecord);
        };

        if watch.last_price == record.price {
            self.watches
                .update_watch(watch.id, WatchUpdate::touch(now))
                .await
                .map_err(WatchError::Touch)?;
            return Ok(WatchOutcome::Unchanged);
        }

        info!(
            watch_id = %watch.id,
            date = %watch.watch_date,
            from = ?watch.last_price.as_ref().map(|p| p.as_str()),
            to = ?record.price.as_ref().map(|p| p.as_str()),
            "Price changed"
        );

        let user = self
            .users
            .user_by_id(watch.user)
            .await
            .map_err(WatchError::UserLookup)?
            .ok_or(WatchError::UserNotFound(watch.user))?;

        let change = PriceChange {
            watch_date: watch.watch_date,
            previous: watch.last_price.as_ref(),
            current: record.price.as_ref(),
            raw_text: &record.raw_text,
        };
        self.notifier.notify(&user.email, &change).await?;

        if let Err(e) = self
            .watches
            .update_watch(watch.id, WatchUpdate::advance(record.price.clone(), now))
            .await
        {
            error!(
                watch_id = %watch.id,
                date = %watch.watch_date,
                "Notification sent but watch state was not saved; it will be sent again next pass: {:#}",
                e
            );
            return Ok(WatchOutcome::PersistFailed);
        }

        Ok(WatchOutcome::Notified)
    }
}
