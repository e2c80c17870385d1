use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error};

use farewatch_types::{DayRecord, NewDayRecord};

use crate::store::DayRecordStore;

#[derive(Debug, thiserror::Error)]
#[error("failed to persist {count} day record(s) for {dates:?}: {source}")]
pub struct RecordError {
    pub count: usize,
    pub dates: Vec<NaiveDate>,
    #[source]
    pub source: anyhow::Error,
}

/// Appends the observations of one scrape pass as immutable day records.
#[derive(Clone)]
pub struct FareRecorder {
    store: Arc<dyn DayRecordStore>,
}

impl FareRecorder {
    pub fn new(store: Arc<dyn DayRecordStore>) -> Self {
        Self { store }
    }

    /// The store persists the batch as a whole, so on failure every record of
    /// the batch is reported as not persisted.
    pub async fn record(&self, batch: Vec<NewDayRecord>) -> Result<Vec<DayRecord>, RecordError> {
        if batch.is_empty() {
            return Ok(vec![]);
        }

        let dates: Vec<NaiveDate> = batch.iter().map(|r| r.content_date).collect();
        let count = batch.len();

        match self.store.insert_batch(batch).await {
            Ok(records) => {
                debug!(count = records.len(), "Recorded day records");
                Ok(records)
            }
            Err(source) => {
                error!(count, "Day record batch insert failed: {:#}", source);
                Err(RecordError {
                    count,
                    dates,
                    source,
                })
            }
        }
    }
}
