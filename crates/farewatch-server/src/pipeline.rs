use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use farewatch_core::{
    DumpDirSource, FareRecorder, FareSource, JsonDumpSource, MailTransport, Notifier,
    PriceExtractor, Reconciler, run_scrape,
};
use farewatch_db::Database;

/// Scrape, record and reconcile, wired to one database and mail transport.
pub struct Pipeline {
    db: Database,
    extractor: PriceExtractor,
    recorder: FareRecorder,
    reconciler: Reconciler,
}

impl Pipeline {
    pub fn new(db: Database, transport: Arc<dyn MailTransport>, currency_prefix: &str) -> Self {
        let store = Arc::new(db.clone());
        Self {
            extractor: PriceExtractor::new(currency_prefix),
            recorder: FareRecorder::new(store.clone()),
            reconciler: Reconciler::new(store.clone(), store.clone(), store, Notifier::new(transport)),
            db,
        }
    }

    pub async fn scrape(&self, source: &dyn FareSource) -> Result<()> {
        run_scrape(source, &self.extractor, &self.recorder).await?;
        Ok(())
    }

    pub async fn reconcile(&self) -> Result<()> {
        self.reconciler.run_pass().await?;
        Ok(())
    }

    /// Disables watches whose date has passed.
    pub async fn expire_watches(&self) -> Result<usize> {
        let db = self.db.clone();
        let today = Utc::now().date_naive();
        tokio::task::spawn_blocking(move || db.disable_expired_watches(today)).await?
    }
}

/// Background task that, on every tick, expires past watches, records the
/// newest fare capture if it has not been seen yet, and runs a
/// reconciliation pass.
pub async fn run_loop(pipeline: Arc<Pipeline>, dump_dir: PathBuf, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    let source = DumpDirSource::new(dump_dir);
    let mut last_capture: Option<PathBuf> = None;

    loop {
        interval.tick().await;

        match pipeline.expire_watches().await {
            Ok(count) => {
                if count > 0 {
                    info!("Expiry: disabled {} past watches", count);
                }
            }
            Err(e) => warn!("Expiry error: {:#}", e),
        }

        match source.newest_dump().await {
            Ok(Some(path)) if last_capture.as_ref() != Some(&path) => {
                let capture = JsonDumpSource::new(&path);
                match pipeline.scrape(&capture).await {
                    Ok(()) => last_capture = Some(path),
                    Err(e) => warn!("Scrape error for {}: {:#}", path.display(), e),
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Scrape error: {:#}", e),
        }

        if let Err(e) = pipeline.reconcile().await {
            warn!("Reconcile error: {:#}", e);
        }
    }
}
