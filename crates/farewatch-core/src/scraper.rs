//! Fare calendar sources and the scrape pass that feeds the recorder.
//!
//! The browser automation writes each calendar capture as a JSON array of
//! `{ "fulldate": ..., "value": ... }` objects, one per date button. Sources
//! here read those captures back.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use farewatch_types::NewDayRecord;

use crate::price::PriceExtractor;
use crate::recorder::{FareRecorder, RecordError};

const DUMP_PREFIX: &str = "flight-result--";
const DUMP_SUFFIX: &str = ".json";

/// One date button of the fare calendar, as captured. Either attribute may
/// be missing from the button, in which case the capture holds `null`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawFare {
    #[serde(default)]
    pub fulldate: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[async_trait]
pub trait FareSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawFare>>;
}

/// Reads a single capture file.
pub struct JsonDumpSource {
    path: PathBuf,
}

impl JsonDumpSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FareSource for JsonDumpSource {
    async fn fetch(&self) -> Result<Vec<RawFare>> {
        read_dump(&self.path).await
    }
}

/// Reads the newest `flight-result--<timestamp>.json` capture in a directory.
pub struct DumpDirSource {
    dir: PathBuf,
}

impl DumpDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn newest_dump(&self) -> Result<Option<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("reading dump directory {}", self.dir.display()))?;

        let mut newest: Option<String> = None;
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !name.starts_with(DUMP_PREFIX) || !name.ends_with(DUMP_SUFFIX) {
                continue;
            }
            // Timestamps are ISO-8601, so names sort chronologically.
            if newest.as_ref().is_none_or(|n| name > *n) {
                newest = Some(name);
            }
        }

        Ok(newest.map(|name| self.dir.join(name)))
    }
}

#[async_trait]
impl FareSource for DumpDirSource {
    async fn fetch(&self) -> Result<Vec<RawFare>> {
        match self.newest_dump().await? {
            Some(path) => read_dump(&path).await,
            None => {
                warn!("No fare captures found in {}", self.dir.display());
                Ok(vec![])
            }
        }
    }
}

async fn read_dump(path: &Path) -> Result<Vec<RawFare>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading fare capture {}", path.display()))?;
    let fares: Vec<RawFare> = serde_json::from_str(&text)
        .with_context(|| format!("parsing fare capture {}", path.display()))?;
    debug!(count = fares.len(), "Loaded fare capture {}", path.display());
    Ok(fares)
}

/// Accepts `2024-08-02` and `2024/08/02`.
pub fn parse_fare_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s.trim(), "%Y/%m/%d"))
        .ok()
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("failed to fetch fares: {0:#}")]
    Fetch(#[source] anyhow::Error),
    #[error(transparent)]
    Record(#[from] RecordError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeReport {
    pub fetched: usize,
    pub recorded: usize,
    pub unavailable: usize,
    pub skipped: usize,
}

/// Fetches one calendar capture, extracts prices and records the valid
/// observations. Malformed dates and labels are logged and skipped.
pub async fn run_scrape(
    source: &dyn FareSource,
    extractor: &PriceExtractor,
    recorder: &FareRecorder,
) -> Result<ScrapeReport, ScrapeError> {
    let fares = source.fetch().await.map_err(ScrapeError::Fetch)?;

    let mut report = ScrapeReport {
        fetched: fares.len(),
        ..Default::default()
    };

    let mut batch = Vec::with_capacity(fares.len());
    for fare in fares {
        let Some(content_date) = fare.fulldate.as_deref().and_then(parse_fare_date) else {
            warn!(fulldate = ?fare.fulldate, "Skipping fare with unparseable date");
            report.skipped += 1;
            continue;
        };
        let Some(value) = fare.value else {
            warn!(date = %content_date, "Skipping fare with no label");
            report.skipped += 1;
            continue;
        };

        match extractor.extract(&value) {
            Ok(price) => {
                if price.is_none() {
                    report.unavailable += 1;
                }
                batch.push(NewDayRecord {
                    content_date,
                    raw_text: value,
                    price,
                });
            }
            Err(e) => {
                warn!(date = %content_date, "Skipping fare: {}", e);
                report.skipped += 1;
            }
        }
    }

    report.recorded = recorder.record(batch).await?.len();

    info!(
        fetched = report.fetched,
        recorded = report.recorded,
        unavailable = report.unavailable,
        skipped = report.skipped,
        "Scrape pass complete"
    );
    Ok(report)
}
