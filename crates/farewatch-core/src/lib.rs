/// Fare Watch core: turns fare-calendar captures into day records and keeps
/// subscribers informed when the price of a watched date moves.
///
/// - Price extraction from calendar labels
/// - Append-only recording of day records
/// - Sequential watch reconciliation with per-watch failure isolation
/// - Price-change message formatting over a pluggable mail transport

pub mod notifier;
pub mod price;
pub mod reconciler;
pub mod recorder;
pub mod scraper;
pub mod store;

pub use notifier::{DeliveryId, MailTransport, Notifier, NotifyError, PriceChange};
pub use price::{DEFAULT_CURRENCY_PREFIX, ExtractError, PriceExtractor, extract_price};
pub use reconciler::{PassReport, ReconcileError, Reconciler, WatchOutcome};
pub use recorder::{FareRecorder, RecordError};
pub use scraper::{
    DumpDirSource, FareSource, JsonDumpSource, RawFare, ScrapeError, ScrapeReport, run_scrape,
};
pub use store::{DayRecordStore, UserDirectory, WatchStore};
