// src/loader/types.rs
use anyhow::Result;

use crate::currency::Currency;
use crate::measures::MeasureKey;
use crate::series::SeriesFile;

/// A place index datasets are published.
///
/// `Ok(None)` means the dataset is not published for that currency, which
/// is permanent and never retried. `Err` is a transient failure
/// (network, I/O, malformed payload) and is retried with backoff.
#[async_trait::async_trait]
pub trait SeriesSource: Send + Sync {
    /// The CPI-like base index every currency publishes.
    async fn fetch_base(&self, currency: Currency) -> Result<Option<SeriesFile>>;

    /// One of the six per-measure datasets.
    async fn fetch_measure(&self, currency: Currency, key: MeasureKey)
        -> Result<Option<SeriesFile>>;

    fn name(&self) -> &'static str;
}
