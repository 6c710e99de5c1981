use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::currency::Currency;
use crate::loader::types::SeriesSource;
use crate::measures::MeasureKey;
use crate::series::SeriesFile;

/// Reads datasets from a local directory:
///
/// ```text
/// <root>/<cur>/base.json
/// <root>/<cur>/measures/<measure>.json
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_path(&self, currency: Currency) -> PathBuf {
        self.root.join(currency.slug()).join("base.json")
    }

    pub fn measure_path(&self, currency: Currency, key: MeasureKey) -> PathBuf {
        self.root
            .join(currency.slug())
            .join("measures")
            .join(format!("{}.json", key.slug()))
    }

    async fn read(path: &Path) -> Result<Option<SeriesFile>> {
        let t0 = std::time::Instant::now();
        let content = match tokio::fs::read_to_string(path).await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading dataset {}", path.display()))
            }
        };
        let file = SeriesFile::from_json_str(&content)
            .with_context(|| format!("parsing dataset {}", path.display()))?;
        histogram!("dataset_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(Some(file))
    }
}

#[async_trait]
impl SeriesSource for FileSource {
    async fn fetch_base(&self, currency: Currency) -> Result<Option<SeriesFile>> {
        Self::read(&self.base_path(currency)).await
    }

    async fn fetch_measure(
        &self,
        currency: Currency,
        key: MeasureKey,
    ) -> Result<Option<SeriesFile>> {
        Self::read(&self.measure_path(currency, key)).await
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
