use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::currency::Currency;
use crate::loader::types::SeriesSource;
use crate::measures::MeasureKey;
use crate::series::SeriesFile;

/// Fetches datasets over HTTP using the same layout as `FileSource`,
/// rooted at `base_url`. A 404 means "not published".
#[derive(Clone)]
pub struct HttpSource {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn base_url_for(&self, currency: Currency) -> String {
        format!("{}/{}/base.json", self.base_url, currency.slug())
    }

    pub fn measure_url_for(&self, currency: Currency, key: MeasureKey) -> String {
        format!(
            "{}/{}/measures/{}.json",
            self.base_url,
            currency.slug(),
            key.slug()
        )
    }

    async fn get(&self, url: &str) -> Result<Option<SeriesFile>> {
        let rsp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        if rsp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let rsp = rsp
            .error_for_status()
            .with_context(|| format!("GET {url} returned an error status"))?;
        let body = rsp.text().await.with_context(|| format!("reading body of {url}"))?;
        let file = SeriesFile::from_json_str(&body).with_context(|| format!("parsing {url}"))?;
        Ok(Some(file))
    }
}

#[async_trait]
impl SeriesSource for HttpSource {
    async fn fetch_base(&self, currency: Currency) -> Result<Option<SeriesFile>> {
        self.get(&self.base_url_for(currency)).await
    }

    async fn fetch_measure(
        &self,
        currency: Currency,
        key: MeasureKey,
    ) -> Result<Option<SeriesFile>> {
        self.get(&self.measure_url_for(currency, key)).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
