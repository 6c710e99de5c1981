// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::consensus::WeightingMode;
use crate::currency::Currency;
use crate::loader::retry::RetryPolicy;
use crate::loader::types::SeriesSource;
use crate::loader::{FileSource, HttpSource};

pub const ENV_CONFIG_PATH: &str = "INFLATION_CONFIG_PATH";
pub const ENV_DATA_DIR: &str = "INFLATION_DATA_DIR";
pub const ENV_REMOTE_URL: &str = "INFLATION_REMOTE_URL";

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_currency() -> Currency {
    Currency::Usd
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Root of the local dataset tree.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// When set, datasets are fetched over HTTP instead of from `data_dir`.
    #[serde(default)]
    pub remote_base_url: Option<String>,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub weighting: WeightingMode,
    #[serde(default = "default_currency")]
    pub default_currency: Currency,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            remote_base_url: None,
            retry: RetryPolicy::default(),
            weighting: WeightingMode::default(),
            default_currency: default_currency(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit path. TOML or JSON, picked by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, &ext)?;
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $INFLATION_CONFIG_PATH
    /// 2) config/app.toml
    /// 3) config/app.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new("config/app.toml").exists() {
            Self::load_from(Path::new("config/app.toml"))?
        } else if Path::new("config/app.json").exists() {
            Self::load_from(Path::new("config/app.json"))?
        } else {
            Self::default()
        };

        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                cfg.data_dir = PathBuf::from(dir.trim());
            }
        }
        if let Ok(url) = std::env::var(ENV_REMOTE_URL) {
            cfg.remote_base_url = Some(url);
        }
        Ok(cfg.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.remote_base_url = self
            .remote_base_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        if self.retry.max_attempts == 0 {
            self.retry.max_attempts = 1;
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            self.retry.multiplier = 1.0;
        }
        self
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AppConfig> {
    match hint_ext {
        "json" => serde_json::from_str(s).context("parsing JSON config"),
        "toml" => toml::from_str(s).context("parsing TOML config"),
        _ => toml::from_str(s)
            .or_else(|_| serde_json::from_str(s))
            .map_err(|_| anyhow!("unsupported config format")),
    }
}

/// Remote source when a base URL is configured, local files otherwise.
pub fn build_source(cfg: &AppConfig) -> Arc<dyn SeriesSource> {
    match &cfg.remote_base_url {
        Some(url) => {
            tracing::info!(target: "config", url = %url, "using remote datasets");
            Arc::new(HttpSource::new(url.clone()))
        }
        None => {
            tracing::info!(target: "config", dir = %cfg.data_dir.display(), "using local datasets");
            Arc::new(FileSource::new(cfg.data_dir.clone()))
        }
    }
}
