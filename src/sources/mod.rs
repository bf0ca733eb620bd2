//! Lookups against the third-party services.
//!
//! Every public lookup checks the cache, makes at most one time-boxed call
//! per resource, and never fails: errors are logged and collapse to `None`
//! or an empty list.

mod board;
mod dictionary;
mod encyclopedia;
mod mediawiki;
mod palette;
mod quotes;

pub use encyclopedia::{is_excluded_image, shuffle, strip_citations};
pub use quotes::{extract_quote_lines, html_to_text};

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::cache::ExpiringCache;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::metrics::Metrics;
use crate::timeout::try_with_timeout;

/// Upstream fields that carry nothing useful for display.
pub const UNWANTED_PROPS: &[&str] = &[
    "dir", "revision", "tid", "timestamp", "pageid", "namespace", "titles", "api_urls",
];

pub fn strip_unwanted(fields: &mut Map<String, Value>) {
    for prop in UNWANTED_PROPS {
        fields.remove(*prop);
    }
}

pub fn build_client() -> Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

/// Collapses a failed lookup to its empty value, logging the failure.
pub(crate) trait OrLogged<T> {
    fn or_logged(self, lookup: &str, key: &str) -> T;
}

impl<T: Default> OrLogged<T> for Result<T> {
    fn or_logged(self, lookup: &str, key: &str) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                warn!(lookup, key, error = %e, "lookup failed");
                T::default()
            }
        }
    }
}

pub type QueryParams = Vec<(&'static str, String)>;

/// Shared handle to every upstream source. Cheap to clone.
#[derive(Clone)]
pub struct Sources {
    client: Client,
    config: Arc<Config>,
    cache: Arc<ExpiringCache>,
    metrics: Arc<Metrics>,
}

impl Sources {
    pub fn new(
        config: Arc<Config>,
        cache: Arc<ExpiringCache>,
        metrics: Arc<Metrics>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            config,
            cache,
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ExpiringCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    fn locale(&self) -> &str {
        &self.config.locale
    }

    fn encyclopedia_base(&self) -> String {
        self.config.endpoints.encyclopedia_for(self.locale())
    }

    /// One GET bounded by `deadline`, decoded as JSON.
    async fn get_json<T>(&self, url: String, query: QueryParams, deadline: Duration) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let client = self.client.clone();
        let metrics = self.metrics.clone();
        let label = format!("GET {}", url);

        try_with_timeout(deadline, label, async move {
            let started = Instant::now();
            let response = match client.get(&url).query(&query).send().await {
                Ok(response) => response,
                Err(e) => {
                    metrics.record_request(&url, started.elapsed(), 0);
                    return Err(e.into());
                }
            };

            let status = response.status();
            let body = response.bytes().await?;
            metrics.record_request(&url, started.elapsed(), body.len());

            if !status.is_success() {
                return Err(AppError::UpstreamError(format!("{} returned {}", url, status)));
            }
            serde_json::from_slice(&body)
                .map_err(|e| AppError::UpstreamError(format!("Malformed JSON from {}: {}", url, e)))
        })
        .await
    }
}
