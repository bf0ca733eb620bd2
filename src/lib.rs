pub mod aggregator;
pub mod api;
pub mod cache;
pub mod color;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod sources;
pub mod store;
pub mod terms;
pub mod timeout;

use std::sync::Arc;

use aggregator::Aggregator;
use cache::{ExpiringCache, SweepHandle};
use config::Config;
use error::Result;
use metrics::Metrics;
use sources::Sources;
use store::ColorStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<ColorStore>,
}

impl AppState {
    /// Wires cache, sources and store together and starts the cache sweeper.
    /// Must run inside a tokio runtime; dropping the handle stops the sweep.
    pub fn build(config: Config) -> Result<(Self, SweepHandle)> {
        let config = Arc::new(config);
        let cache = Arc::new(ExpiringCache::new(config.cache_ttl));
        let sweeper = cache.spawn_sweeper(config.sweep_interval);
        let sources = Sources::new(config.clone(), cache, Arc::new(Metrics::new()))?;
        let store = ColorStore::new(Aggregator::new(sources));

        Ok((
            AppState {
                config,
                store: Arc::new(store),
            },
            sweeper,
        ))
    }

    pub fn sources(&self) -> &Sources {
        self.store.aggregator().sources()
    }
}
