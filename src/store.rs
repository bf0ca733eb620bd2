//! Latest aggregated record, republished to subscribers.

use tokio::sync::watch;

use crate::aggregator::Aggregator;
use crate::error::Result;
use crate::models::AggregatedColorRecord;

pub struct ColorStore {
    aggregator: Aggregator,
    sender: watch::Sender<Option<AggregatedColorRecord>>,
}

impl ColorStore {
    pub fn new(aggregator: Aggregator) -> Self {
        let (sender, _) = watch::channel(None);
        Self { aggregator, sender }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AggregatedColorRecord>> {
        self.sender.subscribe()
    }

    pub fn latest(&self) -> Option<AggregatedColorRecord> {
        self.sender.borrow().clone()
    }

    /// Aggregates `requested` (or a random color), publishing the early
    /// record and then the final one.
    pub async fn fetch_color_data(&self, requested: Option<&str>) -> Result<AggregatedColorRecord> {
        let sender = &self.sender;
        self.aggregator
            .aggregate(requested, |record| {
                sender.send_replace(Some(record.clone()));
            })
            .await
    }
}
