//! Drives one aggregation: acquire a color, derive search terms, fan out
//! every lookup per term, and merge the results into one record.
//!
//! Batches run one after another; inside a batch every lookup is started
//! before any is awaited.

use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::color::{ColorDescription, normalize_hex, random_hex};
use crate::error::Result;
use crate::models::{AggregatedColorRecord, Article, ColorMatch, ContentBlock};
use crate::sources::Sources;
use crate::terms::derive_terms;
use crate::timeout::with_timeout;

/// Splits summary results into confirmed articles and the first
/// disambiguation page, if any. Later disambiguation hits are dropped.
pub fn partition_summaries(results: Vec<Option<Article>>) -> (Vec<Article>, Option<Article>) {
    let mut articles = Vec::new();
    let mut first_disambiguation = None;
    for article in results.into_iter().flatten() {
        if !article.is_disambiguation {
            articles.push(article);
        } else if first_disambiguation.is_none() {
            first_disambiguation = Some(article);
        }
    }
    (articles, first_disambiguation)
}

/// Merges per-term board results: unique by id, visual classes only, then
/// unique by title (or id when untitled). First occurrence wins throughout.
pub fn merge_blocks(batches: Vec<Vec<ContentBlock>>) -> Vec<ContentBlock> {
    let mut seen_ids = HashSet::new();
    let by_id: Vec<ContentBlock> = batches
        .into_iter()
        .flatten()
        .filter(|block| seen_ids.insert(block.id.clone()))
        .collect();

    let mut seen_keys = HashSet::new();
    by_id
        .into_iter()
        .filter(ContentBlock::is_visual)
        .filter(|block| seen_keys.insert(block.dedup_key()))
        .collect()
}

/// Upstream order, minus the chosen color itself.
pub fn similar_colors(colors: &[ColorMatch], hex: &str) -> Vec<ColorMatch> {
    colors.iter().filter(|c| c.hex != hex).cloned().collect()
}

/// The caller's color normalized, or a random one when none was given.
pub fn requested_or_random_hex(requested: Option<&str>) -> Result<String> {
    match requested.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => normalize_hex(value),
        None => Ok(random_hex(&mut rand::rng())),
    }
}

/// Runs `operation` under `deadline`, falling back to the empty value.
async fn bounded<F, T>(deadline: Duration, label: String, operation: F) -> T
where
    F: Future<Output = T> + Send + 'static,
    T: Default + Send + 'static,
{
    match with_timeout(deadline, label.clone(), operation).await {
        Ok(value) => value,
        Err(e) => {
            warn!(label = %label, error = %e, "fan-out member gave up");
            T::default()
        }
    }
}

pub struct Aggregator {
    sources: Sources,
}

impl Aggregator {
    pub fn new(sources: Sources) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    async fn timed<T>(&self, phase: &str, operation: impl Future<Output = T>) -> T {
        let started = Instant::now();
        let output = operation.await;
        let elapsed = started.elapsed();
        self.sources.metrics().record_timing("aggregate", phase, elapsed);
        debug!(phase, elapsed_ms = elapsed.as_millis() as u64, "phase complete");
        output
    }

    /// Resolves the requested (or a random) color to its nearest named
    /// match. The record has no enrichment yet.
    pub async fn acquire_color(&self, requested: Option<&str>) -> Result<AggregatedColorRecord> {
        let hex = requested_or_random_hex(requested)?;
        let limit = self.sources.config().limits.similar_colors;
        let colors = self.sources.match_color(&hex, limit).await?;
        let chosen = colors[0].clone();

        let description = ColorDescription::new(&chosen.hex).unwrap_or_else(|e| {
            warn!(hex = %chosen.hex, error = %e, "cannot describe color");
            ColorDescription::default()
        });

        Ok(AggregatedColorRecord {
            similar_colors: similar_colors(&colors, &chosen.hex),
            description: description.primary(),
            description_list: description.descriptive_list,
            meanings: description.meanings,
            name: chosen.name,
            hex: chosen.hex,
            best_contrast: chosen.best_contrast,
            ..AggregatedColorRecord::default()
        })
    }

    /// Full aggregation. `publish` sees the early color-only record and then
    /// the final one; it is never called if the color cannot be acquired.
    pub async fn aggregate<P>(
        &self,
        requested: Option<&str>,
        mut publish: P,
    ) -> Result<AggregatedColorRecord>
    where
        P: FnMut(&AggregatedColorRecord),
    {
        let started = Instant::now();
        let mut record = self.timed("color", self.acquire_color(requested)).await?;
        publish(&record);

        let terms = derive_terms(&record.name);
        info!(name = %record.name, hex = %record.hex, terms = ?terms, "aggregating color");

        let summaries = self.timed("summaries", self.summary_fanout(&terms)).await;
        let (articles, first_disambiguation) = partition_summaries(summaries);

        if let Some(page) = first_disambiguation {
            let limit = self.sources.config().limits.disambiguation;
            record.disambiguations = self
                .timed("disambiguation", self.sources.disambiguation_entries(&page.title, limit))
                .await;
        }

        record.definitions = self
            .timed(
                "definitions",
                join_all(terms.iter().map(|term| self.sources.definitions(term))),
            )
            .await
            .into_iter()
            .flatten()
            .flatten()
            .collect();

        record.quotes = self
            .timed("quotes", join_all(terms.iter().map(|term| self.sources.quotes(term))))
            .await
            .into_iter()
            .flatten()
            .collect();

        record.wiki_articles = self.timed("images", self.image_fanout(articles)).await;

        let blocks = self.timed("content board", self.board_fanout(&terms)).await;
        record.content_blocks = merge_blocks(blocks);

        record.complete = true;
        publish(&record);

        let elapsed = started.elapsed();
        self.sources.metrics().record_timing("aggregate", "total", elapsed);
        info!(
            hex = %record.hex,
            articles = record.wiki_articles.len(),
            definitions = record.definitions.len(),
            quotes = record.quotes.len(),
            disambiguations = record.disambiguations.len(),
            blocks = record.content_blocks.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "aggregation complete"
        );
        Ok(record)
    }

    async fn summary_fanout(&self, terms: &[String]) -> Vec<Option<Article>> {
        let deadline = self.sources.config().deadlines.summary_fanout;
        join_all(terms.iter().map(|term| {
            let sources = self.sources.clone();
            let term = term.clone();
            bounded(deadline, format!("summary for {}", term), async move {
                sources.summary(&term).await
            })
        }))
        .await
    }

    async fn image_fanout(&self, articles: Vec<Article>) -> Vec<Article> {
        let deadline = self.sources.config().deadlines.image_fanout;
        let limit = self.sources.config().limits.images;
        let images = join_all(articles.iter().map(|article| {
            let sources = self.sources.clone();
            let title = article.title.clone();
            bounded(deadline, format!("images for {}", title), async move {
                sources.article_images(&title, limit).await
            })
        }))
        .await;

        articles
            .into_iter()
            .zip(images)
            .map(|(article, images)| Article { images, ..article })
            .collect()
    }

    async fn board_fanout(&self, terms: &[String]) -> Vec<Vec<ContentBlock>> {
        let deadline = self.sources.config().deadlines.board_fanout;
        join_all(terms.iter().map(|term| {
            let sources = self.sources.clone();
            let term = term.clone();
            bounded(deadline, format!("content board for {}", term), async move {
                sources.board_blocks(&term).await
            })
        }))
        .await
    }
}
