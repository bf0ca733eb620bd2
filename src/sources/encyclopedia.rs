//! Encyclopedia summaries, disambiguation candidates and article images.

use futures_util::future::join_all;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::mediawiki::{ImageInfoPage, ImagesPage, LinksPage, QueryResponse, query_params};
use super::{OrLogged, Sources, strip_unwanted};
use crate::cache::Bucket;
use crate::error::Result;
use crate::models::{Article, ImageRef};

static CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d+\]").expect("Failed to compile citation pattern"));

/// Vector and audio files are never shown as images.
const EXCLUDED_IMAGE_FORMATS: &[&str] = &[".svg", ".ogg", ".mid"];

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "type", default)]
    page_type: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

pub fn strip_citations(text: &str) -> String {
    CITATION.replace_all(text.trim(), "").into_owned()
}

pub fn is_excluded_image(filename: &str) -> bool {
    EXCLUDED_IMAGE_FORMATS.iter().any(|ext| filename.contains(ext))
}

/// Fisher-Yates: every permutation equally likely.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// A random `limit` of the article links, as summary titles. Namespaced
/// links (Help:, Category:, ...) are not articles.
fn pick_candidates(titles: impl Iterator<Item = String>, limit: usize) -> Vec<String> {
    let mut candidates: Vec<String> = titles
        .filter(|title| !title.contains(':'))
        .map(|title| title.replace(' ', "_"))
        .collect();
    shuffle(&mut candidates, &mut rand::rng());
    candidates.truncate(limit);
    candidates
}

fn into_article(query: &str, body: SummaryResponse) -> Article {
    let mut extra = body.extra;
    strip_unwanted(&mut extra);

    let page_type = body.page_type.unwrap_or_default();
    let is_disambiguation = page_type == "disambiguation";
    let raw_text = body.text.or(body.extract).unwrap_or_default();
    let text = if is_disambiguation {
        raw_text
    } else {
        strip_citations(&raw_text)
    };

    Article {
        query: query.to_string(),
        title: body.title.unwrap_or_default(),
        text,
        page_type,
        description: body.description,
        is_disambiguation,
        images: Vec::new(),
        extra,
    }
}

impl Sources {
    fn summary_key(&self, title: &str) -> String {
        format!("{}:{}", self.locale(), title)
    }

    /// Summary of the article titled `query`.
    pub async fn summary(&self, query: &str) -> Option<Article> {
        let key = self.summary_key(query);
        if let Some(hit) = self.cache().get_valid::<Article>(Bucket::Lookups, &key) {
            return Some(hit);
        }

        let article = self.fetch_summary(query).await.map(Some).or_logged("summary", query)?;
        self.cache().store(Bucket::Lookups, &key, &article);
        Some(article)
    }

    async fn fetch_summary(&self, query: &str) -> Result<Article> {
        let url = format!(
            "{}/api/rest_v1/page/summary/{}",
            self.encyclopedia_base(),
            urlencoding::encode(&query.replace(' ', "_"))
        );
        let deadline = self.config().deadlines.summary_fetch;
        let body: SummaryResponse = self
            .get_json(url, vec![("redirect", "1".to_string())], deadline)
            .await?;
        Ok(into_article(query, body))
    }

    /// Up to `limit` random real articles linked from a disambiguation page.
    pub async fn disambiguation_entries(&self, title: &str, limit: usize) -> Vec<Article> {
        let key = self.summary_key(title);
        if let Some(hit) = self.cache().get_valid::<Vec<Article>>(Bucket::Disambiguations, &key) {
            return hit;
        }

        match self.fetch_disambiguation(title, limit).await {
            Ok(Some(articles)) => {
                self.cache().store(Bucket::Disambiguations, &key, &articles);
                articles
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(lookup = "disambiguation", key = title, error = %e, "lookup failed");
                Vec::new()
            }
        }
    }

    async fn fetch_disambiguation(
        &self,
        title: &str,
        limit: usize,
    ) -> Result<Option<Vec<Article>>> {
        let url = format!("{}/w/api.php", self.encyclopedia_base());
        let params = query_params(title, &[("prop", "links"), ("pllimit", "500")]);
        let response: QueryResponse<LinksPage> = self
            .get_json(url, params, self.config().deadlines.default_fetch)
            .await?;

        let Some(links) = response.into_first_page().and_then(|page| page.links) else {
            return Ok(None);
        };

        let candidates = pick_candidates(links.into_iter().map(|link| link.title), limit);
        debug!(title, candidates = candidates.len(), "resolving disambiguation candidates");

        let summaries = join_all(candidates.iter().map(|candidate| self.summary(candidate))).await;
        Ok(Some(
            summaries
                .into_iter()
                .flatten()
                .filter(|article| !article.title.is_empty())
                .collect(),
        ))
    }

    /// Direct URLs of up to `limit` raster images used by an article.
    pub async fn article_images(&self, title: &str, limit: usize) -> Vec<ImageRef> {
        let key = self.summary_key(title);
        if let Some(hit) = self.cache().get_valid::<Vec<ImageRef>>(Bucket::Images, &key) {
            return hit;
        }

        match self.fetch_images(title, limit).await {
            Ok(Some(images)) => {
                self.cache().store(Bucket::Images, &key, &images);
                images
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(lookup = "images", key = title, error = %e, "lookup failed");
                Vec::new()
            }
        }
    }

    async fn fetch_images(&self, title: &str, limit: usize) -> Result<Option<Vec<ImageRef>>> {
        let url = format!("{}/w/api.php", self.encyclopedia_base());
        let params = query_params(title, &[("prop", "images")]);
        let response: QueryResponse<ImagesPage> = self
            .get_json(url, params, self.config().deadlines.default_fetch)
            .await?;

        let Some(images) = response.into_first_page().and_then(|page| page.images) else {
            return Ok(None);
        };
        let filenames: Vec<String> = images
            .into_iter()
            .map(|image| image.title)
            .filter(|name| !is_excluded_image(name))
            .take(limit)
            .collect();
        if filenames.is_empty() {
            return Ok(None);
        }

        let details = join_all(filenames.into_iter().map(|file| self.image_url(file))).await;
        Ok(Some(details.into_iter().flatten().collect()))
    }

    async fn image_url(&self, file: String) -> Option<ImageRef> {
        let url = format!("{}/w/api.php", self.encyclopedia_base());
        let params = query_params(&file, &[("prop", "imageinfo"), ("iiprop", "url")]);
        let response: Option<QueryResponse<ImageInfoPage>> = self
            .get_json(url, params, self.config().deadlines.default_fetch)
            .await
            .map(Some)
            .or_logged("image info", &file);

        let url = response?
            .into_first_page()?
            .imageinfo
            .into_iter()
            .next()?
            .url?;
        Some(ImageRef { url, title: file })
    }
}
