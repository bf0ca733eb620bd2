use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::mediawiki::{QueryResponse, query_params};
use super::{OrLogged, Sources, strip_unwanted};
use crate::cache::Bucket;
use crate::error::Result;
use crate::models::Quote;

static LIST_ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li").expect("Failed to parse list item selector"));

#[derive(Debug, Deserialize)]
struct QuotePage {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    missing: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Collapses runs of whitespace (including newlines) to single spaces.
fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(word);
    }
    result
}

/// Plain text of an HTML fragment.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    collapse_whitespace(&fragment.root_element().text().collect::<String>())
}

/// Text of each list item that has no nested list of its own.
pub fn extract_quote_lines(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    let mut lines: Vec<String> = Vec::new();
    for item in fragment.select(&LIST_ITEM_SELECTOR) {
        if item.select(&LIST_ITEM_SELECTOR).next().is_some() {
            continue;
        }
        let line = collapse_whitespace(&item.text().collect::<String>());
        if !line.is_empty() && !lines.contains(&line) {
            lines.push(line);
        }
    }
    lines
}

fn into_quote(page: QuotePage) -> Quote {
    let html = page.extract.unwrap_or_default();
    let mut extra = page.extra;
    strip_unwanted(&mut extra);
    Quote {
        title: page.title,
        url: page.fullurl,
        text: html_to_text(&html),
        lines: extract_quote_lines(&html),
        extra,
    }
}

impl Sources {
    /// The first existing quotations page titled `query`. A miss is cached
    /// like a hit.
    pub async fn quotes(&self, query: &str) -> Option<Quote> {
        if let Some(hit) = self.cache().get_valid::<Option<Quote>>(Bucket::Quotes, query) {
            return hit;
        }

        let quote = self.fetch_quotes(query).await.map(Some).or_logged("quotes", query)?;
        self.cache().store(Bucket::Quotes, query, &quote);
        quote
    }

    async fn fetch_quotes(&self, query: &str) -> Result<Option<Quote>> {
        let url = format!("{}/w/api.php", self.config().endpoints.quotes.trim_end_matches('/'));
        let params = query_params(
            query,
            &[("prop", "extracts|info"), ("inprop", "url"), ("redirects", "")],
        );
        let response: QueryResponse<QuotePage> = self
            .get_json(url, params, self.config().deadlines.default_fetch)
            .await?;

        Ok(response
            .into_pages()
            .into_iter()
            .find(|page| page.missing.is_none())
            .map(into_quote))
    }
}
