use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub title: String,
}

/// An encyclopedia summary, possibly a disambiguation page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub query: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub page_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_disambiguation: bool,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    /// Remaining upstream fields (thumbnail, urls, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordDefinition {
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    /// Synonyms, antonyms and anything else the source adds.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordMeaning {
    #[serde(default)]
    pub part_of_speech: String,
    #[serde(default)]
    pub definitions: Vec<WordDefinition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry from the dictionary source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub meanings: Vec<WordMeaning>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Plain text of the page intro.
    #[serde(default)]
    pub text: String,
    /// Individual quotations found in list items.
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockId {
    Number(i64),
    Text(String),
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Number(n) => write!(f, "{}", n),
            BlockId::Text(s) => f.write_str(s),
        }
    }
}

/// A content-board search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: BlockId,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentBlock {
    pub fn is_visual(&self) -> bool {
        self.class == "Image" || self.class == "Media"
    }

    /// Title when present and non-empty, otherwise the id.
    pub fn dedup_key(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => self.id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorMatch {
    pub name: String,
    pub hex: String,
    #[serde(default)]
    pub best_contrast: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Everything known about one color, as published to consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedColorRecord {
    pub name: String,
    pub hex: String,
    pub best_contrast: String,
    pub similar_colors: Vec<ColorMatch>,
    pub description: String,
    pub description_list: Vec<String>,
    pub meanings: Vec<String>,
    pub wiki_articles: Vec<Article>,
    pub definitions: Vec<DictionaryEntry>,
    pub quotes: Vec<Quote>,
    pub disambiguations: Vec<Article>,
    pub content_blocks: Vec<ContentBlock>,
    /// False for the early record published before enrichment.
    pub complete: bool,
}
