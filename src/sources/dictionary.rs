use super::{OrLogged, Sources, strip_unwanted};
use crate::cache::Bucket;
use crate::error::Result;
use crate::models::DictionaryEntry;

impl Sources {
    /// Dictionary entries for `word`; `None` when the word is unknown.
    pub async fn definitions(&self, word: &str) -> Option<Vec<DictionaryEntry>> {
        let cached = self.cache().get_valid::<Vec<DictionaryEntry>>(Bucket::Definitions, word);
        if let Some(hit) = cached {
            return Some(hit);
        }

        let entries = self
            .fetch_definitions(word)
            .await
            .map(Some)
            .or_logged("definitions", word)?;
        self.cache().store(Bucket::Definitions, word, &entries);
        Some(entries)
    }

    async fn fetch_definitions(&self, word: &str) -> Result<Vec<DictionaryEntry>> {
        let url = format!(
            "{}/api/v2/entries/en_US/{}",
            self.config().endpoints.dictionary.trim_end_matches('/'),
            urlencoding::encode(word)
        );
        let mut entries: Vec<DictionaryEntry> = self
            .get_json(url, Vec::new(), self.config().deadlines.default_fetch)
            .await?;
        for entry in &mut entries {
            strip_unwanted(&mut entry.extra);
        }
        Ok(entries)
    }
}
