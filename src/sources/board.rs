use serde::Deserialize;

use super::{Sources, strip_unwanted};
use crate::cache::Bucket;
use crate::error::Result;
use crate::models::ContentBlock;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct BlockSearch {
    #[serde(default)]
    blocks: Vec<ContentBlock>,
}

impl Sources {
    /// Content-board blocks matching `term`, unfiltered.
    pub async fn board_blocks(&self, term: &str) -> Vec<ContentBlock> {
        if let Some(hit) = self.cache().get_valid::<Vec<ContentBlock>>(Bucket::ContentBoard, term) {
            return hit;
        }

        match self.fetch_board_blocks(term).await {
            Ok(blocks) => {
                self.cache().store(Bucket::ContentBoard, term, &blocks);
                blocks
            }
            Err(e) => {
                warn!(lookup = "content board", key = term, error = %e, "lookup failed");
                Vec::new()
            }
        }
    }

    async fn fetch_board_blocks(&self, term: &str) -> Result<Vec<ContentBlock>> {
        let url = format!(
            "{}/v2/search/blocks",
            self.config().endpoints.board.trim_end_matches('/')
        );
        let params = vec![
            ("q", term.to_string()),
            ("per", self.config().limits.board_page.to_string()),
        ];
        let mut search: BlockSearch = self
            .get_json(url, params, self.config().deadlines.default_fetch)
            .await?;
        for block in &mut search.blocks {
            strip_unwanted(&mut block.extra);
        }
        Ok(search.blocks)
    }
}
