use serde::Deserialize;
use tracing::info;

use super::Sources;
use crate::error::{AppError, Result};
use crate::models::ColorMatch;

#[derive(Debug, Deserialize)]
struct ColorResponse {
    #[serde(default)]
    colors: Vec<ColorMatch>,
}

impl Sources {
    /// Nearest named color first, then up to `count - 1` similar ones.
    ///
    /// Unlike the other lookups this one fails loudly: without a color there
    /// is nothing to aggregate.
    pub async fn match_color(&self, hex: &str, count: usize) -> Result<Vec<ColorMatch>> {
        let digits = hex.trim_start_matches('#');
        let values = vec![digits; count.max(1)].join(",");
        let url = format!("{}/v1/", self.config().endpoints.color.trim_end_matches('/'));
        let params = vec![
            ("values", values),
            ("list", "default".to_string()),
            ("noduplicates", "true".to_string()),
        ];

        let response: ColorResponse = self
            .get_json(url, params, self.config().deadlines.default_fetch)
            .await
            .map_err(|e| AppError::FatalAcquisitionError(e.to_string()))?;

        if response.colors.is_empty() {
            return Err(AppError::FatalAcquisitionError(format!(
                "no color matches for {}",
                hex
            )));
        }
        info!(requested = hex, matched = %response.colors[0].name, "color acquired");
        Ok(response.colors)
    }
}
