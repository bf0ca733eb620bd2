use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ColorRequest {
    /// Random when absent or empty.
    #[serde(default)]
    pub hex: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TermsQuery {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TermsResponse {
    pub name: String,
    pub terms: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub cache: BTreeMap<&'static str, usize>,
    pub upstream_requests: u64,
}
