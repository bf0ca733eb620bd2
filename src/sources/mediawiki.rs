//! Response shapes shared by the MediaWiki action API endpoints.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::QueryParams;

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "P: Deserialize<'de>"))]
pub(super) struct QueryResponse<P> {
    #[serde(default)]
    query: Option<QueryPages<P>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "P: Deserialize<'de>"))]
struct QueryPages<P> {
    #[serde(default)]
    pages: BTreeMap<String, P>,
}

impl<P> QueryResponse<P> {
    pub(super) fn into_pages(self) -> Vec<P> {
        self.query
            .map(|q| q.pages.into_values().collect())
            .unwrap_or_default()
    }

    pub(super) fn into_first_page(self) -> Option<P> {
        self.into_pages().into_iter().next()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct TitleRef {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct LinksPage {
    #[serde(default)]
    pub links: Option<Vec<TitleRef>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ImagesPage {
    #[serde(default)]
    pub images: Option<Vec<TitleRef>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ImageInfo {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ImageInfoPage {
    #[serde(default)]
    pub imageinfo: Vec<ImageInfo>,
}

/// `action=query` parameters common to every call.
pub(super) fn query_params(title: &str, extra: &[(&'static str, &str)]) -> QueryParams {
    let mut params: QueryParams = vec![
        ("action", "query".to_string()),
        ("titles", title.to_string()),
    ];
    params.extend(extra.iter().map(|(k, v)| (*k, v.to_string())));
    params.push(("format", "json".to_string()));
    params.push(("origin", "*".to_string()));
    params
}
