#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use chromafan::cache::{DEFAULT_TTL, ExpiringCache};
use chromafan::config::Config;
use chromafan::metrics::Metrics;
use chromafan::sources::Sources;

/// Canned upstream data. Keys are the exact titles/terms the client sends.
#[derive(Clone, Default)]
pub struct Fixtures {
    /// `None` makes the color service answer 500.
    pub color_name: Option<String>,
    pub summaries: HashMap<String, Value>,
    pub summary_delays: HashMap<String, Duration>,
    pub links: HashMap<String, Vec<String>>,
    pub images: HashMap<String, Vec<String>>,
    pub image_urls: HashMap<String, String>,
    pub definitions: HashMap<String, Value>,
    pub quotes: HashMap<String, Value>,
    pub blocks: HashMap<String, Vec<Value>>,
}

impl Fixtures {
    /// "Blue Ribbon": one plain article, one cited article, one
    /// disambiguation page, images, definitions, quotes and board blocks.
    pub fn blue_ribbon() -> Self {
        let mut f = Fixtures {
            color_name: Some("Blue Ribbon".to_string()),
            ..Fixtures::default()
        };
        f.summaries.insert(
            "Blue_Ribbon".into(),
            json!({"title": "Blue Ribbon", "type": "standard", "extract": "A prize.", "tid": "x"}),
        );
        f.summaries.insert(
            "Blue".into(),
            json!({"title": "Blue", "type": "standard", "extract": "Blue is a colour.[2]"}),
        );
        f.summaries.insert(
            "Ribbon".into(),
            json!({"title": "Ribbon", "type": "disambiguation", "extract": "Ribbon may refer to:"}),
        );
        f.summaries.insert(
            "Ribbon_(band)".into(),
            json!({"title": "Ribbon (band)", "type": "standard", "extract": "A band."}),
        );
        f.links.insert(
            "Ribbon".into(),
            vec!["Ribbon (band)".into(), "Help:Disambiguation".into(), "Ribbon cable".into()],
        );
        f.images.insert(
            "Blue".into(),
            vec!["File:Blue.jpg".into(), "File:Logo.svg".into(), "File:Broken.png".into()],
        );
        f.image_urls
            .insert("File:Blue.jpg".into(), "https://img.example/Blue.jpg".into());
        f.definitions.insert(
            "Blue".into(),
            json!([{"word": "blue", "meanings": [{"partOfSpeech": "adjective",
                "definitions": [{"definition": "Of the colour of the clear sky."}]}]}]),
        );
        f.quotes.insert(
            "Blue".into(),
            json!({
                "pageid": 9,
                "title": "Blue",
                "fullurl": "https://quotes.example/Blue",
                "extract": concat!(
                    "<ul><li>Blue is the only colour which ",
                    "maintains its own character.</li></ul>"
                )
            }),
        );
        f.blocks.insert(
            "Blue".into(),
            vec![
                json!({"id": 1, "class": "Image", "title": "Sky"}),
                json!({"id": 2, "class": "Text", "title": "Words"}),
            ],
        );
        f.blocks.insert(
            "Ribbon".into(),
            vec![
                json!({"id": 1, "class": "Image", "title": "Other"}),
                json!({"id": 3, "class": "Media", "title": "Sky"}),
                json!({"id": 4, "class": "Media", "title": null}),
            ],
        );
        f
    }
}

#[derive(Clone)]
struct MockState {
    fixtures: Arc<Fixtures>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockState {
    fn hit(&self, key: String) {
        *self.hits.lock().unwrap().entry(key).or_insert(0) += 1;
    }
}

pub struct MockUpstream {
    pub base_url: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockUpstream {
    pub async fn start(fixtures: Fixtures) -> Self {
        let hits = Arc::new(Mutex::new(HashMap::new()));
        let state = MockState {
            fixtures: Arc::new(fixtures),
            hits: hits.clone(),
        };
        let app = Router::new()
            .route("/api/rest_v1/page/summary/:title", get(summary))
            .route("/w/api.php", get(action_api))
            .route("/api/v2/entries/en_US/:word", get(definitions))
            .route("/v2/search/blocks", get(blocks))
            .route("/v1/", get(colors))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockUpstream {
            base_url: format!("http://{}", addr),
            hits,
        }
    }

    pub fn hits(&self, key: &str) -> usize {
        self.hits.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn config(&self) -> Config {
        Config::for_base_url(&self.base_url)
    }

    pub fn sources(&self) -> Sources {
        self.sources_with(self.config())
    }

    pub fn sources_with(&self, config: Config) -> Sources {
        Sources::new(
            Arc::new(config),
            Arc::new(ExpiringCache::new(DEFAULT_TTL)),
            Arc::new(Metrics::new()),
        )
        .unwrap()
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"title": "Not found."}))).into_response()
}

fn pages(page: Value) -> Json<Value> {
    Json(json!({"batchcomplete": "", "query": {"pages": {"101": page}}}))
}

fn missing_page(title: &str) -> Json<Value> {
    Json(json!({"query": {"pages": {"-1": {"title": title, "missing": ""}}}}))
}

async fn summary(State(state): State<MockState>, Path(title): Path<String>) -> Response {
    state.hit(format!("summary:{}", title));
    if let Some(delay) = state.fixtures.summary_delays.get(&title) {
        tokio::time::sleep(*delay).await;
    }
    match state.fixtures.summaries.get(&title) {
        Some(body) => Json(body.clone()).into_response(),
        None => not_found(),
    }
}

async fn action_api(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let title = params.get("titles").cloned().unwrap_or_default();
    let prop = params.get("prop").cloned().unwrap_or_default();
    state.hit(format!("{}:{}", prop, title));
    let f = &state.fixtures;

    match prop.as_str() {
        "links" => match f.links.get(&title) {
            Some(links) => {
                let links: Vec<Value> =
                    links.iter().map(|t| json!({"ns": 0, "title": t})).collect();
                pages(json!({"title": title, "links": links})).into_response()
            }
            None => pages(json!({"title": title})).into_response(),
        },
        "images" => match f.images.get(&title) {
            Some(images) => {
                let images: Vec<Value> =
                    images.iter().map(|t| json!({"ns": 6, "title": t})).collect();
                pages(json!({"title": title, "images": images})).into_response()
            }
            None => pages(json!({"title": title})).into_response(),
        },
        "imageinfo" => match f.image_urls.get(&title) {
            Some(url) => {
                pages(json!({"title": title, "imageinfo": [{"url": url}]})).into_response()
            }
            None => missing_page(&title).into_response(),
        },
        "extracts|info" => match f.quotes.get(&title) {
            Some(page) => pages(page.clone()).into_response(),
            None => missing_page(&title).into_response(),
        },
        _ => (StatusCode::BAD_REQUEST, "unknown prop").into_response(),
    }
}

async fn definitions(State(state): State<MockState>, Path(word): Path<String>) -> Response {
    state.hit(format!("definitions:{}", word));
    match state.fixtures.definitions.get(&word) {
        Some(body) => Json(body.clone()).into_response(),
        None => not_found(),
    }
}

async fn blocks(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let q = params.get("q").cloned().unwrap_or_default();
    state.hit(format!("blocks:{}", q));
    let blocks = state.fixtures.blocks.get(&q).cloned().unwrap_or_default();
    Json(json!({"term": q, "blocks": blocks}))
}

async fn colors(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.hit("color".to_string());
    let Some(name) = state.fixtures.color_name.clone() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "color service down").into_response();
    };
    let values = params.get("values").cloned().unwrap_or_default();
    let requested = values.split(',').next().unwrap_or_default().to_lowercase();
    let hex = format!("#{}", requested);
    Json(json!({"colors": [
        {"name": name, "hex": hex, "bestContrast": "white"},
        {"name": "Same Again", "hex": hex, "bestContrast": "white"},
        {"name": "Navy", "hex": "#000080", "bestContrast": "white"},
        {"name": "Midnight", "hex": "#191970", "bestContrast": "white"}
    ]}))
    .into_response()
}
