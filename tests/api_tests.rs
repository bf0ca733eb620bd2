mod support;

use serde_json::{Value, json};
use tokio::net::TcpListener;

use chromafan::AppState;
use chromafan::api::routes::create_router;
use support::{Fixtures, MockUpstream};

async fn serve(mock: &MockUpstream) -> String {
    let (state, sweeper) = AppState::build(mock.config()).unwrap();
    let app = create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _sweeper = sweeper;
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn post_color_returns_the_final_record() {
    let mock = MockUpstream::start(Fixtures::blue_ribbon()).await;
    let base = serve(&mock).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/color", base))
        .json(&json!({"hex": "#1f3a5e"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["meta"]["status"], "success");
    assert_eq!(body["data"]["name"], "Blue Ribbon");
    assert_eq!(body["data"]["hex"], "#1f3a5e");
    assert_eq!(body["data"]["complete"], true);
    assert_eq!(body["data"]["wikiArticles"][1]["isDisambiguation"], false);

    let latest: Value = client
        .get(format!("{}/api/color/latest", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(latest["data"], body["data"]);
}

#[tokio::test]
async fn latest_is_not_found_before_any_aggregation() {
    let mock = MockUpstream::start(Fixtures::blue_ribbon()).await;
    let base = serve(&mock).await;

    let response = reqwest::get(format!("{}/api/color/latest", base)).await.unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["meta"]["status"], "error");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn color_service_outage_maps_to_bad_gateway() {
    let mock = MockUpstream::start(Fixtures::default()).await;
    let base = serve(&mock).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/color", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
}

#[tokio::test]
async fn invalid_color_maps_to_bad_request() {
    let mock = MockUpstream::start(Fixtures::blue_ribbon()).await;
    let base = serve(&mock).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/color", base))
        .json(&json!({"hex": "#12"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["meta"]["message"].as_str().unwrap().contains("#12"));
}

#[tokio::test]
async fn missing_body_picks_a_random_color() {
    let mock = MockUpstream::start(Fixtures::blue_ribbon()).await;
    let base = serve(&mock).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/color", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["complete"], true);
}

#[tokio::test]
async fn malformed_body_is_rejected_without_aggregating() {
    let mock = MockUpstream::start(Fixtures::blue_ribbon()).await;
    let base = serve(&mock).await;
    let client = reqwest::Client::new();

    let broken = client
        .post(format!("{}/api/color", base))
        .header("content-type", "application/json")
        .body("{\"hex\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(broken.status(), 400);

    let wrong_type = client
        .post(format!("{}/api/color", base))
        .json(&json!({"hex": 5}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_type.status(), 400);
    let body: Value = wrong_type.json().await.unwrap();
    assert_eq!(body["meta"]["status"], "error");

    assert_eq!(mock.hits("color"), 0);
}

#[tokio::test]
async fn terms_endpoint_derives_search_terms() {
    let mock = MockUpstream::start(Fixtures::blue_ribbon()).await;
    let base = serve(&mock).await;

    let body: Value = reqwest::get(format!("{}/api/terms?name=Dark%20Sea%20Green", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["data"]["terms"],
        json!(["Dark Sea Green", "Dark", "Sea", "Green", "Dark Sea", "Sea Green"])
    );
}

#[tokio::test]
async fn health_and_metrics_reflect_activity() {
    let mock = MockUpstream::start(Fixtures::blue_ribbon()).await;
    let base = serve(&mock).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/api/color", base))
        .json(&json!({"hex": "1f3a5e"}))
        .send()
        .await
        .unwrap();

    let health: Value = client
        .get(format!("{}/api/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["data"]["status"], "ok");
    assert_eq!(health["data"]["cache"]["lookups"], 4);
    assert!(health["data"]["upstream_requests"].as_u64().unwrap() > 0);

    let metrics: Value = client
        .get(format!("{}/api/metrics", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(metrics["data"]["timings"]["aggregate"]["total"]["count"], 1);
}
