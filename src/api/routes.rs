use axum::{
    Router,
    extract::{Json, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::AppState;
use crate::api::models::{ColorRequest, HealthResponse, TermsQuery, TermsResponse};
use crate::api::response;
use crate::error::AppError;
use crate::models::AggregatedColorRecord;
use crate::terms::derive_terms;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/color", post(color_handler))
        .route("/api/color/latest", get(latest_handler))
        .route("/api/terms", get(terms_handler))
        .route("/api/metrics", get(metrics_handler))
        .route("/api/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn color_handler(
    State(state): State<AppState>,
    body: Result<Json<ColorRequest>, JsonRejection>,
) -> Response {
    // No JSON body at all means "pick a random color"; a broken one is refused.
    let req = match body {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => ColorRequest::default(),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected color request body");
            return response::error::<AggregatedColorRecord>(
                StatusCode::BAD_REQUEST,
                rejection.body_text(),
            )
            .into_response();
        }
    };
    let start_time = std::time::Instant::now();
    let deadline = state.config.deadlines.request;

    let result = tokio::time::timeout(
        deadline,
        state.store.fetch_color_data(req.hex.as_deref()),
    )
    .await;

    match result {
        Ok(Ok(record)) => {
            let elapsed_ms = start_time.elapsed().as_millis() as u64;
            info!(hex = %record.hex, elapsed_ms, "color served");
            response::success(record).into_response()
        }
        Ok(Err(err)) => {
            warn!(error = %err, "color aggregation failed");
            err.into_response()
        }
        Err(_) => {
            let elapsed_ms = start_time.elapsed().as_millis() as u64;
            warn!(elapsed_ms, "color request timed out");
            AppError::TimeoutExceeded {
                label: "color aggregation".to_string(),
                deadline_ms: deadline.as_millis() as u64,
            }
            .into_response()
        }
    }
}

async fn latest_handler(State(state): State<AppState>) -> Response {
    match state.store.latest() {
        Some(record) => response::success(record).into_response(),
        None => response::error::<AggregatedColorRecord>(
            StatusCode::NOT_FOUND,
            "No color has been published yet".to_string(),
        )
        .into_response(),
    }
}

async fn terms_handler(Query(query): Query<TermsQuery>) -> impl IntoResponse {
    let terms = derive_terms(&query.name);
    response::success(TermsResponse {
        name: query.name,
        terms,
    })
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    response::success(state.sources().metrics().snapshot())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let sources = state.sources();
    response::success(HealthResponse {
        status: "ok".to_string(),
        cache: sources.cache().bucket_sizes(),
        upstream_requests: sources.metrics().snapshot().requests,
    })
}
