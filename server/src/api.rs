//! HTTP API
//!
//! Routes for recommendations, the category list and health checks.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};
use crate::service::{PersistenceStatus, RecommendRequest, RecommendationService};

/// Application state for the web API
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecommendationService>,
}

/// Response body of `POST /api/recommend`
#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<String>,
    pub saved: bool,
    pub message: String,
}

/// Create the main API router
///
/// Request timeouts are enforced by [`RecommendationService`].
pub fn create_api_router(state: AppState, cors_origins: Vec<HeaderValue>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/categories", get(list_categories))
        .route("/api/recommend", post(recommend))
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ORIGIN])
        .allow_credentials(true)
}

/// Rank categories for the text and store them for the user
///
/// 200 when saved, 207 when ranked but not saved, 504 when ranking timed out.
async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = state.service.recommend(request).await?;

    let (status, body) = match outcome.persistence {
        PersistenceStatus::Saved => (
            StatusCode::OK,
            RecommendResponse {
                recommendations: outcome.recommendations,
                saved: true,
                message: "Implicit categories updated successfully".to_string(),
            },
        ),
        PersistenceStatus::NotSaved { .. } => (
            StatusCode::MULTI_STATUS,
            RecommendResponse {
                recommendations: outcome.recommendations,
                saved: false,
                message: "Failed to update implicit categories".to_string(),
            },
        ),
    };

    Ok((status, Json(body)).into_response())
}

/// The category vocabulary, in tie-break order
async fn list_categories(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "categories": state.service.matcher().vocabulary() }))
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let matcher = state.service.matcher();
    Json(json!({
        "status": "ok",
        "service": "category-server",
        "version": env!("CARGO_PKG_VERSION"),
        "model": matcher.model_name(),
        "dimension": matcher.dimension(),
        "vocabularySize": matcher.vocabulary().len(),
        "users": state.service.store().user_count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::{
        registered_store, slow_matcher, test_matcher, BrokenStore, SlowStore, USER,
    };
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn router(service: RecommendationService) -> Router {
        let state = AppState {
            service: Arc::new(service),
        };
        create_api_router(
            state,
            vec![HeaderValue::from_static("http://localhost:3000")],
        )
    }

    fn default_router() -> Router {
        router(RecommendationService::new(test_matcher(), registered_store(), 3))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/recommend")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(default_router(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["vocabularySize"], 6);
        assert_eq!(body["users"], 1);
    }

    #[tokio::test]
    async fn test_categories() {
        let request = Request::builder()
            .uri("/api/categories")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(default_router(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categories"][0], "yoga");
        assert_eq!(body["categories"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_recommend_saved() {
        let (status, body) = send(
            default_router(),
            post_json(json!({ "text": "tacos and margaritas", "userId": USER })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saved"], true);
        assert_eq!(body["recommendations"][0], "taco");
        assert_eq!(body["recommendations"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_recommend_not_saved_is_distinct() {
        let router = router(RecommendationService::new(
            test_matcher(),
            Arc::new(BrokenStore),
            3,
        ));
        let (status, body) = send(
            router,
            post_json(json!({ "text": "taco", "userId": USER, "topN": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::MULTI_STATUS);
        assert_eq!(body["saved"], false);
        assert_eq!(body["recommendations"], json!(["taco"]));
        assert_eq!(body["message"], "Failed to update implicit categories");
    }

    #[tokio::test]
    async fn test_recommend_missing_text() {
        let (status, body) = send(default_router(), post_json(json!({ "userId": USER }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing 'text' in request");
    }

    #[tokio::test]
    async fn test_recommend_missing_user() {
        let (status, body) = send(default_router(), post_json(json!({ "text": "tacos" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing 'userId' in request");
    }

    #[tokio::test]
    async fn test_recommend_invalid_top_n() {
        let (status, body) = send(
            default_router(),
            post_json(json!({ "text": "tacos", "userId": USER, "topN": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("top_n"));
    }

    #[tokio::test]
    async fn test_recommend_non_integer_top_n_is_invalid_parameter() {
        for top_n in [json!(2.5), json!("3"), json!(1e20), json!(-4)] {
            let (status, body) = send(
                default_router(),
                post_json(json!({ "text": "tacos", "userId": USER, "topN": top_n })),
            )
            .await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "topN {}", top_n);
            assert!(body["error"].as_str().unwrap().contains("top_n"));
        }

        let (_, body) = send(
            default_router(),
            post_json(json!({ "text": "tacos", "userId": USER, "topN": -4 })),
        )
        .await;
        assert!(body["error"].as_str().unwrap().ends_with("got -4"));
    }

    #[tokio::test]
    async fn test_recommend_timeout_is_json_and_not_saved() {
        let store = registered_store();
        let service = RecommendationService::new(
            slow_matcher(Duration::from_millis(300)),
            store.clone(),
            3,
        )
        .with_request_timeout(Duration::from_millis(50));

        let (status, body) = send(
            router(service),
            post_json(json!({ "text": "slow taco night", "userId": USER })),
        )
        .await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body["error"].as_str().unwrap().contains("did not finish"));

        tokio::time::sleep(Duration::from_millis(400)).await;
        let record = store.get(USER).unwrap().unwrap();
        assert!(record.implicit_categories.is_empty());
    }

    #[tokio::test]
    async fn test_slow_save_outlives_ranking_budget() {
        let inner = registered_store();
        let store = Arc::new(SlowStore {
            inner: inner.clone(),
            delay: Duration::from_millis(300),
        });
        let service = RecommendationService::new(test_matcher(), store, 3)
            .with_request_timeout(Duration::from_millis(50));

        let (status, body) = send(
            router(service),
            post_json(json!({ "text": "taco", "userId": USER, "topN": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saved"], true);

        // The response and the store agree on what was saved
        let record = inner.get(USER).unwrap().unwrap();
        assert_eq!(json!(record.implicit_categories), body["recommendations"]);
    }

    #[tokio::test]
    async fn test_recommend_malformed_json() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/recommend")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(default_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/recommend")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = default_router().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }
}
