// src/handlers/debug.rs
//! Smoke-test endpoints. Authentication is optional here.

use axum::{
    body::Bytes,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::middleware::auth::optional_auth;
use crate::AppState;

/// GET /api/debug/test - who am I, and what did you receive
pub async fn debug_test(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<Value> {
    let user_id = optional_auth(&headers, &state.config.jwt_secret)
        .map(|auth| auth.claims.sub)
        .unwrap_or_else(|| "not authenticated".to_string());

    let echoed: Map<String, Value> = headers
        .iter()
        .filter(|(name, _)| name.as_str() != "authorization")
        .map(|(name, value)| {
            (
                name.to_string(),
                Value::String(value.to_str().unwrap_or("<binary>").to_string()),
            )
        })
        .collect();

    Json(json!({
        "success": true,
        "message": "Debug endpoint working",
        "userId": user_id,
        "timestamp": Utc::now().to_rfc3339(),
        "headers": echoed,
    }))
}

/// GET /api/test-simple
pub async fn test_simple_get() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Simple test endpoint working",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// POST /api/test-simple - echoes the JSON body
pub async fn test_simple_post(body: Bytes) -> impl IntoResponse {
    match serde_json::from_slice::<Value>(&body) {
        Ok(received) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "POST test endpoint working",
                "receivedData": received,
                "timestamp": Utc::now().to_rfc3339(),
            })),
        ),
        Err(e) => {
            tracing::warn!("test-simple received invalid JSON: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                    "timestamp": Utc::now().to_rfc3339(),
                })),
            )
        }
    }
}

pub fn debug_routes() -> Router {
    Router::new()
        .route("/api/debug/test", get(debug_test))
        .route("/api/test-simple", get(test_simple_get).post(test_simple_post))
}
