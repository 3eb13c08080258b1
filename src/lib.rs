// lib.rs - campus assistant service: chat orchestration, VTOP proxy client, mess menus
use axum::{extract::Extension, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod campus_client;
pub mod chat;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mess;
pub mod middleware;
pub mod models;

use chat::ChatController;
use config::AppConfig;
use mess::{MenuPageCache, MessitClient};

/// Shared state handed to every handler through an `Extension`.
pub struct AppState {
    pub config: AppConfig,
    /// Server-side Messit fetcher behind `POST /api/mess`. Never proxied.
    pub messit: MessitClient,
    pub menu_cache: MenuPageCache,
    pub chat: ChatController,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Arc<Self> {
        let client = config.http_client();
        let messit = MessitClient::new(client.clone(), config.messit_url.clone());
        let menu_cache = MenuPageCache::new(config.mess_cache_ttl);
        let chat = ChatController::from_config(&config, client);

        Arc::new(Self {
            config,
            messit,
            menu_cache,
            chat,
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(handlers::chat::chat_routes())
        .merge(handlers::mess::mess_routes())
        .merge(handlers::debug::debug_routes())
        .route("/api/status", get(api_status))
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

// API Status endpoint
async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "campus_api": config.campus_api_url,
            "mess_api": config.mess_api_url,
            "messit": config.messit_url,
            "messit_proxy": config.messit_proxy_url.is_some(),
        },
        "features": {
            "direct_scrape": config.direct_scrape,
            "mess_cache_ttl_secs": config.mess_cache_ttl.as_secs(),
            "current_semester": config.current_semester_label,
            "active_sessions": state.chat.sessions().len().await,
        },
        "endpoints": {
            "status": "/api/status",
            "chat": "/api/chat/*",
            "mess": "/api/mess",
            "quick_actions": "/api/quick-actions",
            "debug": "/api/debug/test"
        }
    }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::models::auth::Claims;

    /// A valid HS256 token for `sub`, good for an hour.
    pub fn bearer(secret: &str, sub: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            email: None,
            exp: (now + 3600) as usize,
            iat: now as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };
        send(app, builder.body(body).unwrap()).await
    }

    /// Sends `raw` as a JSON-typed body without validating it.
    pub async fn call_raw(app: &Router, method: Method, uri: &str, raw: &'static str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(raw))
            .unwrap();
        send(app, request).await
    }
}
