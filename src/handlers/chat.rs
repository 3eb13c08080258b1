// src/handlers/chat.rs
//! Conversation endpoints. Every answer carries the messages appended by the call and
//! the current mess selection state.

use axum::{
    extract::{Extension, Path},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::chat::{session_key, ChatReply};
use crate::error::AppError;
use crate::middleware::auth::auth_middleware;
use crate::models::auth::AuthContext;
use crate::models::chat::{QuickAction, QUICK_ACTIONS};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterRequest {
    #[serde(default)]
    pub semester_label: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    #[serde(deserialize_with = "crate::models::required_text")]
    pub class_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyRequest {
    #[serde(deserialize_with = "crate::models::required_text")]
    pub employee_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessSelectionRequest {
    #[serde(default)]
    pub hostel_type: Option<String>,
    #[serde(default)]
    pub mess_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessDateRequest {
    #[serde(default, deserialize_with = "crate::models::optional_u32_lenient")]
    pub day_number: Option<u32>,
}

fn key(auth: &AuthContext, session_id: &str) -> String {
    session_key(auth.user_id(), session_id)
}

/// POST /api/chat/sessions - start a fresh conversation
pub async fn create_session(
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state.chat.start_session(auth.user_id()).await?;
    tracing::info!("💬 Chat session started for {}", auth.user_id());
    Ok(Json(reply))
}

/// GET /api/chat/sessions/:id - transcript and mess state
pub async fn get_session(
    Path(session_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ChatReply>, AppError> {
    Ok(Json(state.chat.transcript(&key(&auth, &session_id)).await?))
}

/// DELETE /api/chat/sessions/:id - end the conversation
pub async fn end_session(
    Path(session_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ChatReply>, AppError> {
    Ok(Json(state.chat.end_session(&key(&auth, &session_id)).await?))
}

/// POST /api/chat/sessions/:id/messages
pub async fn post_message(
    Path(session_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state
        .chat
        .submit_prompt(&key(&auth, &session_id), &request.prompt, Some(&auth.token))
        .await?;
    Ok(Json(reply))
}

/// POST /api/chat/sessions/:id/assignments - semester selector
pub async fn select_semester(
    Path(session_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<SemesterRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state
        .chat
        .fetch_assignments(
            &key(&auth, &session_id),
            request.semester_label.as_deref(),
            Some(&auth.token),
        )
        .await?;
    Ok(Json(reply))
}

/// POST /api/chat/sessions/:id/courses - course selector
pub async fn select_course(
    Path(session_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CourseRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state
        .chat
        .select_course(&key(&auth, &session_id), &request.class_id, Some(&auth.token))
        .await?;
    Ok(Json(reply))
}

/// POST /api/chat/sessions/:id/faculty - faculty selector
pub async fn select_faculty(
    Path(session_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<FacultyRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state
        .chat
        .select_faculty(&key(&auth, &session_id), &request.employee_id, Some(&auth.token))
        .await?;
    Ok(Json(reply))
}

/// POST /api/chat/sessions/:id/mess/selection
pub async fn mess_selection(
    Path(session_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<MessSelectionRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state
        .chat
        .mess_selection(
            &key(&auth, &session_id),
            request.hostel_type.as_deref(),
            request.mess_type.as_deref(),
        )
        .await?;
    Ok(Json(reply))
}

/// POST /api/chat/sessions/:id/mess/confirm
pub async fn mess_confirm(
    Path(session_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state
        .chat
        .mess_confirm(&key(&auth, &session_id), Some(&auth.token))
        .await?;
    Ok(Json(reply))
}

/// POST /api/chat/sessions/:id/mess/date
pub async fn mess_date(
    Path(session_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<MessDateRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let day = request
        .day_number
        .ok_or_else(|| AppError::BadRequest("dayNumber is required".to_string()))?;
    let reply = state
        .chat
        .mess_date(&key(&auth, &session_id), day, Some(&auth.token))
        .await?;
    Ok(Json(reply))
}

/// GET /api/quick-actions
pub async fn quick_actions() -> Json<&'static [QuickAction]> {
    Json(QUICK_ACTIONS)
}

pub fn chat_routes() -> Router {
    let public_routes = Router::new().route("/api/quick-actions", get(quick_actions));

    let protected_routes = Router::new()
        .route("/api/chat/sessions", post(create_session))
        .route("/api/chat/sessions/:session_id", get(get_session).delete(end_session))
        .route("/api/chat/sessions/:session_id/messages", post(post_message))
        .route("/api/chat/sessions/:session_id/assignments", post(select_semester))
        .route("/api/chat/sessions/:session_id/courses", post(select_course))
        .route("/api/chat/sessions/:session_id/faculty", post(select_faculty))
        .route("/api/chat/sessions/:session_id/mess/selection", post(mess_selection))
        .route("/api/chat/sessions/:session_id/mess/confirm", post(mess_confirm))
        .route("/api/chat/sessions/:session_id/mess/date", post(mess_date))
        .layer(axum::middleware::from_fn(auth_middleware));

    public_routes.merge(protected_routes)
}

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;
    use crate::test_support::{bearer, call};
    use crate::{build_router, AppState};
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(campus_url: String) -> axum::Router {
        build_router(AppState::from_config(AppConfig {
            jwt_secret: "test-secret".into(),
            campus_api_url: campus_url.clone(),
            mess_api_url: campus_url,
            direct_scrape: false,
            ..AppConfig::default()
        }))
    }

    async fn new_session(app: &axum::Router, token: &str) -> String {
        let (status, body) = call(app, Method::POST, "/api/chat/sessions", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        body["sessionId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_quick_actions_are_public() {
        let (status, body) = call(&app("http://127.0.0.1:9".into()), Method::GET, "/api/quick-actions", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 10);
        assert_eq!(body[0]["label"], "Faculty");
    }

    #[tokio::test]
    async fn test_chat_requires_a_token() {
        let (status, body) = call(&app("http://127.0.0.1:9".into()), Method::POST, "/api/chat/sessions", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");
    }

    #[tokio::test]
    async fn test_prompt_forwards_caller_token() {
        let server = MockServer::start().await;
        let token = bearer("test-secret", "user_1");
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "Please log in to VTOP first.",
                "requiresVtopLogin": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = app(server.uri());
        let session_id = new_session(&app, &token).await;
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/chat/sessions/{}/messages", session_id),
            Some(&token),
            Some(json!({"prompt": "List upcoming exams and dates"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["intent"], "generic");
        assert_eq!(body["messages"][1]["content"], "Please log in to VTOP first.");
        assert_eq!(body["messages"][1]["payload"]["kind"], "generated");
        assert_eq!(body["messages"][1]["payload"]["requiresVtopLogin"], true);
        assert_eq!(body["mess"]["phase"], "idle");
    }

    #[tokio::test]
    async fn test_sessions_are_scoped_to_their_owner() {
        let app = app("http://127.0.0.1:9".into());
        let alice = bearer("test-secret", "alice");
        let bob = bearer("test-secret", "bob");
        let session_id = new_session(&app, &alice).await;

        let uri = format!("/api/chat/sessions/{}", session_id);
        let (status, _) = call(&app, Method::GET, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(&app, Method::GET, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_mess_flow_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/mess"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/mess"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "hostelTypes": [{"name": "MH", "label": "Men's Hostel"}],
                "messTypes": [{"name": "Veg", "label": "Veg"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/mess"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "hostelType": "MH",
                "messType": "Veg",
                "date": "2025-10-06",
                "dayName": "Monday",
                "selectedDate": 6,
                "menuItems": [{"meal": "Dinner", "items": ["Chapati"], "time": "7:00 PM - 9:00 PM"}],
                "availableDates": [],
                "isRealTime": true
            })))
            .mount(&server)
            .await;

        let app = app(server.uri());
        let token = bearer("test-secret", "user_1");
        let session_id = new_session(&app, &token).await;
        let base = format!("/api/chat/sessions/{}", session_id);

        let (_, body) = call(&app, Method::POST, &format!("{}/messages", base), Some(&token), Some(json!({"prompt": "mess menu"}))).await;
        assert_eq!(body["intent"], "mess");
        assert_eq!(body["mess"]["phase"], "optionsReady");

        // confirming before choosing is rejected
        let (status, _) = call(&app, Method::POST, &format!("{}/mess/confirm", base), Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("{}/mess/selection", base),
            Some(&token),
            Some(json!({"hostelType": "MH", "messType": "Veg"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["messages"].as_array().unwrap().is_empty());
        assert_eq!(body["mess"]["hostelType"], "MH");

        let (_, body) = call(&app, Method::POST, &format!("{}/mess/confirm", base), Some(&token), None).await;
        assert_eq!(body["mess"]["phase"], "menuReady");
        assert_eq!(body["messages"][0]["payload"]["kind"], "mess_menu");
        assert_eq!(body["messages"][0]["payload"]["messMenu"]["menuItems"][0]["meal"], "Dinner");

        let (status, _) = call(&app, Method::POST, &format!("{}/mess/date", base), Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, Method::DELETE, &base, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["messages"].as_array().unwrap().is_empty());
        assert_eq!(body["mess"]["phase"], "idle");

        let (status, _) = call(&app, Method::GET, &base, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deleted_sessions_leave_the_store() {
        let app = app("http://127.0.0.1:9".into());
        let token = bearer("test-secret", "user_1");

        for _ in 0..5 {
            let session_id = new_session(&app, &token).await;
            let uri = format!("/api/chat/sessions/{}", session_id);
            let (status, _) = call(&app, Method::DELETE, &uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = call(&app, Method::GET, "/api/status", None, None).await;
        assert_eq!(body["features"]["active_sessions"], 0);
    }
}
