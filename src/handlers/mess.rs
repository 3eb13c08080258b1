// src/handlers/mess.rs
//! Server side of the mess API: options, scraped menus and the per-user page cache.

use axum::{
    extract::Extension,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{Datelike, Local};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::AppError;
use crate::mess::extract::{self, MEAL_ITEMS_SELECTOR, MEAL_SECTION_SELECTOR, MEAL_TITLE_SELECTOR};
use crate::mess::messit_client::BROWSER_USER_AGENT;
use crate::mess::options::default_mess_options;
use crate::middleware::auth::auth_middleware;
use crate::models::auth::AuthContext;
use crate::models::mess::{ClientScrapeRequest, MenuOrigin, MenuRequest, MessMenu, MessOptions};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MessOptionsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub options: MessOptions,
}

#[derive(Debug, Serialize)]
pub struct MessMenuResponse {
    pub success: bool,
    #[serde(flatten)]
    pub menu: MessMenu,
}

/// GET /api/mess - hostel and mess types
pub async fn get_mess_options() -> Json<MessOptionsResponse> {
    Json(MessOptionsResponse {
        success: true,
        options: default_mess_options(),
    })
}

/// POST /api/mess - scrape the menu for a hostel, mess type and day
pub async fn post_mess_menu(
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<MenuRequest>,
) -> Result<Json<MessMenuResponse>, AppError> {
    let options = default_mess_options();
    if !options.has_hostel(&request.hostel_type) {
        return Err(AppError::BadRequest(format!("Unknown hostel type: {}", request.hostel_type)));
    }
    if !options.has_mess(&request.mess_type) {
        return Err(AppError::BadRequest(format!("Unknown mess type: {}", request.mess_type)));
    }

    let today = Local::now().date_naive();
    // reject a bad day before going to the network
    extract::resolve_day(today, request.selected_date)?;

    let html = state.menu_cache.get_or_fetch(auth.user_id(), &state.messit).await?;
    let menu = extract::build_menu(&html, &request, today, MenuOrigin::ServerSideScraping)?;

    tracing::info!(
        "🍽️ Served {}/{} menu for day {} ({} meals) to {}",
        menu.hostel_type,
        menu.mess_type,
        menu.selected_date,
        menu.menu_items.len(),
        auth.user_id()
    );

    Ok(Json(MessMenuResponse { success: true, menu }))
}

/// DELETE /api/mess - forget the caller's cached page
pub async fn reset_mess_session(
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Json<Value> {
    let cleared = state.menu_cache.evict(auth.user_id()).await;
    tracing::info!("🧹 Mess session reset for {} (cached page: {})", auth.user_id(), cleared);
    Json(json!({ "success": true, "cleared": cleared }))
}

/// POST /api/mess/client-scrape - how to scrape the page from the caller's side
pub async fn client_scrape_instructions(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<ClientScrapeRequest>,
) -> Json<Value> {
    let day_number = request
        .day_number
        .unwrap_or_else(|| Local::now().date_naive().day());

    Json(json!({
        "success": true,
        "instructions": {
            "method": "client-side-scraping",
            "url": state.config.messit_url,
            "headers": { "User-Agent": BROWSER_USER_AGENT },
            "selectors": {
                "mealSections": MEAL_SECTION_SELECTOR,
                "title": MEAL_TITLE_SELECTOR,
                "items": MEAL_ITEMS_SELECTOR,
            },
            "hostelType": request.hostel_type,
            "messType": request.mess_type,
            "dayNumber": day_number,
        },
        "fallback": {
            "message": "If client-side scraping fails, request the menu from POST /api/mess",
            "endpoint": "/api/mess",
        }
    }))
}

pub fn mess_routes() -> Router {
    Router::new()
        .route(
            "/api/mess",
            get(get_mess_options).post(post_mess_menu).delete(reset_mess_session),
        )
        .route("/api/mess/client-scrape", post(client_scrape_instructions))
        .layer(axum::middleware::from_fn(auth_middleware))
}
