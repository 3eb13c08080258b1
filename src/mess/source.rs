// src/mess/source.rs
//! One capability, two ways of getting a menu: scrape the page directly, or ask the
//! mess API to do it. `MenuFetcher` tries the direct path first.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use tracing::{info, warn};

use crate::campus_client::CampusClient;
use crate::error::AppError;
use crate::mess::extract::build_menu;
use crate::mess::messit_client::MessitClient;
use crate::models::mess::{MenuOrigin, MenuRequest, MessMenu};

#[async_trait]
pub trait MenuSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this source can be used at all in the current deployment.
    fn is_available(&self) -> bool {
        true
    }

    async fn fetch_menu(&self, request: &MenuRequest, token: Option<&str>) -> Result<MessMenu, AppError>;
}

/// Fetches the Messit page itself and extracts the menu in-process.
pub struct ScrapeMenuSource {
    messit: MessitClient,
    enabled: bool,
}

impl ScrapeMenuSource {
    pub fn new(messit: MessitClient, enabled: bool) -> Self {
        Self { messit, enabled }
    }
}

#[async_trait]
impl MenuSource for ScrapeMenuSource {
    fn name(&self) -> &'static str {
        "direct-scrape"
    }

    fn is_available(&self) -> bool {
        self.enabled
    }

    async fn fetch_menu(&self, request: &MenuRequest, _token: Option<&str>) -> Result<MessMenu, AppError> {
        if !self.enabled {
            return Err(AppError::Extraction("direct scraping is disabled".to_string()));
        }

        let html = self.messit.fetch_page().await?;
        let today = Local::now().date_naive();
        let menu = build_menu(&html, request, today, MenuOrigin::ClientSideScraping)?;

        // An empty page is more likely a layout change than a day without food.
        if menu.menu_items.is_empty() {
            return Err(AppError::Extraction("no meal sections found on the page".to_string()));
        }

        info!("✅ Menu extracted: {} meals", menu.menu_items.len());
        Ok(menu)
    }
}

/// Delegates to `POST /api/mess` on the mess API.
pub struct ApiMenuSource {
    api: CampusClient,
}

impl ApiMenuSource {
    pub fn new(api: CampusClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl MenuSource for ApiMenuSource {
    fn name(&self) -> &'static str {
        "mess-api"
    }

    async fn fetch_menu(&self, request: &MenuRequest, token: Option<&str>) -> Result<MessMenu, AppError> {
        self.api.mess_menu(request, token).await
    }
}

pub struct MenuFetcher {
    primary: Option<Arc<dyn MenuSource>>,
    fallback: Arc<dyn MenuSource>,
}

impl MenuFetcher {
    pub fn new(primary: Option<Arc<dyn MenuSource>>, fallback: Arc<dyn MenuSource>) -> Self {
        Self { primary, fallback }
    }

    /// Primary source first when available; any primary error falls through to the
    /// fallback without surfacing. The fallback's error is the result.
    pub async fn fetch(&self, request: &MenuRequest, token: Option<&str>) -> Result<MessMenu, AppError> {
        if let Some(primary) = self.primary.as_ref().filter(|p| p.is_available()) {
            match primary.fetch_menu(request, token).await {
                Ok(menu) => return Ok(menu),
                Err(e) => warn!(
                    "⚠ {} failed, falling back to {}: {}",
                    primary.name(),
                    self.fallback.name(),
                    e
                ),
            }
        }

        info!("🔄 Using {} for mess menu", self.fallback.name());
        self.fallback.fetch_menu(request, token).await
    }
}
