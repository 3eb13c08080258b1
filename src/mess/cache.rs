// src/mess/cache.rs
//! Per-user cache of the fetched Messit page, so switching dates does not refetch.
//! Dropping a user's entry is what "resetting the messit session" means server-side.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::mess::messit_client::MessitClient;

#[derive(Debug, Clone)]
pub struct CachedPage {
    pub html: String,
    pub fetched_at: DateTime<Utc>,
}

pub struct MenuPageCache {
    pages: RwLock<HashMap<String, CachedPage>>,
    ttl: Duration,
}

impl MenuPageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pages: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn is_fresh(&self, page: &CachedPage) -> bool {
        let age = Utc::now().signed_duration_since(page.fetched_at);
        age.to_std().map(|age| age < self.ttl).unwrap_or(true)
    }

    pub async fn get(&self, user_id: &str) -> Option<CachedPage> {
        let pages = self.pages.read().await;
        pages.get(user_id).filter(|page| self.is_fresh(page)).cloned()
    }

    /// Stores a page and drops every expired one. Nothing is kept with a zero TTL.
    pub async fn insert(&self, user_id: &str, html: String) {
        let mut pages = self.pages.write().await;
        pages.retain(|_, page| self.is_fresh(page));
        if self.ttl.is_zero() {
            return;
        }
        pages.insert(
            user_id.to_string(),
            CachedPage {
                html,
                fetched_at: Utc::now(),
            },
        );
    }

    /// Returns the cached page for `user_id`, fetching it when missing or expired.
    pub async fn get_or_fetch(&self, user_id: &str, messit: &MessitClient) -> Result<String, AppError> {
        if let Some(page) = self.get(user_id).await {
            tracing::debug!("Serving cached mess page for {}", user_id);
            return Ok(page.html);
        }

        let html = messit.fetch_page().await?;
        self.insert(user_id, html.clone()).await;
        Ok(html)
    }

    /// Returns whether an entry existed.
    pub async fn evict(&self, user_id: &str) -> bool {
        self.pages.write().await.remove(user_id).is_some()
    }
}
