// src/mess/messit_client.rs
use reqwest::Client;
use tracing::{error, info};

use crate::error::AppError;

pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Fetches the raw Messit details page, optionally through a CORS-style proxy prefix.
#[derive(Debug, Clone)]
pub struct MessitClient {
    client: Client,
    target_url: String,
    proxy_url: Option<String>,
}

impl MessitClient {
    pub fn new(client: Client, target_url: String) -> Self {
        Self {
            client,
            target_url,
            proxy_url: None,
        }
    }

    pub fn with_proxy(mut self, proxy_url: Option<String>) -> Self {
        self.proxy_url = proxy_url;
        self
    }

    /// The URL actually requested: proxy prefix + target when a proxy is set.
    pub fn request_url(&self) -> String {
        match &self.proxy_url {
            Some(proxy) => format!("{}{}", proxy, self.target_url),
            None => self.target_url.clone(),
        }
    }

    pub async fn fetch_page(&self) -> Result<String, AppError> {
        let url = self.request_url();
        info!("🌐 Fetching mess menu page: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("Messit page fetch failed with {}", status);
            return Err(AppError::UpstreamFailure(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let html = response.text().await?;
        info!("✅ HTML fetched, length: {}", html.len());
        Ok(html)
    }
}
