// src/config.rs
use std::time::Duration;

pub const DEFAULT_MESSIT_URL: &str = "https://messit.vinnovateit.com/details";
pub const DEFAULT_SEMESTER_LABEL: &str = "Fall Semester 2025-26";

/// Runtime configuration, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    /// Base URL of the prompt-answering and VTOP collaborator.
    pub campus_api_url: String,
    /// Base URL of the mess API used by the server fallback path.
    pub mess_api_url: String,
    pub messit_url: String,
    pub messit_proxy_url: Option<String>,
    pub direct_scrape: bool,
    pub mess_cache_ttl: Duration,
    /// Chat sessions untouched for this long are dropped.
    pub chat_session_idle: Duration,
    pub current_semester_label: String,
    pub upstream_timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            jwt_secret: "default_secret".to_string(),
            campus_api_url: "http://127.0.0.1:3001".to_string(),
            mess_api_url: "http://127.0.0.1:3000".to_string(),
            messit_url: DEFAULT_MESSIT_URL.to_string(),
            messit_proxy_url: None,
            direct_scrape: true,
            mess_cache_ttl: Duration::from_secs(300),
            chat_session_idle: Duration::from_secs(1800),
            current_semester_label: DEFAULT_SEMESTER_LABEL.to_string(),
            upstream_timeout: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let jwt_secret = match std::env::var("JWT_SECRET").ok() {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not found. Falling back to the development secret.");
                defaults.jwt_secret.clone()
            }
        };

        let messit_proxy_url = std::env::var("MESSIT_PROXY_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let direct_scrape = std::env::var("MESSIT_DIRECT_SCRAPE")
            .map(|v| parse_flag(&v))
            .unwrap_or(defaults.direct_scrape);

        let mess_cache_ttl = std::env::var("MESS_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.mess_cache_ttl);

        let chat_session_idle = std::env::var("CHAT_SESSION_IDLE_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.chat_session_idle);

        let upstream_timeout = std::env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
            jwt_secret,
            campus_api_url: env_or("CAMPUS_API_URL", defaults.campus_api_url),
            mess_api_url: env_or("MESS_API_URL", defaults.mess_api_url),
            messit_url: env_or("MESSIT_URL", defaults.messit_url),
            messit_proxy_url,
            direct_scrape,
            mess_cache_ttl,
            chat_session_idle,
            current_semester_label: env_or("CURRENT_SEMESTER_LABEL", defaults.current_semester_label),
            upstream_timeout,
        }
    }

    /// Builds the shared outbound HTTP client. No timeout unless one is configured.
    pub fn http_client(&self) -> reqwest::Client {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().unwrap_or_else(|e| {
            tracing::warn!("Failed to build configured HTTP client ({}), using defaults", e);
            reqwest::Client::new()
        })
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
