// src/chat/store.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::chat::session::ChatSession;

/// Key of one conversation: the authenticated user plus their session id.
pub fn session_key(user_id: &str, session_id: &str) -> String {
    format!("{}:{}", user_id, session_id)
}

struct StoredSession {
    session: Arc<Mutex<ChatSession>>,
    last_active: DateTime<Utc>,
}

/// In-memory conversations. Each session has its own lock so a slow upstream call in
/// one chat never blocks another. With an idle limit set, sessions untouched for that
/// long are dropped.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
    idle_ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl: Some(idle_ttl),
        }
    }

    fn is_idle(&self, stored: &StoredSession) -> bool {
        let Some(ttl) = self.idle_ttl else {
            return false;
        };
        let age = Utc::now().signed_duration_since(stored.last_active);
        age.to_std().map(|age| age >= ttl).unwrap_or(false)
    }

    /// Looks up a live session and marks it active.
    pub async fn get(&self, key: &str) -> Option<Arc<Mutex<ChatSession>>> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get_mut(key)?;
        if self.is_idle(stored) {
            sessions.remove(key);
            tracing::info!("⌛ Chat session expired: {}", key);
            return None;
        }
        stored.last_active = Utc::now();
        Some(stored.session.clone())
    }

    pub async fn get_or_create(&self, key: &str) -> Arc<Mutex<ChatSession>> {
        if let Some(session) = self.get(key).await {
            return session;
        }

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| !self.is_idle(stored));
        if sessions.len() < before {
            tracing::info!("⌛ Expired {} idle chat session(s)", before - sessions.len());
        }

        sessions
            .entry(key.to_string())
            .or_insert_with(|| {
                tracing::info!("💬 New chat session: {}", key);
                StoredSession {
                    session: Arc::new(Mutex::new(ChatSession::default())),
                    last_active: Utc::now(),
                }
            })
            .session
            .clone()
    }

    /// Clears the session in place, creating it if needed.
    pub async fn reset(&self, key: &str) -> Arc<Mutex<ChatSession>> {
        let session = self.get_or_create(key).await;
        session.lock().await.reset();
        session
    }

    pub async fn remove(&self, key: &str) -> bool {
        let removed = self.sessions.write().await.remove(key).is_some();
        if removed {
            tracing::info!("🗑️ Removed chat session: {}", key);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
