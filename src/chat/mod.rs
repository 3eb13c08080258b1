// src/chat/mod.rs
pub mod controller;
pub mod faculty_query;
pub mod format;
pub mod intent;
pub mod session;
pub mod store;
pub mod transcript;

pub use controller::{ChatController, ChatReply};
pub use intent::{Intent, IntentRouter};
pub use session::{ChatSession, MessPhase, MessSnapshot};
pub use store::{session_key, SessionStore};
