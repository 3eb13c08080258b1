// src/chat/transcript.rs
use serde::Serialize;

use crate::models::chat::{Message, Payload};
use crate::models::mess::MessMenu;

/// Append-only list of chat bubbles. The only other mutation is a full reset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    entries: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.entries.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// Appends a menu unless the immediately preceding entry already shows the same
    /// hostel, mess type and day. Returns whether an entry was added.
    pub fn push_menu(&mut self, content: impl Into<String>, menu: MessMenu) -> bool {
        let duplicate = self
            .entries
            .last()
            .and_then(Message::mess_menu)
            .map(|previous| previous.same_selection(&menu))
            .unwrap_or(false);

        if duplicate {
            tracing::debug!(
                "Skipping duplicate menu for {}/{} day {}",
                menu.hostel_type,
                menu.mess_type,
                menu.selected_date
            );
            return false;
        }

        self.push(Message::assistant_with(content, Payload::MessMenu { mess_menu: menu }));
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries appended at or after `index`.
    pub fn since(&self, index: usize) -> Vec<Message> {
        self.entries.get(index..).map(<[Message]>::to_vec).unwrap_or_default()
    }
}
