// src/chat/intent.rs
//! Keyword intent routing. Rules are evaluated in priority order and the first match
//! wins; there is no scoring.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Assignments,
    Faculty,
    Mess,
    Generic,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Intent::Assignments => "assignments",
            Intent::Faculty => "faculty",
            Intent::Mess => "mess",
            Intent::Generic => "generic",
        };
        write!(f, "{}", label)
    }
}

const ASSIGNMENT_EXCLUSIONS: &[&str] = &["attendance", "show my", "my attendance", "show", "my"];

const FACULTY_KEYWORDS: &[&str] = &[
    "faculty",
    "professor",
    "teacher",
    "instructor",
    "who is",
    "search faculty",
    "find faculty",
];

/// First names that are looked up directly even without a faculty keyword.
pub const KNOWN_FACULTY_NAMES: &[&str] = &["devipriya", "thamil", "siva", "lakshmi", "ranjith", "murugan"];

const MESS_KEYWORDS: &[&str] = &[
    "mess menu",
    "mess",
    "cafeteria",
    "food",
    "menu",
    "dining",
    "hostel food",
    "what to eat",
    "today menu",
    "messit",
];

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

pub fn is_assignments_request(text: &str) -> bool {
    text.contains("digital assignment")
        || text == "da"
        || text == "assignments"
        || (text.contains("assignment") && !contains_any(text, ASSIGNMENT_EXCLUSIONS))
}

pub fn is_faculty_request(text: &str) -> bool {
    contains_any(text, FACULTY_KEYWORDS) || contains_any(text, KNOWN_FACULTY_NAMES)
}

pub fn is_mess_request(text: &str) -> bool {
    contains_any(text, MESS_KEYWORDS)
}

type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Ordered `(predicate, intent)` rules with a fallback.
pub struct IntentRouter {
    rules: Vec<(Predicate, Intent)>,
    fallback: Intent,
}

impl IntentRouter {
    pub fn builder() -> IntentRouterBuilder {
        IntentRouterBuilder::new()
    }

    /// Trims and lower-cases `utterance`, then returns the first matching intent.
    pub fn classify(&self, utterance: &str) -> Intent {
        let text = utterance.trim().to_lowercase();
        let intent = self
            .rules
            .iter()
            .find(|(predicate, _)| predicate(&text))
            .map(|(_, intent)| *intent)
            .unwrap_or(self.fallback);

        tracing::debug!("Classified '{}' as {}", text, intent);
        intent
    }
}

impl Default for IntentRouter {
    fn default() -> Self {
        IntentRouter::builder()
            .when(is_assignments_request, Intent::Assignments)
            .when(is_faculty_request, Intent::Faculty)
            .when(is_mess_request, Intent::Mess)
            .otherwise(Intent::Generic)
            .build()
    }
}

pub struct IntentRouterBuilder {
    rules: Vec<(Predicate, Intent)>,
    fallback: Intent,
}

impl IntentRouterBuilder {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Intent::Generic,
        }
    }

    pub fn when<F>(mut self, predicate: F, intent: Intent) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.rules.push((Box::new(predicate), intent));
        self
    }

    pub fn otherwise(mut self, intent: Intent) -> Self {
        self.fallback = intent;
        self
    }

    pub fn build(self) -> IntentRouter {
        IntentRouter {
            rules: self.rules,
            fallback: self.fallback,
        }
    }
}

impl Default for IntentRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
