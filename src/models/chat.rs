// src/models/chat.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mess::{MessMenu, MessOptions};
use super::vtop::{AssignmentSummary, CourseDetails, FacultyDetails, FacultySummary, Semester};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Structured data riding along with a chat bubble; drives the selectors the UI shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    #[serde(rename_all = "camelCase")]
    Assignments {
        assignments: Vec<AssignmentSummary>,
        semester: Option<Semester>,
        semesters: Vec<Semester>,
        show_semester_dropdown: bool,
    },
    #[serde(rename_all = "camelCase")]
    CourseDetails { course_details: CourseDetails },
    #[serde(rename_all = "camelCase")]
    FacultyResults {
        faculty_results: Vec<FacultySummary>,
        search_query: String,
        show_faculty_dropdown: bool,
    },
    #[serde(rename_all = "camelCase")]
    FacultyDetails { faculty_details: FacultyDetails },
    #[serde(rename_all = "camelCase")]
    MessOptions { mess_options: MessOptions },
    #[serde(rename_all = "camelCase")]
    MessMenu { mess_menu: MessMenu },
    #[serde(rename_all = "camelCase")]
    Generated {
        faculties: Option<Vec<serde_json::Value>>,
        club: Option<serde_json::Value>,
        requires_vtop_login: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), None)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), None)
    }

    pub fn assistant_with(content: impl Into<String>, payload: Payload) -> Self {
        Self::new(Role::Assistant, content.into(), Some(payload))
    }

    fn new(role: Role, content: String, payload: Option<Payload>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            payload,
            created_at: Utc::now(),
        }
    }

    pub fn mess_menu(&self) -> Option<&MessMenu> {
        match &self.payload {
            Some(Payload::MessMenu { mess_menu }) => Some(mess_menu),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickAction {
    pub label: &'static str,
    pub fill: &'static str,
}

pub const QUICK_ACTIONS: &[QuickAction] = &[
    QuickAction { label: "Faculty", fill: "Who is devipriya a ma'am" },
    QuickAction { label: "Clubs", fill: "What's csed club?" },
    QuickAction { label: "Exams", fill: "List upcoming exams and dates" },
    QuickAction { label: "Assignments", fill: "Any assignments due this week?" },
    QuickAction { label: "Course Materials", fill: "Provide my course materials for DSA" },
    QuickAction { label: "Mess Menu", fill: "Show me today's mess menu" },
    QuickAction { label: "Club Events", fill: "Show club events happening this weekend" },
    QuickAction { label: "Fees", fill: "Fees due and last payment date" },
    QuickAction { label: "My Attendance", fill: "Show my attendance" },
    QuickAction { label: "My Assignments", fill: "Show my digital assignments" },
];
