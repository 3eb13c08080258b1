// src/models/vtop.rs
//! Shapes returned by the generate/VTOP collaborator. Fields the portal sometimes omits
//! are optional so a sparse answer still renders.

use serde::{Deserialize, Serialize};

use super::optional_text_lenient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub label: String,
    #[serde(default, deserialize_with = "optional_text_lenient", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSummary {
    #[serde(default, deserialize_with = "optional_text_lenient")]
    pub class_id: Option<String>,
    pub course_code: String,
    pub course_title: String,
    #[serde(default)]
    pub course_type: Option<String>,
    #[serde(default)]
    pub faculty_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentsResponse {
    #[serde(default)]
    pub assignments: Vec<AssignmentSummary>,
    #[serde(default)]
    pub semester: Option<Semester>,
    #[serde(default)]
    pub semesters: Vec<Semester>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInfo {
    pub course_code: String,
    pub course_title: String,
    #[serde(default, deserialize_with = "optional_text_lenient")]
    pub course_type: Option<String>,
    #[serde(default, deserialize_with = "optional_text_lenient")]
    pub class_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAssignment {
    pub title: String,
    #[serde(default, deserialize_with = "optional_text_lenient")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "optional_text_lenient")]
    pub max_mark: Option<String>,
    #[serde(default, deserialize_with = "optional_text_lenient")]
    pub weightage: Option<String>,
    #[serde(default, deserialize_with = "optional_text_lenient")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails {
    #[serde(default)]
    pub course_info: Option<CourseInfo>,
    #[serde(default)]
    pub assignments: Option<Vec<CourseAssignment>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultySummary {
    pub name: String,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(deserialize_with = "super::required_text")]
    pub employee_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultySearchResponse {
    #[serde(default)]
    pub results: Vec<FacultySummary>,
    #[serde(default)]
    pub search_query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenHour {
    pub day: String,
    pub timing: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cabin: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub open_hours: Vec<OpenHour>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacultyDetailsResponse {
    #[serde(default)]
    pub details: Option<FacultyDetails>,
}

/// Answer of the generic prompt collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub faculties: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub faculty: Option<serde_json::Value>,
    #[serde(default)]
    pub club: Option<serde_json::Value>,
    #[serde(default)]
    pub requires_vtop_login: bool,
}

impl GenerateResponse {
    pub fn content(&self) -> String {
        self.text
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| self.error.clone().filter(|e| !e.is_empty()))
            .unwrap_or_else(|| "No response".to_string())
    }

    /// `faculties` wins; a single `faculty` is lifted into a one-element list.
    pub fn faculty_cards(&self) -> Option<Vec<serde_json::Value>> {
        self.faculties
            .clone()
            .or_else(|| self.faculty.clone().map(|f| vec![f]))
    }
}
