// src/campus_client.rs
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::models::mess::{MenuRequest, MessMenu, MessOptions};
use crate::models::vtop::{
    AssignmentsResponse, CourseDetails, FacultyDetailsResponse, FacultySearchResponse,
    GenerateResponse,
};

/// JSON client for the same-origin API surface: prompt answering, the VTOP proxy
/// routes and the mess API. Forwards the caller's bearer token when given one.
#[derive(Debug, Clone)]
pub struct CampusClient {
    client: Client,
    base_url: String,
}

impl CampusClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Reads a `{success, ...}` envelope. `fallback` is the message used when a failed
    /// answer carries no `error` of its own.
    async fn read_envelope<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, AppError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::AuthRequired);
        }

        let body = read_json_body(response).await?;

        let error_message = body
            .get("error")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        if !status.is_success() {
            return Err(AppError::UpstreamFailure(
                error_message.unwrap_or_else(|| fallback.to_string()),
            ));
        }

        if body.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(AppError::UpstreamFailure(
                error_message.unwrap_or_else(|| fallback.to_string()),
            ));
        }

        serde_json::from_value(body).map_err(|e| {
            error!("Unexpected response shape: {}", e);
            AppError::UpstreamFailure(format!("{} (unexpected response: {})", fallback, e))
        })
    }

    /// POST /api/generate. Error statuses with a JSON body are still answers.
    pub async fn generate(&self, prompt: &str, token: Option<&str>) -> Result<GenerateResponse, AppError> {
        info!("🤖 Forwarding prompt to generate endpoint ({} chars)", prompt.len());
        let request = self.client.post(self.url("/api/generate")).json(&json!({ "prompt": prompt }));
        let response = Self::authorized(request, token).send().await?;

        if !is_json(&response) {
            let text = response.text().await?;
            error!("Non-JSON response from /api/generate: {}", text);
            return Err(classify_generate_non_json(&text));
        }

        let body = response.json::<Value>().await?;
        serde_json::from_value(body)
            .map_err(|e| AppError::UpstreamFailure(format!("Unexpected response from generate: {}", e)))
    }

    /// GET without a semester, POST `{semesterLabel}` with one.
    pub async fn assignments(
        &self,
        semester_label: Option<&str>,
        token: Option<&str>,
    ) -> Result<AssignmentsResponse, AppError> {
        let url = self.url("/api/vtop/assignments");
        let request = match semester_label {
            Some(label) => self.client.post(url).json(&json!({ "semesterLabel": label })),
            None => self.client.get(url),
        };
        let response = Self::authorized(request, token).send().await?;
        Self::read_envelope(response, "Failed to fetch assignments").await
    }

    pub async fn assignment_details(&self, class_id: &str, token: Option<&str>) -> Result<CourseDetails, AppError> {
        let request = self
            .client
            .post(self.url("/api/vtop/assignment-details"))
            .json(&json!({ "classId": class_id }));
        let response = Self::authorized(request, token).send().await?;
        Self::read_envelope(response, "Failed to fetch course details").await
    }

    pub async fn faculty_search(&self, search_query: &str, token: Option<&str>) -> Result<FacultySearchResponse, AppError> {
        let request = self
            .client
            .post(self.url("/api/vtop/faculty-search"))
            .json(&json!({ "searchQuery": search_query }));
        let response = Self::authorized(request, token).send().await?;
        let mut result: FacultySearchResponse = Self::read_envelope(response, "Failed to search faculty").await?;
        if result.search_query.is_empty() {
            result.search_query = search_query.to_string();
        }
        Ok(result)
    }

    pub async fn faculty_details(&self, employee_id: &str, token: Option<&str>) -> Result<FacultyDetailsResponse, AppError> {
        let request = self
            .client
            .post(self.url("/api/vtop/faculty-details"))
            .json(&json!({ "employeeId": employee_id }));
        let response = Self::authorized(request, token).send().await?;
        Self::read_envelope(response, "Failed to fetch faculty details").await
    }

    pub async fn mess_options(&self, token: Option<&str>) -> Result<MessOptions, AppError> {
        let request = self.client.get(self.url("/api/mess"));
        let response = Self::authorized(request, token).send().await?;
        Self::read_envelope(response, "Failed to fetch mess options").await
    }

    pub async fn mess_menu(&self, request: &MenuRequest, token: Option<&str>) -> Result<MessMenu, AppError> {
        debug!(
            "Requesting mess menu from {} for {}/{} day {:?}",
            self.base_url, request.hostel_type, request.mess_type, request.selected_date
        );
        let builder = self.client.post(self.url("/api/mess")).json(request);
        let response = Self::authorized(builder, token).send().await?;
        Self::read_envelope(response, "Failed to fetch mess menu").await
    }

    /// DELETE /api/mess. The answer is ignored; callers only log failures.
    pub async fn reset_mess_session(&self, token: Option<&str>) -> Result<(), AppError> {
        let request = self.client.delete(self.url("/api/mess"));
        let response = Self::authorized(request, token).send().await?;
        if !response.status().is_success() {
            warn!("Mess session reset answered {}", response.status());
        }
        Ok(())
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false)
}

async fn read_json_body(response: Response) -> Result<Value, AppError> {
    if !is_json(&response) {
        let text = response.text().await?;
        error!("Non-JSON response from upstream: {}", text.chars().take(200).collect::<String>());
        return Err(AppError::non_json(&text));
    }
    Ok(response.json::<Value>().await?)
}

fn classify_generate_non_json(text: &str) -> AppError {
    if text.contains("Unauthorized") || text.contains("401") || text.contains("sign-in") {
        AppError::UpstreamFailure("Authentication failed. Please refresh the page and try again.".to_string())
    } else if text.contains("500") || text.contains("Internal Server Error") {
        AppError::UpstreamFailure("Server error. Please try again in a moment.".to_string())
    } else {
        AppError::non_json(text)
    }
}
