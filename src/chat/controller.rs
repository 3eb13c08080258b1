// src/chat/controller.rs
//! Runs one chat turn: route the prompt, call the collaborator, append the answer.
//! Session locks are never held across a network call; responses that come back after a
//! newer request was issued are dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::campus_client::CampusClient;
use crate::chat::faculty_query::normalize_faculty_query;
use crate::chat::format;
use crate::chat::intent::{Intent, IntentRouter};
use crate::chat::session::{ChatSession, MessEffect, MessEvent, MessSnapshot};
use crate::chat::store::{session_key, SessionStore};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::mess::{ApiMenuSource, MenuFetcher, MenuSource, MessitClient, ScrapeMenuSource};
use crate::models::chat::{Message, Payload};
use crate::models::vtop::Semester;

type SharedSession = Arc<Mutex<ChatSession>>;

/// Body of every chat endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    pub messages: Vec<Message>,
    pub mess: MessSnapshot,
}

/// The semester picker is offered only when there is a choice and the portal did not
/// answer with the current semester.
pub fn show_semester_dropdown(semesters: &[Semester], semester: Option<&Semester>, current_label: &str) -> bool {
    semesters.len() > 1 && semester.map(|s| s.label.as_str()) != Some(current_label)
}

pub struct ChatController {
    router: IntentRouter,
    campus: CampusClient,
    mess_api: CampusClient,
    menus: MenuFetcher,
    sessions: SessionStore,
    current_semester_label: String,
}

impl ChatController {
    pub fn new(
        router: IntentRouter,
        campus: CampusClient,
        mess_api: CampusClient,
        menus: MenuFetcher,
        current_semester_label: impl Into<String>,
    ) -> Self {
        Self {
            router,
            campus,
            mess_api,
            menus,
            sessions: SessionStore::new(),
            current_semester_label: current_semester_label.into(),
        }
    }

    /// Wires collaborators from configuration: direct Messit scraping first (through the
    /// proxy when one is set), the mess API as fallback.
    pub fn from_config(config: &AppConfig, client: reqwest::Client) -> Self {
        let campus = CampusClient::new(client.clone(), config.campus_api_url.clone());
        let mess_api = CampusClient::new(client.clone(), config.mess_api_url.clone());

        let messit = MessitClient::new(client, config.messit_url.clone())
            .with_proxy(config.messit_proxy_url.clone());
        let primary: Arc<dyn MenuSource> = Arc::new(ScrapeMenuSource::new(messit, config.direct_scrape));
        let fallback: Arc<dyn MenuSource> = Arc::new(ApiMenuSource::new(mess_api.clone()));

        Self::new(
            IntentRouter::default(),
            campus,
            mess_api,
            MenuFetcher::new(Some(primary), fallback),
            config.current_semester_label.clone(),
        )
        .with_session_idle_ttl(config.chat_session_idle)
    }

    /// Drops chat sessions that stay untouched for `idle_ttl`.
    pub fn with_session_idle_ttl(mut self, idle_ttl: std::time::Duration) -> Self {
        self.sessions = SessionStore::with_idle_ttl(idle_ttl);
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Opens a fresh conversation for `user_id` and returns its id.
    pub async fn start_session(&self, user_id: &str) -> Result<ChatReply, AppError> {
        let session_id = Uuid::new_v4().to_string();
        let session = self.sessions.reset(&session_key(user_id, &session_id)).await;
        let mut reply = self.reply(&session, 0, None).await;
        reply.session_id = Some(session_id);
        Ok(reply)
    }

    async fn existing(&self, key: &str) -> Result<SharedSession, AppError> {
        self.sessions
            .get(key)
            .await
            .ok_or_else(|| AppError::NotFound("Chat session not found".to_string()))
    }

    /// Full transcript plus the mess snapshot.
    pub async fn transcript(&self, key: &str) -> Result<ChatReply, AppError> {
        let session = self.existing(key).await?;
        Ok(self.reply(&session, 0, None).await)
    }

    /// Ends the conversation. The session is cleared first so work still in flight for
    /// it lands on a bumped counter and is dropped.
    pub async fn end_session(&self, key: &str) -> Result<ChatReply, AppError> {
        let session = self.existing(key).await?;
        session.lock().await.reset();
        let reply = self.reply(&session, 0, None).await;
        self.sessions.remove(key).await;
        info!("🔄 Chat session ended: {}", key);
        Ok(reply)
    }

    async fn reply(&self, session: &SharedSession, since: usize, intent: Option<Intent>) -> ChatReply {
        let guard = session.lock().await;
        ChatReply {
            success: true,
            session_id: None,
            intent,
            messages: guard.transcript.since(since),
            mess: guard.mess.snapshot(),
        }
    }

    async fn mark(session: &SharedSession) -> usize {
        session.lock().await.transcript.len()
    }

    /// Appends the user's prompt and answers it. Blank prompts append nothing.
    pub async fn submit_prompt(&self, key: &str, prompt: &str, token: Option<&str>) -> Result<ChatReply, AppError> {
        let session = self.existing(key).await?;
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return Ok(self.reply(&session, usize::MAX, None).await);
        }

        let start = {
            let mut guard = session.lock().await;
            let start = guard.transcript.len();
            guard.transcript.push_user(trimmed);
            start
        };

        let intent = self.router.classify(trimmed);
        info!("💬 [{}] {} request", key, intent);

        match intent {
            Intent::Assignments => self.load_assignments(&session, None, token).await,
            Intent::Faculty => self.search_faculty(&session, trimmed, token).await,
            Intent::Mess => self.drive_mess(&session, MessEvent::Start, token).await?,
            Intent::Generic => self.answer_generic(&session, trimmed, token).await,
        }

        Ok(self.reply(&session, start, Some(intent)).await)
    }

    /// Semester selector: reloads assignments for `semester_label`, or the default
    /// semester when none is given.
    pub async fn fetch_assignments(
        &self,
        key: &str,
        semester_label: Option<&str>,
        token: Option<&str>,
    ) -> Result<ChatReply, AppError> {
        let session = self.existing(key).await?;
        let start = Self::mark(&session).await;
        let label = semester_label.map(str::trim).filter(|l| !l.is_empty());
        self.load_assignments(&session, label, token).await;
        Ok(self.reply(&session, start, None).await)
    }

    async fn load_assignments(&self, session: &SharedSession, semester_label: Option<&str>, token: Option<&str>) {
        let generation = session.lock().await.assignments.generation.issue();
        let result = self.campus.assignments(semester_label, token).await;

        let mut guard = session.lock().await;
        if !guard.assignments.generation.is_current(generation) {
            debug!("Dropping superseded assignments response (generation {})", generation);
            return;
        }

        match result {
            Ok(data) => {
                let show = show_semester_dropdown(&data.semesters, data.semester.as_ref(), &self.current_semester_label);
                let content = format::format_assignments(&data.assignments);

                guard.assignments.semesters = data.semesters.clone();
                guard.assignments.selected_semester = data.semester.as_ref().map(|s| s.label.clone());
                guard.assignments.show_semester_dropdown = show;
                guard.transcript.push(Message::assistant_with(
                    content,
                    Payload::Assignments {
                        assignments: data.assignments,
                        semester: data.semester,
                        semesters: data.semesters,
                        show_semester_dropdown: show,
                    },
                ));
            }
            Err(e) => guard
                .transcript
                .push_assistant(format!("Failed to fetch assignments: {}", e)),
        }
    }

    /// Course selector under an assignment list.
    pub async fn select_course(&self, key: &str, class_id: &str, token: Option<&str>) -> Result<ChatReply, AppError> {
        let class_id = class_id.trim();
        if class_id.is_empty() {
            return Err(AppError::BadRequest("classId is required".to_string()));
        }

        let session = self.existing(key).await?;
        let start = Self::mark(&session).await;
        let generation = session.lock().await.assignments.course_generation.issue();
        let result = self.campus.assignment_details(class_id, token).await;

        let mut guard = session.lock().await;
        if guard.assignments.course_generation.is_current(generation) {
            match result {
                Ok(details) => {
                    guard.assignments.selected_course = Some(class_id.to_string());
                    let content = format::format_course_details(&details);
                    guard
                        .transcript
                        .push(Message::assistant_with(content, Payload::CourseDetails { course_details: details }));
                }
                Err(e) => guard
                    .transcript
                    .push_assistant(format!("Failed to fetch course details: {}", e)),
            }
        } else {
            debug!("Dropping superseded course details for {}", class_id);
        }
        drop(guard);

        Ok(self.reply(&session, start, None).await)
    }

    async fn search_faculty(&self, session: &SharedSession, prompt: &str, token: Option<&str>) {
        let query = normalize_faculty_query(prompt);
        let generation = session.lock().await.faculty.generation.issue();
        let result = self.campus.faculty_search(&query, token).await;

        let mut guard = session.lock().await;
        if !guard.faculty.generation.is_current(generation) {
            debug!("Dropping superseded faculty search for '{}'", query);
            return;
        }

        match result {
            Ok(data) => {
                let content = format::format_faculty_results(&data.results, &data.search_query);
                guard.faculty.last_query = Some(data.search_query.clone());
                guard.faculty.results = data.results.clone();
                guard.faculty.selected_faculty = None;
                guard.transcript.push(Message::assistant_with(
                    content,
                    Payload::FacultyResults {
                        show_faculty_dropdown: !data.results.is_empty(),
                        faculty_results: data.results,
                        search_query: data.search_query,
                    },
                ));
            }
            Err(e) => guard
                .transcript
                .push_assistant(format!("Failed to search faculty: {}", e)),
        }
    }

    /// Faculty selector under a search result.
    pub async fn select_faculty(&self, key: &str, employee_id: &str, token: Option<&str>) -> Result<ChatReply, AppError> {
        let employee_id = employee_id.trim();
        if employee_id.is_empty() {
            return Err(AppError::BadRequest("employeeId is required".to_string()));
        }

        let session = self.existing(key).await?;
        let start = Self::mark(&session).await;
        let generation = session.lock().await.faculty.details_generation.issue();
        let result = self.campus.faculty_details(employee_id, token).await;

        let mut guard = session.lock().await;
        if guard.faculty.details_generation.is_current(generation) {
            match result {
                Ok(response) => {
                    guard.faculty.selected_faculty = Some(employee_id.to_string());
                    let content = format::format_faculty_details(response.details.as_ref());
                    let message = match response.details {
                        Some(details) => {
                            Message::assistant_with(content, Payload::FacultyDetails { faculty_details: details })
                        }
                        None => Message::assistant(content),
                    };
                    guard.transcript.push(message);
                }
                Err(e) => guard
                    .transcript
                    .push_assistant(format!("Failed to fetch faculty details: {}", e)),
            }
        } else {
            debug!("Dropping superseded faculty details for {}", employee_id);
        }
        drop(guard);

        Ok(self.reply(&session, start, None).await)
    }

    async fn answer_generic(&self, session: &SharedSession, prompt: &str, token: Option<&str>) {
        let result = self.campus.generate(prompt, token).await;
        let message = match result {
            Ok(answer) => Message::assistant_with(
                answer.content(),
                Payload::Generated {
                    faculties: answer.faculty_cards(),
                    club: answer.club.clone(),
                    requires_vtop_login: answer.requires_vtop_login,
                },
            ),
            Err(e) => {
                warn!("Generate request failed: {}", e);
                Message::assistant(e.to_string())
            }
        };
        session.lock().await.transcript.push(message);
    }

    /// Hostel and/or mess type picked in the options selector. No fetch happens.
    pub async fn mess_selection(
        &self,
        key: &str,
        hostel_type: Option<&str>,
        mess_type: Option<&str>,
    ) -> Result<ChatReply, AppError> {
        let session = self.existing(key).await?;
        let event = MessEvent::Select {
            hostel_type: hostel_type.map(str::to_string),
            mess_type: mess_type.map(str::to_string),
        };
        self.drive_mess(&session, event, None).await?;
        Ok(self.reply(&session, usize::MAX, None).await)
    }

    pub async fn mess_confirm(&self, key: &str, token: Option<&str>) -> Result<ChatReply, AppError> {
        let session = self.existing(key).await?;
        let start = Self::mark(&session).await;
        self.drive_mess(&session, MessEvent::Confirm, token).await?;
        Ok(self.reply(&session, start, None).await)
    }

    pub async fn mess_date(&self, key: &str, day_number: u32, token: Option<&str>) -> Result<ChatReply, AppError> {
        let session = self.existing(key).await?;
        let start = Self::mark(&session).await;
        self.drive_mess(&session, MessEvent::SelectDate(day_number), token).await?;
        Ok(self.reply(&session, start, None).await)
    }

    /// Feeds `event` into the mess machine and keeps going until no network effect is
    /// left. Transitions run under the session lock; fetches run outside it.
    async fn drive_mess(&self, session: &SharedSession, event: MessEvent, token: Option<&str>) -> Result<(), AppError> {
        let mut pending = VecDeque::from([event]);

        while let Some(event) = pending.pop_front() {
            let network = {
                let mut guard = session.lock().await;
                let (next, effects) = guard.mess.clone().step(event)?;
                guard.mess = next;

                let mut network = Vec::new();
                for effect in effects {
                    match effect {
                        MessEffect::AppendOptions { options } => {
                            let content = format::format_mess_options(&options);
                            guard
                                .transcript
                                .push(Message::assistant_with(content, Payload::MessOptions { mess_options: options }));
                        }
                        MessEffect::AppendMenu { menu } => {
                            let content = format::format_mess_menu(&menu);
                            guard.transcript.push_menu(content, menu);
                        }
                        MessEffect::AppendError { message } => guard.transcript.push_assistant(message),
                        other => network.push(other),
                    }
                }
                network
            };

            for effect in network {
                if let Some(event) = self.perform(effect, token).await {
                    pending.push_back(event);
                }
            }
        }

        Ok(())
    }

    async fn perform(&self, effect: MessEffect, token: Option<&str>) -> Option<MessEvent> {
        match effect {
            MessEffect::ResetRemote => {
                if let Err(e) = self.mess_api.reset_mess_session(token).await {
                    warn!("⚠ Failed to reset mess session (ignored): {}", e);
                }
                None
            }
            MessEffect::FetchOptions { generation } => Some(match self.mess_api.mess_options(token).await {
                Ok(options) => MessEvent::OptionsLoaded { generation, options },
                Err(e) => MessEvent::Failed {
                    generation,
                    message: format!("Failed to fetch mess options: {}", e),
                },
            }),
            MessEffect::FetchMenu { generation, request } => Some(match self.menus.fetch(&request, token).await {
                Ok(menu) => MessEvent::MenuLoaded { generation, menu },
                Err(e) => MessEvent::Failed {
                    generation,
                    message: format!("Failed to fetch mess menu: {}", e),
                },
            }),
            MessEffect::AppendOptions { .. } | MessEffect::AppendMenu { .. } | MessEffect::AppendError { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::session::MessPhase;
    use crate::models::chat::Role;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USER: &str = "user_1";

    fn controller(server: &MockServer) -> ChatController {
        let client = reqwest::Client::new();
        let campus = CampusClient::new(client.clone(), server.uri());
        let fallback: Arc<dyn MenuSource> = Arc::new(ApiMenuSource::new(campus.clone()));
        ChatController::new(
            IntentRouter::default(),
            campus.clone(),
            campus,
            MenuFetcher::new(None, fallback),
            "Fall Semester 2025-26",
        )
    }

    async fn open(controller: &ChatController) -> String {
        let reply = controller.start_session(USER).await.unwrap();
        session_key(USER, &reply.session_id.unwrap())
    }

    fn menu_body(day: u32) -> serde_json::Value {
        json!({
            "success": true,
            "hostelType": "MH",
            "messType": "Veg",
            "date": format!("2025-10-{:02}", day),
            "dayName": "Monday",
            "currentMonth": "October",
            "currentYear": 2025,
            "selectedDate": day,
            "menuItems": [{"meal": "Lunch", "items": ["Rice"], "time": "12:30 PM - 2:30 PM"}],
            "availableDates": [],
            "isRealTime": true
        })
    }

    async fn mount_mess_options(server: &MockServer) {
        Mock::given(method("DELETE"))
            .and(path("/api/mess"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/mess"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "hostelTypes": [{"name": "MH", "label": "Men's Hostel"}],
                "messTypes": [{"name": "Veg"}, {"name": "Non-Veg"}]
            })))
            .mount(server)
            .await;
    }

    async fn menu_ready(controller: &ChatController, key: &str) {
        controller.submit_prompt(key, "Show me today's mess menu", None).await.unwrap();
        controller.mess_selection(key, Some("MH"), Some("Veg")).await.unwrap();
        controller.mess_confirm(key, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_blank_prompt_appends_nothing() {
        let server = MockServer::start().await;
        let controller = controller(&server);
        let key = open(&controller).await;

        let reply = controller.submit_prompt(&key, "   ", None).await.unwrap();
        assert!(reply.messages.is_empty());
        assert!(reply.intent.is_none());
        assert!(controller.transcript(&key).await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let server = MockServer::start().await;
        let controller = controller(&server);
        let err = controller.submit_prompt("nobody:nothing", "hi", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_generic_prompt_uses_generate_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({"prompt": "What's csed club?"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "CSED is the entrepreneurship club.",
                "club": {"name": "CSED"}
            })))
            .mount(&server)
            .await;

        let controller = controller(&server);
        let key = open(&controller).await;
        let reply = controller.submit_prompt(&key, "  What's csed club?  ", None).await.unwrap();

        assert_eq!(reply.intent, Some(Intent::Generic));
        assert_eq!(reply.messages.len(), 2);
        assert_eq!(reply.messages[0].role, Role::User);
        assert_eq!(reply.messages[0].content, "What's csed club?");
        assert_eq!(reply.messages[1].content, "CSED is the entrepreneurship club.");
        assert!(matches!(
            reply.messages[1].payload,
            Some(Payload::Generated { requires_vtop_login: false, .. })
        ));
    }

    #[tokio::test]
    async fn test_generate_html_error_page_becomes_server_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(500).set_body_raw("<h1>500 Internal Server Error</h1>", "text/html"),
            )
            .mount(&server)
            .await;

        let controller = controller(&server);
        let key = open(&controller).await;
        let reply = controller.submit_prompt(&key, "Fees due and last payment date", None).await.unwrap();
        assert_eq!(reply.messages[1].content, "Server error. Please try again in a moment.");
    }

    #[tokio::test]
    async fn test_assignments_show_semester_picker_for_past_semester() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/vtop/assignments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "assignments": [{"classId": "VL1", "courseCode": "CSE2001", "courseTitle": "DSA"}],
                "semester": {"label": "Winter Semester 2024-25"},
                "semesters": [{"label": "Fall Semester 2025-26"}, {"label": "Winter Semester 2024-25"}]
            })))
            .mount(&server)
            .await;

        let controller = controller(&server);
        let key = open(&controller).await;
        let reply = controller.submit_prompt(&key, "Any assignments due this week?", None).await.unwrap();

        assert_eq!(reply.intent, Some(Intent::Assignments));
        let Some(Payload::Assignments { show_semester_dropdown, assignments, .. }) = &reply.messages[1].payload else {
            panic!("expected assignments payload");
        };
        assert!(*show_semester_dropdown);
        assert_eq!(assignments.len(), 1);
    }

    #[test]
    fn test_semester_picker_rule() {
        let fall = Semester { label: "Fall Semester 2025-26".into(), value: None };
        let winter = Semester { label: "Winter Semester 2024-25".into(), value: None };
        let current = "Fall Semester 2025-26";

        assert!(!show_semester_dropdown(&[fall.clone()], Some(&winter), current));
        assert!(!show_semester_dropdown(&[fall.clone(), winter.clone()], Some(&fall), current));
        assert!(show_semester_dropdown(&[fall.clone(), winter.clone()], Some(&winter), current));
        assert!(show_semester_dropdown(&[fall, winter], None, current));
    }

    #[tokio::test]
    async fn test_assignment_failure_becomes_prefixed_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/vtop/assignments"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "success": false,
                "error": "VTOP session expired"
            })))
            .mount(&server)
            .await;

        let controller = controller(&server);
        let key = open(&controller).await;
        let reply = controller.submit_prompt(&key, "assignments", None).await.unwrap();
        assert_eq!(reply.messages[1].content, "Failed to fetch assignments: VTOP session expired");
    }

    #[tokio::test]
    async fn test_faculty_prompt_searches_cleaned_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/vtop/faculty-search"))
            .and(body_partial_json(json!({"searchQuery": "devipriya a"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "results": [],
                "searchQuery": "devipriya a"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let controller = controller(&server);
        let key = open(&controller).await;
        let reply = controller.submit_prompt(&key, "who is devipriya a ma'am", None).await.unwrap();

        assert_eq!(reply.intent, Some(Intent::Faculty));
        assert_eq!(
            reply.messages[1].content,
            "No faculty found matching \"devipriya a\". Please try a different search term."
        );
        assert!(matches!(
            reply.messages[1].payload,
            Some(Payload::FacultyResults { show_faculty_dropdown: false, .. })
        ));
    }

    #[tokio::test]
    async fn test_mess_prompt_resets_remote_and_lists_options() {
        let server = MockServer::start().await;
        mount_mess_options(&server).await;

        let controller = controller(&server);
        let key = open(&controller).await;
        let reply = controller.submit_prompt(&key, "what to eat", None).await.unwrap();

        assert_eq!(reply.intent, Some(Intent::Mess));
        assert_eq!(reply.mess.phase, MessPhase::OptionsReady);
        assert!(reply.messages[1].content.contains("1. Men's Hostel"));

        let deletes = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.method.as_str() == "DELETE")
            .count();
        assert_eq!(deletes, 1);
    }

    #[tokio::test]
    async fn test_remote_reset_failure_is_not_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/mess"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/mess"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "hostelTypes": [{"name": "MH"}],
                "messTypes": [{"name": "Veg"}]
            })))
            .mount(&server)
            .await;

        let controller = controller(&server);
        let key = open(&controller).await;
        let reply = controller.submit_prompt(&key, "mess", None).await.unwrap();
        assert_eq!(reply.messages.len(), 2);
        assert_eq!(reply.mess.phase, MessPhase::OptionsReady);
    }

    #[tokio::test]
    async fn test_identical_menu_refetch_appends_once() {
        let server = MockServer::start().await;
        mount_mess_options(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/mess"))
            .respond_with(ResponseTemplate::new(200).set_body_json(menu_body(6)))
            .mount(&server)
            .await;

        let controller = controller(&server);
        let key = open(&controller).await;
        menu_ready(&controller, &key).await;

        let again = controller.mess_date(&key, 6, None).await.unwrap();
        assert!(again.messages.is_empty());
        assert_eq!(again.mess.phase, MessPhase::MenuReady);

        let menus = controller
            .transcript(&key)
            .await
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.mess_menu().is_some())
            .count();
        assert_eq!(menus, 1);
    }

    #[tokio::test]
    async fn test_non_json_menu_answer_becomes_error_message() {
        let server = MockServer::start().await;
        mount_mess_options(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/mess"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html>Bad Gateway</html>", "text/html"))
            .mount(&server)
            .await;

        let controller = controller(&server);
        let key = open(&controller).await;
        controller.submit_prompt(&key, "mess menu", None).await.unwrap();
        controller.mess_selection(&key, Some("MH"), Some("Veg")).await.unwrap();
        let reply = controller.mess_confirm(&key, None).await.unwrap();

        assert_eq!(reply.mess.phase, MessPhase::Error);
        assert_eq!(
            reply.messages[0].content,
            "Failed to fetch mess menu: Server returned non-JSON response: <html>Bad Gateway</html>..."
        );
    }

    #[tokio::test]
    async fn test_invalid_selection_is_rejected() {
        let server = MockServer::start().await;
        mount_mess_options(&server).await;

        let controller = controller(&server);
        let key = open(&controller).await;
        controller.submit_prompt(&key, "mess", None).await.unwrap();
        let err = controller.mess_selection(&key, Some("XH"), None).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_partly_invalid_selection_keeps_previous_choice() {
        let server = MockServer::start().await;
        mount_mess_options(&server).await;

        let controller = controller(&server);
        let key = open(&controller).await;
        controller.submit_prompt(&key, "mess", None).await.unwrap();
        controller.mess_selection(&key, None, Some("Veg")).await.unwrap();

        let err = controller
            .mess_selection(&key, Some("MH"), Some("Keto"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let view = controller.transcript(&key).await.unwrap();
        assert_eq!(view.mess.hostel_type, None);
        assert_eq!(view.mess.mess_type.as_deref(), Some("Veg"));
    }

    #[tokio::test]
    async fn test_slow_stale_menu_does_not_overwrite_newer_date() {
        let server = MockServer::start().await;
        mount_mess_options(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/mess"))
            .and(body_partial_json(json!({"selectedDate": null})))
            .respond_with(ResponseTemplate::new(200).set_body_json(menu_body(6)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/mess"))
            .and(body_partial_json(json!({"selectedDate": 8})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(menu_body(8))
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/mess"))
            .and(body_partial_json(json!({"selectedDate": 9})))
            .respond_with(ResponseTemplate::new(200).set_body_json(menu_body(9)))
            .mount(&server)
            .await;

        let controller = controller(&server);
        let key = open(&controller).await;
        menu_ready(&controller, &key).await;

        let (slow, fast) = tokio::join!(controller.mess_date(&key, 8, None), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.mess_date(&key, 9, None).await
        });
        slow.unwrap();
        let fast = fast.unwrap();
        assert_eq!(fast.mess.selected_date, Some(9));

        let view = controller.transcript(&key).await.unwrap();
        assert_eq!(view.mess.phase, MessPhase::MenuReady);
        assert_eq!(view.mess.selected_date, Some(9));
        let days: Vec<u32> = view
            .messages
            .iter()
            .filter_map(|m| m.mess_menu().map(|menu| menu.selected_date))
            .collect();
        assert_eq!(days, vec![6, 9]);
    }

    #[tokio::test]
    async fn test_ending_a_session_clears_and_removes_it() {
        let server = MockServer::start().await;
        mount_mess_options(&server).await;

        let controller = controller(&server);
        let key = open(&controller).await;
        controller.submit_prompt(&key, "mess", None).await.unwrap();
        assert_eq!(controller.sessions().len().await, 1);

        let reply = controller.end_session(&key).await.unwrap();
        assert!(reply.messages.is_empty());
        assert_eq!(reply.mess.phase, MessPhase::Idle);
        assert_eq!(controller.sessions().len().await, 0);

        let err = controller.transcript(&key).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
