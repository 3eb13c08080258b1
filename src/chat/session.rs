// src/chat/session.rs
//! Per-session conversation state. Each concern owns its own struct; the mess flow is a
//! pure `(state, event) -> (state, effects)` machine so the controller can do the I/O.

use serde::Serialize;

use crate::chat::transcript::Transcript;
use crate::error::AppError;
use crate::models::mess::{MenuRequest, MessMenu, MessOptions};
use crate::models::vtop::{FacultySummary, Semester};

/// Monotonic request counter. A response is applied only if it carries the latest issued
/// value; anything older was superseded while in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestGeneration(u64);

impl RequestGeneration {
    pub fn issue(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    pub fn current(&self) -> u64 {
        self.0
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.0 == generation
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MessPhase {
    #[default]
    Idle,
    OptionsLoading,
    OptionsReady,
    MenuLoading,
    MenuReady,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessEvent {
    Start,
    OptionsLoaded { generation: u64, options: MessOptions },
    /// Hostel and/or mess type picked in the selectors. Applied only if every given value
    /// is valid.
    Select { hostel_type: Option<String>, mess_type: Option<String> },
    Confirm,
    SelectDate(u32),
    MenuLoaded { generation: u64, menu: MessMenu },
    Failed { generation: u64, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessEffect {
    /// Best-effort cleanup of the remote mess session.
    ResetRemote,
    FetchOptions { generation: u64 },
    FetchMenu { generation: u64, request: MenuRequest },
    AppendOptions { options: MessOptions },
    AppendMenu { menu: MessMenu },
    AppendError { message: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessSession {
    pub phase: MessPhase,
    pub options: Option<MessOptions>,
    pub hostel_type: Option<String>,
    pub mess_type: Option<String>,
    pub selected_date: Option<u32>,
    pub menu: Option<MessMenu>,
    pub generation: RequestGeneration,
    pub last_error: Option<String>,
}

impl MessSession {
    pub fn step(self, event: MessEvent) -> Result<(Self, Vec<MessEffect>), AppError> {
        match event {
            MessEvent::Start => {
                // Selections are wiped but the counter keeps counting so that anything
                // still in flight from before the reset is recognised as stale.
                let mut next = MessSession {
                    generation: self.generation,
                    ..MessSession::default()
                };
                let generation = next.generation.issue();
                next.phase = MessPhase::OptionsLoading;
                Ok((next, vec![MessEffect::ResetRemote, MessEffect::FetchOptions { generation }]))
            }

            MessEvent::OptionsLoaded { generation, options } => {
                if !self.accepts(generation, &[MessPhase::OptionsLoading]) {
                    return Ok((self, Vec::new()));
                }
                let next = MessSession {
                    phase: MessPhase::OptionsReady,
                    options: Some(options.clone()),
                    ..self
                };
                Ok((next, vec![MessEffect::AppendOptions { options }]))
            }

            MessEvent::Select { hostel_type, mess_type } => {
                let options = self.loaded_options()?;
                if let Some(name) = hostel_type.as_deref().filter(|n| !options.has_hostel(n)) {
                    return Err(AppError::BadRequest(format!("Unknown hostel type: {}", name)));
                }
                if let Some(name) = mess_type.as_deref().filter(|n| !options.has_mess(n)) {
                    return Err(AppError::BadRequest(format!("Unknown mess type: {}", name)));
                }
                let next = MessSession {
                    hostel_type: hostel_type.or(self.hostel_type.clone()),
                    mess_type: mess_type.or(self.mess_type.clone()),
                    ..self
                };
                Ok((next, Vec::new()))
            }

            MessEvent::Confirm => {
                self.loaded_options()?;
                if !matches!(
                    self.phase,
                    MessPhase::OptionsReady | MessPhase::MenuReady | MessPhase::Error
                ) {
                    return Err(AppError::Conflict(format!(
                        "Cannot confirm a selection while {:?}",
                        self.phase
                    )));
                }
                let day = self.selected_date;
                self.begin_menu_fetch(day)
            }

            MessEvent::SelectDate(day) => {
                if !matches!(self.phase, MessPhase::MenuReady | MessPhase::MenuLoading) {
                    return Err(AppError::Conflict(
                        "Pick a date once a menu has been shown".to_string(),
                    ));
                }
                self.begin_menu_fetch(Some(day))
            }

            MessEvent::MenuLoaded { generation, menu } => {
                if !self.accepts(generation, &[MessPhase::MenuLoading]) {
                    return Ok((self, Vec::new()));
                }
                let next = MessSession {
                    phase: MessPhase::MenuReady,
                    selected_date: Some(menu.selected_date),
                    menu: Some(menu.clone()),
                    last_error: None,
                    ..self
                };
                Ok((next, vec![MessEffect::AppendMenu { menu }]))
            }

            MessEvent::Failed { generation, message } => {
                if !self.accepts(
                    generation,
                    &[MessPhase::OptionsLoading, MessPhase::MenuLoading],
                ) {
                    return Ok((self, Vec::new()));
                }
                let next = MessSession {
                    phase: MessPhase::Error,
                    last_error: Some(message.clone()),
                    ..self
                };
                Ok((next, vec![MessEffect::AppendError { message }]))
            }
        }
    }

    fn accepts(&self, generation: u64, phases: &[MessPhase]) -> bool {
        let fresh = self.generation.is_current(generation) && phases.contains(&self.phase);
        if !fresh {
            tracing::debug!(
                "Discarding stale mess response (generation {}, current {}, phase {:?})",
                generation,
                self.generation.current(),
                self.phase
            );
        }
        fresh
    }

    fn loaded_options(&self) -> Result<&MessOptions, AppError> {
        self.options
            .as_ref()
            .ok_or_else(|| AppError::Conflict("Mess options have not been loaded yet".to_string()))
    }

    fn begin_menu_fetch(mut self, day: Option<u32>) -> Result<(Self, Vec<MessEffect>), AppError> {
        let (Some(hostel_type), Some(mess_type)) = (self.hostel_type.clone(), self.mess_type.clone()) else {
            return Err(AppError::BadRequest(
                "Please select both hostel type and mess type".to_string(),
            ));
        };

        let generation = self.generation.issue();
        self.phase = MessPhase::MenuLoading;
        self.selected_date = day;
        let request = MenuRequest {
            hostel_type,
            mess_type,
            selected_date: day,
        };
        Ok((self, vec![MessEffect::FetchMenu { generation, request }]))
    }

    pub fn snapshot(&self) -> MessSnapshot {
        MessSnapshot {
            phase: self.phase,
            hostel_type: self.hostel_type.clone(),
            mess_type: self.mess_type.clone(),
            selected_date: self.selected_date,
            options: self.options.clone(),
            last_error: self.last_error.clone(),
            generation: self.generation.current(),
        }
    }
}

/// What the client needs to draw the mess selectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessSnapshot {
    pub phase: MessPhase,
    pub hostel_type: Option<String>,
    pub mess_type: Option<String>,
    pub selected_date: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<MessOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentSession {
    pub semesters: Vec<Semester>,
    pub selected_semester: Option<String>,
    pub selected_course: Option<String>,
    pub show_semester_dropdown: bool,
    pub generation: RequestGeneration,
    pub course_generation: RequestGeneration,
}

#[derive(Debug, Clone, Default)]
pub struct FacultySession {
    pub last_query: Option<String>,
    pub results: Vec<FacultySummary>,
    pub selected_faculty: Option<String>,
    pub generation: RequestGeneration,
    pub details_generation: RequestGeneration,
}

#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    pub transcript: Transcript,
    pub mess: MessSession,
    pub assignments: AssignmentSession,
    pub faculty: FacultySession,
}

impl ChatSession {
    /// Drops the transcript and every selection. Generation counters survive so late
    /// responses from before the reset are still discarded.
    pub fn reset(&mut self) {
        let mess_generation = self.mess.generation;
        let assignment_generations = (self.assignments.generation, self.assignments.course_generation);
        let faculty_generations = (self.faculty.generation, self.faculty.details_generation);

        *self = ChatSession::default();

        self.mess.generation = mess_generation;
        (self.assignments.generation, self.assignments.course_generation) = assignment_generations;
        (self.faculty.generation, self.faculty.details_generation) = faculty_generations;
        // Bump so that in-flight work issued before the reset no longer matches.
        self.mess.generation.issue();
        self.assignments.generation.issue();
        self.assignments.course_generation.issue();
        self.faculty.generation.issue();
        self.faculty.details_generation.issue();
    }
}
