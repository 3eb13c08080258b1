// src/models/mess.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessOption {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MessOption {
    pub fn new(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: Some(label.to_string()),
        }
    }

    pub fn display(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessOptions {
    pub hostel_types: Vec<MessOption>,
    pub mess_types: Vec<MessOption>,
}

impl MessOptions {
    pub fn has_hostel(&self, name: &str) -> bool {
        self.hostel_types.iter().any(|h| h.name == name)
    }

    pub fn has_mess(&self, name: &str) -> bool {
        self.mess_types.iter().any(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub meal: String,
    pub items: Vec<String>,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableDate {
    pub day_number: u32,
    pub is_today: bool,
    pub date: String,
}

/// Where a menu came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuOrigin {
    ClientSideScraping,
    ServerSideScraping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessMenu {
    pub hostel_type: String,
    pub mess_type: String,
    pub date: String,
    pub day_name: String,
    #[serde(default)]
    pub current_month: String,
    #[serde(default)]
    pub current_year: i32,
    pub selected_date: u32,
    pub menu_items: Vec<MenuItem>,
    pub available_dates: Vec<AvailableDate>,
    pub is_real_time: bool,
    #[serde(default = "default_origin")]
    pub source: MenuOrigin,
}

fn default_origin() -> MenuOrigin {
    MenuOrigin::ServerSideScraping
}

impl MessMenu {
    /// Same hostel, mess type and day: a refetch of this menu adds nothing new.
    pub fn same_selection(&self, other: &MessMenu) -> bool {
        self.hostel_type == other.hostel_type
            && self.mess_type == other.mess_type
            && self.selected_date == other.selected_date
    }
}

/// Parameters of one menu fetch. `selected_date` is a day of the current month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuRequest {
    pub hostel_type: String,
    pub mess_type: String,
    #[serde(default, deserialize_with = "super::optional_u32_lenient")]
    pub selected_date: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientScrapeRequest {
    #[serde(default)]
    pub hostel_type: Option<String>,
    #[serde(default)]
    pub mess_type: Option<String>,
    #[serde(default, deserialize_with = "super::optional_u32_lenient")]
    pub day_number: Option<u32>,
}
