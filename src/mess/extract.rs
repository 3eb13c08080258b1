// src/mess/extract.rs
//! Turns the Messit details page into a normalized menu.
//!
//! Pure HTML parsing: no fetching, no caching. Selectors are tried as groups, meal
//! sections that lack a title or an items node are skipped, and sections whose title
//! names no known meal are ignored without error.

use chrono::{Datelike, NaiveDate};
use scraper::{ElementRef, Html, Selector};

use crate::error::AppError;
use crate::models::mess::{AvailableDate, MenuItem, MenuOrigin, MenuRequest, MessMenu};

pub const MEAL_SECTION_SELECTOR: &str = r#"section.grid > div, .meal-section, [class*="meal"]"#;
pub const MEAL_TITLE_SELECTOR: &str = r#"h2, h3, .meal-title, [class*="title"]"#;
pub const MEAL_ITEMS_SELECTOR: &str = r#"p, .meal-items, [class*="items"]"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MealKind {
    Breakfast,
    Lunch,
    Snacks,
    Dinner,
}

impl MealKind {
    pub const ALL: [MealKind; 4] = [
        MealKind::Breakfast,
        MealKind::Lunch,
        MealKind::Snacks,
        MealKind::Dinner,
    ];

    /// First meal word found in the (lower-cased) title wins, in serving order.
    pub fn classify(title: &str) -> Option<MealKind> {
        let title = title.to_lowercase();
        if title.contains("breakfast") {
            Some(MealKind::Breakfast)
        } else if title.contains("lunch") {
            Some(MealKind::Lunch)
        } else if title.contains("snack") {
            Some(MealKind::Snacks)
        } else if title.contains("dinner") {
            Some(MealKind::Dinner)
        } else {
            None
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MealKind::Breakfast => "Breakfast",
            MealKind::Lunch => "Lunch",
            MealKind::Snacks => "Snacks",
            MealKind::Dinner => "Dinner",
        }
    }

    /// Serving window shown next to the meal. Not read from the page.
    pub fn time_window(&self) -> &'static str {
        match self {
            MealKind::Breakfast => "7:00 AM - 9:00 AM",
            MealKind::Lunch => "12:30 PM - 2:30 PM",
            MealKind::Snacks => "4:30 PM - 6:15 PM",
            MealKind::Dinner => "7:00 PM - 9:00 PM",
        }
    }

    fn index(&self) -> usize {
        match self {
            MealKind::Breakfast => 0,
            MealKind::Lunch => 1,
            MealKind::Snacks => 2,
            MealKind::Dinner => 3,
        }
    }
}

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::Extraction(format!("invalid selector '{}': {}", css, e)))
}

/// First descendant of `scope` (never `scope` itself) matching `selector`.
fn first_descendant<'a>(scope: &ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).find(|el| el.id() != scope.id())
}

fn split_items(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extracts the meals present on the page, in serving order. Meals without items are
/// left out entirely. A later section for the same meal replaces an earlier one.
pub fn extract_meals(html: &str) -> Result<Vec<MenuItem>, AppError> {
    let sections = selector(MEAL_SECTION_SELECTOR)?;
    let titles = selector(MEAL_TITLE_SELECTOR)?;
    let items = selector(MEAL_ITEMS_SELECTOR)?;

    let document = Html::parse_document(html);
    let mut meals: [Vec<String>; 4] = Default::default();
    let mut candidates = 0usize;

    for section in document.select(&sections) {
        candidates += 1;
        let (Some(title_el), Some(items_el)) = (
            first_descendant(&section, &titles),
            first_descendant(&section, &items),
        ) else {
            continue;
        };

        let title = title_el.text().collect::<String>();
        let Some(kind) = MealKind::classify(title.trim()) else {
            tracing::trace!("Ignoring section titled '{}'", title.trim());
            continue;
        };

        meals[kind.index()] = split_items(&items_el.text().collect::<String>());
    }

    tracing::debug!("Found {} candidate meal sections", candidates);

    Ok(MealKind::ALL
        .iter()
        .filter(|kind| !meals[kind.index()].is_empty())
        .map(|kind| MenuItem {
            meal: kind.display_name().to_string(),
            items: meals[kind.index()].clone(),
            time: kind.time_window().to_string(),
        })
        .collect())
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month_start = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };

    next_month_start
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

/// Every day of `today`'s month, with exactly one entry flagged as today.
pub fn generate_available_dates(today: NaiveDate) -> Vec<AvailableDate> {
    let (year, month) = (today.year(), today.month());

    (1..=days_in_month(year, month))
        .map(|day| AvailableDate {
            day_number: day,
            is_today: day == today.day(),
            date: format!("{:04}-{:02}-{:02}", year, month, day),
        })
        .collect()
}

/// Resolves an optional day of the current month; `None` means today.
pub fn resolve_day(today: NaiveDate, day: Option<u32>) -> Result<NaiveDate, AppError> {
    match day {
        None => Ok(today),
        Some(day) => today.with_day(day).ok_or_else(|| {
            AppError::BadRequest(format!(
                "selectedDate must be between 1 and {}",
                days_in_month(today.year(), today.month())
            ))
        }),
    }
}

/// Full menu for `request` from an already fetched page. Hostel and mess type are
/// echoed from the request; the page itself does not vary by them.
pub fn build_menu(
    html: &str,
    request: &MenuRequest,
    today: NaiveDate,
    source: MenuOrigin,
) -> Result<MessMenu, AppError> {
    let date = resolve_day(today, request.selected_date)?;
    let menu_items = extract_meals(html)?;

    Ok(MessMenu {
        hostel_type: request.hostel_type.clone(),
        mess_type: request.mess_type.clone(),
        date: date.format("%Y-%m-%d").to_string(),
        day_name: date.format("%A").to_string(),
        current_month: date.format("%B").to_string(),
        current_year: date.year(),
        selected_date: date.day(),
        menu_items,
        available_dates: generate_available_dates(today),
        is_real_time: true,
        source,
    })
}
