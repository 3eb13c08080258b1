// src/chat/format.rs
//! Assistant text for structured answers. The payload carries the data; this is the
//! readable version shown in the bubble.

use crate::models::mess::{MessMenu, MessOptions};
use crate::models::vtop::{AssignmentSummary, CourseDetails, FacultyDetails, FacultySummary};

const NOT_SPECIFIED: &str = "Not specified";

fn or_not_specified(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(NOT_SPECIFIED)
}

pub fn format_assignments(assignments: &[AssignmentSummary]) -> String {
    if assignments.is_empty() {
        return "No assignments found for this semester.".to_string();
    }

    let mut content = String::from("📝 **Digital Assignments**\n\n");
    content.push_str(&format!("Found {} courses with assignments:\n\n", assignments.len()));

    for (i, assignment) in assignments.iter().enumerate() {
        content.push_str(&format!(
            "{}. **{}** - {}\n",
            i + 1,
            assignment.course_code,
            assignment.course_title
        ));
        content.push_str(&format!(
            "   📚 Type: {}\n",
            or_not_specified(assignment.course_type.as_deref())
        ));
        content.push_str(&format!(
            "   👨‍🏫 Faculty: {}\n\n",
            or_not_specified(assignment.faculty_name.as_deref())
        ));
    }

    content
}

pub fn format_course_details(details: &CourseDetails) -> String {
    let (Some(info), Some(assignments)) = (&details.course_info, &details.assignments) else {
        return "No course details found.".to_string();
    };

    let mut content = format!("📚 **Course Details - {}**\n", info.course_code);
    content.push_str(&format!("**{}**\n", info.course_title));
    content.push_str(&format!("📋 Type: {}\n", or_not_specified(info.course_type.as_deref())));
    content.push_str(&format!("🏫 Class: {}\n\n", or_not_specified(info.class_number.as_deref())));

    if assignments.is_empty() {
        content.push_str("No assignments found for this course.");
        return content;
    }

    content.push_str(&format!("**Assignments ({}):**\n\n", assignments.len()));
    for (i, assignment) in assignments.iter().enumerate() {
        content.push_str(&format!("{}. **{}**\n", i + 1, assignment.title));
        content.push_str(&format!("   📅 Due: {}\n", or_not_specified(assignment.due_date.as_deref())));
        content.push_str(&format!("   📊 Max Marks: {}\n", or_not_specified(assignment.max_mark.as_deref())));
        content.push_str(&format!("   ⚖️ Weightage: {}\n", or_not_specified(assignment.weightage.as_deref())));
        content.push_str(&format!(
            "   📝 Last Updated: {}\n\n",
            or_not_specified(assignment.last_updated.as_deref())
        ));
    }

    content
}

pub fn format_faculty_results(results: &[FacultySummary], search_query: &str) -> String {
    if results.is_empty() {
        return format!(
            "No faculty found matching \"{}\". Please try a different search term.",
            search_query
        );
    }

    let mut content = String::from("👨‍🏫 **Faculty Search Results**\n\n");
    content.push_str(&format!("Search query: \"{}\"\n", search_query));
    content.push_str(&format!("Found {} faculty member(s):\n\n", results.len()));

    for (i, faculty) in results.iter().enumerate() {
        content.push_str(&format!("{}. **{}**\n", i + 1, faculty.name));
        content.push_str(&format!("   📋 Designation: {}\n", or_not_specified(faculty.designation.as_deref())));
        content.push_str(&format!("   🏫 School: {}\n", or_not_specified(faculty.school.as_deref())));
        content.push_str(&format!("   🆔 Employee ID: {}\n\n", faculty.employee_id));
    }

    content
}

pub fn format_faculty_details(details: Option<&FacultyDetails>) -> String {
    let Some(faculty) = details else {
        return "No faculty details found.".to_string();
    };

    let mut content = String::from("👨‍🏫 **Faculty Details**\n\n");
    if let Some(photo) = faculty.photo_url.as_deref().filter(|p| !p.is_empty()) {
        content.push_str(&format!("![Faculty Photo]({})\n\n", photo));
    }

    content.push_str(&format!(
        "**{}**\n",
        faculty.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Name not available")
    ));
    content.push_str(&format!("📋 Designation: {}\n", or_not_specified(faculty.designation.as_deref())));
    content.push_str(&format!("🏫 Department: {}\n", or_not_specified(faculty.department.as_deref())));
    content.push_str(&format!("🏛️ School: {}\n", or_not_specified(faculty.school.as_deref())));
    content.push_str(&format!("📧 Email: {}\n", or_not_specified(faculty.email.as_deref())));
    content.push_str(&format!("🚪 Cabin: {}\n\n", or_not_specified(faculty.cabin.as_deref())));

    if faculty.open_hours.is_empty() {
        content.push_str("**Office Hours:** Not specified\n");
    } else {
        content.push_str("**Office Hours:**\n");
        for hours in &faculty.open_hours {
            content.push_str(&format!("• {}: {}\n", hours.day, hours.timing));
        }
    }

    content
}

pub fn format_mess_options(options: &MessOptions) -> String {
    let mut content = String::from("🍽️ **Mess Menu Options**\n\n");

    content.push_str("**Available Hostel Types:**\n");
    for (i, hostel) in options.hostel_types.iter().enumerate() {
        content.push_str(&format!("{}. {}\n", i + 1, hostel.display()));
    }

    content.push_str("\n**Available Mess Types:**\n");
    for (i, mess) in options.mess_types.iter().enumerate() {
        content.push_str(&format!("{}. {}\n", i + 1, mess.display()));
    }

    content.push_str("\nPlease select your hostel type and mess type to view the menu.");
    content
}

pub fn format_mess_menu(menu: &MessMenu) -> String {
    let mut content = String::from("🍽️ **Mess Menu**\n\n");
    content.push_str(&format!("📅 **{}, {}**\n\n", menu.day_name, menu.date));
    content.push_str(&format!("🏠 **Hostel:** {}\n", or_not_specified(Some(menu.hostel_type.as_str()))));
    content.push_str(&format!("🍴 **Mess Type:** {}\n", or_not_specified(Some(menu.mess_type.as_str()))));
    content.push_str(&format!("📆 **Date:** Day {}\n\n", menu.selected_date));

    if menu.menu_items.is_empty() {
        content.push_str("📝 **Menu information is currently unavailable.**\n");
        content.push_str("Please try again later or select a different mess type.");
        return content;
    }

    for meal in &menu.menu_items {
        content.push_str(&format!("**{}:**\n", meal.meal));
        for item in &meal.items {
            content.push_str(&format!("• {}\n", item));
        }
        content.push('\n');
    }

    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mess::{MenuItem, MenuOrigin, MessOption};
    use crate::models::vtop::{CourseAssignment, CourseInfo, OpenHour};

    #[test]
    fn test_assignment_list() {
        let text = format_assignments(&[AssignmentSummary {
            class_id: Some("VL2025".into()),
            course_code: "CSE2001".into(),
            course_title: "Data Structures".into(),
            course_type: None,
            faculty_name: Some("Siva K".into()),
        }]);
        assert!(text.contains("Found 1 courses with assignments"));
        assert!(text.contains("1. **CSE2001** - Data Structures"));
        assert!(text.contains("Type: Not specified"));
        assert!(text.contains("Faculty: Siva K"));
        assert_eq!(format_assignments(&[]), "No assignments found for this semester.");
    }

    #[test]
    fn test_course_details_without_info() {
        let details = CourseDetails { course_info: None, assignments: Some(vec![]) };
        assert_eq!(format_course_details(&details), "No course details found.");
    }

    #[test]
    fn test_course_details_lists_assignments() {
        let details = CourseDetails {
            course_info: Some(CourseInfo {
                course_code: "CSE2001".into(),
                course_title: "Data Structures".into(),
                course_type: Some("ETH".into()),
                class_number: Some("VL2025".into()),
            }),
            assignments: Some(vec![CourseAssignment {
                title: "DA1".into(),
                due_date: Some("20-Oct-2025".into()),
                max_mark: Some("10".into()),
                weightage: Some("10".into()),
                last_updated: None,
            }]),
        };
        let text = format_course_details(&details);
        assert!(text.starts_with("📚 **Course Details - CSE2001**"));
        assert!(text.contains("**Assignments (1):**"));
        assert!(text.contains("📅 Due: 20-Oct-2025"));
        assert!(text.contains("📝 Last Updated: Not specified"));
    }

    #[test]
    fn test_empty_faculty_search() {
        assert_eq!(
            format_faculty_results(&[], "zz top"),
            "No faculty found matching \"zz top\". Please try a different search term."
        );
    }

    #[test]
    fn test_faculty_details_with_hours_and_photo() {
        let details = FacultyDetails {
            name: Some("Devipriya A".into()),
            designation: Some("Assistant Professor".into()),
            department: None,
            school: Some("SCOPE".into()),
            email: None,
            cabin: Some("SJT 313".into()),
            photo_url: Some("https://vtop.example/photo.jpg".into()),
            open_hours: vec![OpenHour { day: "Monday".into(), timing: "2-4 PM".into() }],
        };
        let text = format_faculty_details(Some(&details));
        assert!(text.contains("![Faculty Photo](https://vtop.example/photo.jpg)"));
        assert!(text.contains("🏫 Department: Not specified"));
        assert!(text.contains("• Monday: 2-4 PM"));
        assert_eq!(format_faculty_details(None), "No faculty details found.");
    }

    #[test]
    fn test_mess_options_and_menu() {
        let options = MessOptions {
            hostel_types: vec![MessOption::new("MH", "Men's Hostel")],
            mess_types: vec![MessOption { name: "Veg".into(), label: None }],
        };
        let text = format_mess_options(&options);
        assert!(text.contains("1. Men's Hostel"));
        assert!(text.contains("1. Veg"));

        let mut menu = MessMenu {
            hostel_type: "MH".into(),
            mess_type: "Veg".into(),
            date: "2025-10-06".into(),
            day_name: "Monday".into(),
            current_month: "October".into(),
            current_year: 2025,
            selected_date: 6,
            menu_items: vec![MenuItem {
                meal: "Lunch".into(),
                items: vec!["Rice".into(), "Dal".into()],
                time: "12:30 PM - 2:30 PM".into(),
            }],
            available_dates: vec![],
            is_real_time: true,
            source: MenuOrigin::ServerSideScraping,
        };
        let text = format_mess_menu(&menu);
        assert!(text.contains("📅 **Monday, 2025-10-06**"));
        assert!(text.contains("**Lunch:**\n• Rice\n• Dal\n"));

        menu.menu_items.clear();
        assert!(format_mess_menu(&menu).contains("Menu information is currently unavailable"));
    }
}
