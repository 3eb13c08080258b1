// src/mess/options.rs
use crate::models::mess::{MessOption, MessOptions};

/// Hostel and mess types offered to the user before a menu is fetched.
pub fn default_mess_options() -> MessOptions {
    MessOptions {
        hostel_types: vec![
            MessOption::new("MH", "Men's Hostel"),
            MessOption::new("LH", "Ladies' Hostel"),
        ],
        mess_types: vec![
            MessOption::new("Veg", "Veg"),
            MessOption::new("Non-Veg", "Non-Veg"),
            MessOption::new("Special", "Special"),
        ],
    }
}
