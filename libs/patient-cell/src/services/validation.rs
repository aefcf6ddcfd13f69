use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use crate::models::{PatientError, PatientProfile};

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9. ()-]{7,25}$").expect("phone pattern is a valid regex")
});

/// Check a registration profile before it touches any stored state.
pub fn validate_profile(profile: &PatientProfile) -> Result<(), PatientError> {
    let required = [
        ("firstName", &profile.first_name),
        ("lastName", &profile.last_name),
        ("phoneNumber", &profile.phone_number),
        ("address", &profile.address),
    ];

    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(PatientError::ValidationError(format!("{} is required", field)));
    }

    if !PHONE_PATTERN.is_match(profile.phone_number.trim()) {
        return Err(PatientError::ValidationError("Invalid phone number format".to_string()));
    }

    if let Some(email) = profile.email.as_deref() {
        if !email.trim().is_empty() && !email.contains('@') {
            return Err(PatientError::ValidationError("Invalid email address".to_string()));
        }
    }

    if let Some(date_of_birth) = profile.date_of_birth {
        if date_of_birth > Utc::now().date_naive() {
            return Err(PatientError::ValidationError("Date of birth cannot be in the future".to_string()));
        }
    }

    Ok(())
}
