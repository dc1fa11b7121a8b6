//! Field-level input checks shared by user and class payloads.

use crate::error::AppError;

pub fn validate_name(name: &str) -> Result<(), AppError> {
    let len = name.trim().chars().count();
    if len < 2 {
        return Err(AppError::BadRequest(
            "Name must have at least 2 characters".to_string(),
        ));
    }
    if len > 100 {
        return Err(AppError::BadRequest(
            "Name cannot exceed 100 characters".to_string(),
        ));
    }
    Ok(())
}

/// Shape check only: one `@`, a non-empty local part, and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::BadRequest(format!("Invalid email address: {email}"));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || email.len() > 100
    {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && tld.len() >= 2 => Ok(()),
        _ => Err(invalid()),
    }
}

/// Ten digits, optionally preceded by the `57` / `+57` country code.
pub fn validate_phone(phone: &str) -> Result<(), AppError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let has_plus = digits.len() != phone.len();
    let all_digits = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());

    let valid = all_digits
        && match digits.len() {
            10 => !has_plus,
            12 => digits.starts_with("57"),
            _ => false,
        };

    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid phone number: {phone}")))
    }
}

/// National identity number (cédula): 6 to 12 digits.
pub fn validate_national_id(national_id: &str) -> Result<(), AppError> {
    let len = national_id.len();
    if !(6..=12).contains(&len) || !national_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(
            "National id must contain between 6 and 12 digits".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_id(field: &str, id: i64) -> Result<(), AppError> {
    if id < 1 {
        return Err(AppError::BadRequest(format!("{field} must be at least 1")));
    }
    Ok(())
}
