//! Form rules checked before a request is sent, and date formatting for
//! entity timestamps.
//!
//! Each rule returns `Err(Error::Validation)` naming the field it checked, so
//! a form can run several rules and report all failures at once.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Address shape accepted by the sign-up and login forms, matched case-insensitively.
pub const EMAIL_PATTERN: &str = r"^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$";

/// The value must not be blank.
///
/// # Errors
///
/// `Error::Validation` with `message` when `value` is empty or whitespace.
pub fn required(field: &str, value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_field(field, message));
    }
    Ok(())
}

/// The value must look like `local@domain.tld`.
///
/// # Errors
///
/// `Error::Validation` when the address is missing or malformed.
pub fn email(field: &str, value: &str) -> Result<()> {
    required(field, value, "Email is required")?;
    if !is_email(value) {
        return Err(Error::invalid_field(field, "Invalid email address"));
    }
    Ok(())
}

/// The password must be present and at least [`MIN_PASSWORD_LEN`] characters.
///
/// # Errors
///
/// `Error::Validation` when the password is missing or too short.
pub fn password(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_field(field, "Password is required"));
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::invalid_field(
            field,
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

/// The confirmation must be present and equal the password.
///
/// # Errors
///
/// `Error::Validation` when the confirmation is missing or differs.
pub fn password_confirmation(field: &str, password: &str, confirmation: &str) -> Result<()> {
    if confirmation.is_empty() {
        return Err(Error::invalid_field(
            field,
            "Password confirmation is required",
        ));
    }
    if confirmation != password {
        return Err(Error::invalid_field(field, "The passwords do not match"));
    }
    Ok(())
}

fn is_email(value: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            RegexBuilder::new(EMAIL_PATTERN)
                .case_insensitive(true)
                .build()
                .ok()
        })
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Render an API timestamp as `05 March 2024`.
///
/// Accepts RFC 3339 timestamps, naive ISO date-times as emitted by the API,
/// and plain dates.
///
/// # Errors
///
/// `Error::Deserialization` when the input is none of those.
pub fn format_date(value: &str) -> Result<String> {
    const LONG: &str = "%d %B %Y";

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.format(LONG).to_string());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.format(LONG).to_string());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(d.format(LONG).to_string());
    }
    Err(Error::Deserialization(format!("invalid date: {}", value)))
}
