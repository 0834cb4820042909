//! Input validation utilities
//!
//! Authoritative server-side rules. The client mirrors the same predicates for
//! inline feedback but is never trusted; every rule is re-checked here before
//! the identity provider is contacted. Failures report the first violated rule
//! only, not an aggregate.

use regex::Regex;
use std::sync::OnceLock;

/// Validate email shape
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email address".to_string());
    }

    Ok(())
}

/// Validate the login password
///
/// Shape only; whether the credential matches is the identity provider's call.
pub fn validate_login_password(password: &str) -> Result<(), String> {
    if password.len() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }

    Ok(())
}

/// Validate a first or last name; `field` labels the error message
pub fn validate_name(name: &str, field: &str) -> Result<(), String> {
    if name.trim().len() < 2 {
        return Err(format!("{field} must be at least 2 characters"));
    }

    Ok(())
}

/// Validate the registration password
pub fn validate_registration_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if !c.is_alphanumeric() {
            has_special = true;
        }
    }

    if !has_upper {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !has_lower {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !has_digit {
        return Err("Password must contain at least one number".to_string());
    }

    if !has_special {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}
