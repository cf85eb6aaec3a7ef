//! Input checks shared by the request-facing services.
//!
//! Lengths are counted in characters, not bytes.

use crate::errors::SocialError;

/// Require `value` to be between `min` and `max` characters.
pub fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), SocialError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(SocialError::BadRequest(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

/// Require `value` to be at most `max` characters.
pub fn check_max_length(field: &str, value: &str, max: usize) -> Result<(), SocialError> {
    if value.chars().count() > max {
        return Err(SocialError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub fn check_email(email: &str) -> Result<(), SocialError> {
    if email.chars().count() > 255 || !is_valid_email(email) {
        return Err(SocialError::BadRequest("email must be a valid address".to_string()));
    }
    Ok(())
}

/// Basic shape check: `local@domain.tld`, no whitespace, no empty labels.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}
