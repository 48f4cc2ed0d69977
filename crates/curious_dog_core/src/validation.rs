//! crates/curious_dog_core/src/validation.rs
//!
//! Input rules shared by the HTTP boundary and the core service. The service
//! re-applies them so that it never persists malformed data, whoever the caller is.

use regex::Regex;
use std::sync::LazyLock;

pub const MAX_QUESTION_LEN: usize = 600;
pub const MAX_ANSWER_LEN: usize = 600;
pub const MAX_PICTURE_URL_LEN: usize = 2048;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("username pattern is valid"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Malformed input. The message is safe to show to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

fn bounded_text(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError(format!("{} must not be empty", field)));
    }
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError(format!(
            "{} must be at most {} characters (got {})",
            field, max, len
        )));
    }
    Ok(())
}

pub fn question_body(body: &str) -> Result<(), ValidationError> {
    bounded_text("body", body, MAX_QUESTION_LEN)
}

pub fn answer_text(answer: &str) -> Result<(), ValidationError> {
    bounded_text("answer", answer, MAX_ANSWER_LEN)
}

pub fn username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError(
            "username must be 3-30 characters of letters, digits or '_'".to_string(),
        ))
    }
}

pub fn email(email: &str) -> Result<(), ValidationError> {
    if email.len() <= 254 && EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError("email is not a valid address".to_string()))
    }
}

pub fn password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if (8..=128).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError(
            "password must be between 8 and 128 characters".to_string(),
        ))
    }
}

pub fn picture_url(url: &str) -> Result<(), ValidationError> {
    let scheme_ok = url.starts_with("https://") || url.starts_with("http://");
    if scheme_ok && url.len() <= MAX_PICTURE_URL_LEN && !url.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(ValidationError(
            "profilePicture must be an http(s) URL".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_body_bounds() {
        assert!(question_body("What's your favorite color?").is_ok());
        assert!(question_body("").is_err());
        assert!(question_body("   \n").is_err());
        assert!(question_body(&"a".repeat(600)).is_ok());
        assert!(question_body(&"a".repeat(601)).is_err());
        // 600 multi-byte characters are still 600 characters
        assert!(question_body(&"é".repeat(600)).is_ok());
    }

    #[test]
    fn registration_fields() {
        assert!(username("curious_dog").is_ok());
        assert!(username("ab").is_err());
        assert!(username("has space").is_err());
        assert!(email("dog@example.com").is_ok());
        assert!(email("not-an-email").is_err());
        assert!(password("longenough").is_ok());
        assert!(password("short").is_err());
    }

    #[test]
    fn picture_url_requires_http_scheme() {
        assert!(picture_url("https://cdn.example.com/p.png").is_ok());
        assert!(picture_url("ftp://cdn.example.com/p.png").is_err());
        assert!(picture_url("https://cdn.example.com/a b.png").is_err());
    }
}
