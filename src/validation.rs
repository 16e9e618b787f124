use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, FieldError};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").unwrap()
});

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}-\d{1,2}:\d{2}$").unwrap());

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const FINGERPRINT_RANGE: std::ops::RangeInclusive<i64> = 1000..=9999;

/// Collects field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

pub fn is_valid_username(username: &str) -> bool {
    username.trim().chars().count() >= MIN_USERNAME_LEN
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn is_valid_fingerprint(fingerprint_id: i64) -> bool {
    FINGERPRINT_RANGE.contains(&fingerprint_id)
}

/// The fingerprint as stored, if it is in range.
pub fn fingerprint(raw: i64) -> Option<i32> {
    if is_valid_fingerprint(raw) {
        i32::try_from(raw).ok()
    } else {
        None
    }
}

pub fn is_valid_duration_format(duration: &str) -> bool {
    DURATION_RE.is_match(duration.trim())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("john@veriloc.com"));
        assert!(is_valid_email(" jane.smith@uni.edu.ph "));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@b.toolong"));
    }

    #[test]
    fn fingerprint_bounds() {
        assert!(is_valid_fingerprint(1000));
        assert!(is_valid_fingerprint(9999));
        assert!(!is_valid_fingerprint(999));
        assert!(!is_valid_fingerprint(10000));
        assert_eq!(fingerprint(1234), Some(1234));
        assert_eq!(fingerprint(-5), None);
    }

    #[test]
    fn duration_format() {
        assert!(is_valid_duration_format("9:00-10:00"));
        assert!(is_valid_duration_format("12:30-1:30"));
        assert!(!is_valid_duration_format("9-10"));
        assert!(!is_valid_duration_format("9:00 - 10:00"));
    }

    #[test]
    fn username_and_password_lengths() {
        assert!(is_valid_username("bob"));
        assert!(!is_valid_username("  al "));
        assert!(is_valid_password("secret"));
        assert!(!is_valid_password("short"));
    }

    #[test]
    fn validator_collects_every_failure() {
        let mut v = Validator::new();
        v.check(false, "username", "too short")
            .check(true, "email", "bad")
            .check(false, "fingerprintID", "out of range");
        match v.finish() {
            Err(AppError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, ["username", "fingerprintID"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
