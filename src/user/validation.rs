use regex::Regex;
use std::fmt;
use lazy_static::lazy_static;
use log::debug;
use crate::user::{EMAIL_REGEX, MIN_PASSWORD_LENGTH, SPECIAL_CHARACTERS};

lazy_static! {
    static ref EMAIL_PATTERN: Option<Regex> = Regex::new(EMAIL_REGEX).ok();
}

/// Password requirement types for validation
#[derive(Debug, Clone, PartialEq)]
pub enum PasswordRequirement {
    MinimumLength(usize),
    ContainsUppercase,
    ContainsLowercase,
    ContainsNumbers,
    ContainsSpecialChars,
}

impl fmt::Display for PasswordRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordRequirement::MinimumLength(len) => write!(f, "Password must be at least {} characters long", len),
            PasswordRequirement::ContainsUppercase => write!(f, "Password must contain at least one uppercase letter"),
            PasswordRequirement::ContainsLowercase => write!(f, "Password must contain at least one lowercase letter"),
            PasswordRequirement::ContainsNumbers => write!(f, "Password must contain at least one number"),
            PasswordRequirement::ContainsSpecialChars => write!(f, "Password must contain at least one of {}", SPECIAL_CHARACTERS),
        }
    }
}

/// Check an email address against the accepted `local@domain.tld` shape.
///
/// Only the format is checked; the domain is never resolved.
pub fn validate_email(email: &str) -> bool {
    EMAIL_PATTERN.as_ref().map_or(false, |re| re.is_match(email))
}

/// Check a password against the strength rules
pub fn validate_password(password: &str) -> bool {
    password_requirements(password).is_empty()
}

/// List every strength rule `password` fails
pub fn password_requirements(password: &str) -> Vec<PasswordRequirement> {
    debug!("Validating password strength");

    let mut failed_requirements = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        failed_requirements.push(PasswordRequirement::MinimumLength(MIN_PASSWORD_LENGTH));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        failed_requirements.push(PasswordRequirement::ContainsUppercase);
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        failed_requirements.push(PasswordRequirement::ContainsLowercase);
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        failed_requirements.push(PasswordRequirement::ContainsNumbers);
    }

    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        failed_requirements.push(PasswordRequirement::ContainsSpecialChars);
    }

    failed_requirements
}
