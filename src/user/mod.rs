// User account module
// This module provides the account store and its registration,
// validation, and profile operations. Login lives in `security::auth`.

mod store;
mod registration;
mod validation;
mod profile;

pub use store::{outcome, AccountError, AccountStore, SharedAccountStore, StoreOptions};
pub use validation::{password_requirements, validate_email, validate_password, PasswordRequirement};
pub use profile::AccountProfile;

/// Default failed login attempts before account lockout
pub const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Account lockout duration in minutes
pub const LOCKOUT_DURATION_MINUTES: i64 = 15;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the special-character rule
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Email regex pattern for validation
pub const EMAIL_REGEX: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
