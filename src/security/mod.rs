// Security module
// Password hashing and login with lockout.

pub mod auth;
pub mod password;

pub use auth::{Clock, SystemClock};
pub use password::{legacy_digest, Argon2Hasher, PasswordHasher, DEFAULT_KDF_MEMORY_KIB};
