// Local account management library
// This crate provides the account store behind the local account manager:
// validation rules, password hashing, lockout policy, and JSON persistence.

pub mod config;
pub mod database;
pub mod security;
pub mod user;

pub use security::auth::{Clock, SystemClock};
pub use security::password::{Argon2Hasher, PasswordHasher};
pub use user::{
    outcome, validate_email, validate_password, AccountError, AccountProfile, AccountStore,
    SharedAccountStore, StoreOptions,
};
