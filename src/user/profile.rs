use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::database::Account;
use crate::user::store::{AccountError, AccountStore};
use crate::user::validation::{validate_email, validate_password};

/// Account details safe to show to the user; never carries the password hash
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AccountProfile {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub login_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

impl AccountProfile {
    pub(crate) fn new(email: &str, account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: email.to_string(),
            created_at: account.created_at,
            login_attempts: account.login_attempts,
            locked_until: account.locked_until,
        }
    }
}

impl AccountStore {
    /// Look up the profile registered under `email`
    pub fn profile(&self, email: &str) -> Option<AccountProfile> {
        self.accounts.get(email).map(|account| AccountProfile::new(email, account))
    }

    /// Change an account's email and optionally its password; returns the account id.
    ///
    /// `None` or an empty `new_password` keeps the current password hash.
    /// The id, creation time, and lockout state move with the account.
    pub fn update_account(
        &mut self,
        old_email: &str,
        new_email: &str,
        new_password: Option<&str>,
    ) -> Result<String, AccountError> {
        if !validate_email(new_email) {
            warn!("Invalid new email format: {}", new_email);
            return Err(AccountError::InvalidEmail);
        }

        let new_password = new_password.filter(|p| !p.is_empty());
        if let Some(password) = new_password {
            if !validate_password(password) {
                warn!("New password does not meet strength requirements");
                return Err(AccountError::WeakPassword);
            }
        }

        if new_email != old_email && self.contains(new_email) {
            warn!("Email already registered: {}", new_email);
            return Err(AccountError::EmailExists);
        }

        if !self.contains(old_email) {
            warn!("Update requested for unknown email: {}", old_email);
            return Err(AccountError::EmailNotFound);
        }

        let new_hash = new_password.map(|p| self.hash_password(p)).transpose()?;

        let snapshot = self.accounts.clone();
        let Some(mut account) = self.accounts.remove(old_email) else {
            return Err(AccountError::EmailNotFound);
        };
        if let Some(hash) = new_hash {
            account.password_hash = hash;
        }
        let account_id = account.id.clone();
        self.accounts.insert(new_email.to_string(), account);
        self.save_or_rollback(snapshot)?;

        info!("Account updated: {} -> {}", old_email, new_email);
        Ok(account_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::security::password::Argon2Hasher;
    use crate::user::store::{AccountError, AccountStore, StoreOptions};
    use tempfile::{tempdir, TempDir};

    const EMAIL: &str = "user@example.com";
    const PASSWORD: &str = "ValidStrong1Pass!";

    fn store_with_account() -> (AccountStore, String, TempDir) {
        let dir = tempdir().unwrap();
        let mut store = AccountStore::open(dir.path().join("accounts.json"), StoreOptions::default())
            .with_hasher(Argon2Hasher::new(1024));
        let id = store.register(EMAIL, PASSWORD).unwrap();
        (store, id, dir)
    }

    #[test]
    fn test_profile_lookup() {
        let (store, id, _dir) = store_with_account();
        let profile = store.profile(EMAIL).unwrap();
        assert_eq!(profile.id, id);
        assert_eq!(profile.email, EMAIL);
        assert!(store.profile("other@example.com").is_none());
    }

    #[test]
    fn test_profile_serialization_has_no_hash() {
        let (store, _id, _dir) = store_with_account();
        let value = serde_json::to_value(store.profile(EMAIL).unwrap()).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("password_hash").is_none());
    }

    #[test]
    fn test_update_email_and_password() {
        let (mut store, id, _dir) = store_with_account();

        let updated = store.update_account(EMAIL, "moved@example.com", Some("Changed2Pass?")).unwrap();
        assert_eq!(updated, id);
        assert!(!store.contains(EMAIL));

        assert!(matches!(store.login("moved@example.com", PASSWORD), Err(AccountError::IncorrectPassword)));
        assert_eq!(store.login("moved@example.com", "Changed2Pass?").unwrap(), id);
    }

    #[test]
    fn test_update_without_password_keeps_hash() {
        let (mut store, id, _dir) = store_with_account();
        let before = store.accounts[EMAIL].password_hash.clone();

        store.update_account(EMAIL, "moved@example.com", None).unwrap();
        assert_eq!(store.accounts["moved@example.com"].password_hash, before);
        assert_eq!(store.login("moved@example.com", PASSWORD).unwrap(), id);
    }

    #[test]
    fn test_update_with_empty_password_keeps_hash() {
        let (mut store, _id, _dir) = store_with_account();
        let before = store.accounts[EMAIL].password_hash.clone();

        store.update_account(EMAIL, EMAIL, Some("")).unwrap();
        assert_eq!(store.accounts[EMAIL].password_hash, before);
    }

    #[test]
    fn test_update_password_same_email() {
        let (mut store, id, _dir) = store_with_account();
        store.update_account(EMAIL, EMAIL, Some("Changed2Pass?")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.login(EMAIL, "Changed2Pass?").unwrap(), id);
    }

    #[test]
    fn test_update_invalid_email() {
        let (mut store, _id, _dir) = store_with_account();
        let result = store.update_account(EMAIL, "bad-email", None);
        assert!(matches!(result, Err(AccountError::InvalidEmail)));
        assert!(store.contains(EMAIL));
    }

    #[test]
    fn test_update_weak_password() {
        let (mut store, _id, _dir) = store_with_account();
        let result = store.update_account(EMAIL, EMAIL, Some("weak"));
        assert!(matches!(result, Err(AccountError::WeakPassword)));
    }

    #[test]
    fn test_update_to_taken_email() {
        let (mut store, _id, _dir) = store_with_account();
        store.register("other@example.com", PASSWORD).unwrap();

        let result = store.update_account(EMAIL, "other@example.com", None);
        assert!(matches!(result, Err(AccountError::EmailExists)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_update_unknown_account() {
        let (mut store, _id, _dir) = store_with_account();
        let result = store.update_account("ghost@example.com", "new@example.com", None);
        assert!(matches!(result, Err(AccountError::EmailNotFound)));
        assert_eq!(store.len(), 1);
    }
}
