use log::{debug, info, warn};

use crate::database::Account;
use crate::user::store::{AccountError, AccountStore};
use crate::user::validation::{validate_email, validate_password};

impl AccountStore {
    /// Register a new account and return its id.
    ///
    /// Checks run in order and stop at the first failure: email format,
    /// password strength, then email uniqueness.
    pub fn register(&mut self, email: &str, password: &str) -> Result<String, AccountError> {
        debug!("Registering new account: {}", email);

        if !validate_email(email) {
            warn!("Invalid email format: {}", email);
            return Err(AccountError::InvalidEmail);
        }

        if !validate_password(password) {
            warn!("Password does not meet strength requirements");
            return Err(AccountError::WeakPassword);
        }

        if self.contains(email) {
            warn!("Email already registered: {}", email);
            return Err(AccountError::EmailExists);
        }

        let password_hash = self.hash_password(password)?;
        let account = Account::new(password_hash, self.clock.now());
        let account_id = account.id.clone();

        let snapshot = self.accounts.clone();
        self.accounts.insert(email.to_string(), account);
        self.save_or_rollback(snapshot)?;

        info!("Account registered: {}", email);
        Ok(account_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::security::password::Argon2Hasher;
    use crate::user::store::{AccountError, AccountStore, StoreOptions};
    use tempfile::{tempdir, TempDir};

    fn open_store() -> (AccountStore, TempDir) {
        let dir = tempdir().unwrap();
        let store = AccountStore::open(dir.path().join("accounts.json"), StoreOptions::default())
            .with_hasher(Argon2Hasher::new(1024));
        (store, dir)
    }

    #[test]
    fn test_register_success() {
        let (mut store, _dir) = open_store();

        let id = store.register("newuser@example.com", "ValidStrong1Pass!").unwrap();
        assert!(!id.is_empty());
        assert!(store.contains("newuser@example.com"));

        let profile = store.profile("newuser@example.com").unwrap();
        assert_eq!(profile.id, id);
        assert_eq!(profile.login_attempts, 0);
        assert!(profile.locked_until.is_none());
    }

    #[test]
    fn test_register_persists_hash_not_plaintext() {
        let (mut store, _dir) = open_store();
        store.register("newuser@example.com", "ValidStrong1Pass!").unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("newuser@example.com"));
        assert!(contents.contains("$argon2id$"));
        assert!(!contents.contains("ValidStrong1Pass!"));
    }

    #[test]
    fn test_register_invalid_email() {
        let (mut store, _dir) = open_store();
        let result = store.register("invalid-email", "ValidStrong1Pass!");
        assert!(matches!(result, Err(AccountError::InvalidEmail)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_register_weak_password() {
        let (mut store, _dir) = open_store();
        let result = store.register("user@example.com", "weak");
        assert!(matches!(result, Err(AccountError::WeakPassword)));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_register_checks_email_before_password() {
        let (mut store, _dir) = open_store();
        let result = store.register("not-an-email", "weak");
        assert!(matches!(result, Err(AccountError::InvalidEmail)));
    }

    #[test]
    fn test_register_duplicate_email() {
        let (mut store, _dir) = open_store();
        store.register("user@example.com", "ValidStrong1Pass!").unwrap();

        let result = store.register("user@example.com", "Another1Pass!");
        assert!(matches!(result, Err(AccountError::EmailExists)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_emails_are_case_sensitive() {
        let (mut store, _dir) = open_store();
        store.register("user@example.com", "ValidStrong1Pass!").unwrap();
        store.register("User@example.com", "ValidStrong1Pass!").unwrap();
        assert_eq!(store.len(), 2);
    }
}
