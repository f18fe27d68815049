use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::Config;
use crate::database::{AccountFile, Accounts, StorageError};
use crate::security::auth::{Clock, SystemClock};
use crate::security::password::{Argon2Hasher, PasswordHasher, DEFAULT_KDF_MEMORY_KIB};
use crate::user::profile::AccountProfile;
use crate::user::DEFAULT_MAX_LOGIN_ATTEMPTS;

/// Account operation errors. The Display text is the message shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password does not meet strength requirements")]
    WeakPassword,

    #[error("Email already registered")]
    EmailExists,

    #[error("Email not found")]
    EmailNotFound,

    #[error("Account locked. Try again after {}", .0.format("%Y-%m-%d %H:%M:%S UTC"))]
    AccountLocked(DateTime<Utc>),

    #[error("Too many failed attempts. Account locked for {0} minutes.")]
    TooManyAttempts(i64),

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Failed to save accounts: {0}")]
    Storage(#[from] StorageError),
}

/// Collapse an operation result into a success flag and a message or account id
pub fn outcome(result: Result<String, AccountError>) -> (bool, String) {
    match result {
        Ok(id) => (true, id),
        Err(e) => (false, e.to_string()),
    }
}

/// Store tuning taken from the application configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreOptions {
    pub max_login_attempts: u32,
    pub kdf_memory_kib: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
            kdf_memory_kib: DEFAULT_KDF_MEMORY_KIB,
        }
    }
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_login_attempts: config.authentication.max_login_attempts,
            kdf_memory_kib: config.security.kdf_memory_kib,
        }
    }
}

/// Accounts keyed by email, persisted to a JSON file after every change.
///
/// Operations take `&mut self`; wrap the store in a [`SharedAccountStore`]
/// to use it from several threads.
pub struct AccountStore {
    pub(crate) accounts: Accounts,
    pub(crate) file: AccountFile,
    pub(crate) max_login_attempts: u32,
    pub(crate) hasher: Box<dyn PasswordHasher>,
    pub(crate) clock: Box<dyn Clock>,
}

impl AccountStore {
    /// Open the store at `path`, loading any existing accounts.
    ///
    /// A missing file starts an empty store. A file that cannot be parsed is
    /// logged, moved aside to `<path>.corrupt`, and also starts an empty
    /// store. Any other read error is logged and leaves the file in place.
    pub fn open(path: impl Into<PathBuf>, options: StoreOptions) -> Self {
        let file = AccountFile::new(path);
        let accounts = load_or_empty(&file);

        Self {
            accounts,
            file,
            max_login_attempts: options.max_login_attempts.max(1),
            hasher: Box::new(Argon2Hasher::new(options.kdf_memory_kib)),
            clock: Box::new(SystemClock),
        }
    }

    /// Open the store described by `config`
    pub fn from_config(config: &Config) -> Self {
        Self::open(&config.database.path, StoreOptions::from(config))
    }

    pub fn with_hasher(mut self, hasher: impl PasswordHasher + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn max_login_attempts(&self) -> u32 {
        self.max_login_attempts
    }

    pub fn contains(&self, email: &str) -> bool {
        self.accounts.contains_key(email)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Whether `email` is currently locked out
    pub fn is_locked(&self, email: &str) -> bool {
        let now = self.clock.now();
        self.accounts.get(email).map_or(false, |a| a.is_locked_at(now))
    }

    /// Snapshot of every account without password hashes
    pub fn profiles(&self) -> Vec<AccountProfile> {
        self.accounts
            .iter()
            .map(|(email, account)| AccountProfile::new(email, account))
            .collect()
    }

    pub(crate) fn hash_password(&self, password: &str) -> Result<String, AccountError> {
        self.hasher.hash(password).map_err(|e| {
            error!("Error hashing password: {:#}", e);
            AccountError::Hashing(format!("{:#}", e))
        })
    }

    /// Persist the accounts, restoring `snapshot` in memory if the write fails
    pub(crate) fn save_or_rollback(&mut self, snapshot: Accounts) -> Result<(), AccountError> {
        if let Err(e) = self.file.save(&self.accounts) {
            error!("Error saving accounts: {}", e);
            self.accounts = snapshot;
            return Err(AccountError::Storage(e));
        }
        info!("Accounts saved successfully");
        Ok(())
    }

    /// Persist the accounts, keeping the in-memory state if the write fails
    pub(crate) fn save_logged(&self) {
        match self.file.save(&self.accounts) {
            Ok(()) => info!("Accounts saved successfully"),
            Err(e) => error!("Error saving accounts: {}", e),
        }
    }
}

fn load_or_empty(file: &AccountFile) -> Accounts {
    match file.load() {
        Ok(accounts) => accounts,
        Err(StorageError::NotFound(_)) => {
            info!("No existing accounts file. Creating new.");
            Accounts::new()
        }
        Err(e @ StorageError::Parse { .. }) => {
            error!("Error loading accounts: {}", e);
            match file.quarantine() {
                Ok(target) => warn!("Moved unreadable accounts file to {}", target.display()),
                Err(e) => warn!("Could not move unreadable accounts file aside: {}", e),
            }
            Accounts::new()
        }
        Err(e) => {
            // Only an unparseable document is moved aside
            error!("Error loading accounts: {}", e);
            Accounts::new()
        }
    }
}

/// Thread-safe handle serializing every operation on one [`AccountStore`]
#[derive(Clone)]
pub struct SharedAccountStore {
    inner: Arc<Mutex<AccountStore>>,
}

impl SharedAccountStore {
    pub fn new(store: AccountStore) -> Self {
        Self { inner: Arc::new(Mutex::new(store)) }
    }

    fn lock(&self) -> MutexGuard<'_, AccountStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, email: &str, password: &str) -> Result<String, AccountError> {
        self.lock().register(email, password)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<String, AccountError> {
        self.lock().login(email, password)
    }

    pub fn update_account(
        &self,
        old_email: &str,
        new_email: &str,
        new_password: Option<&str>,
    ) -> Result<String, AccountError> {
        self.lock().update_account(old_email, new_email, new_password)
    }

    pub fn profile(&self, email: &str) -> Option<AccountProfile> {
        self.lock().profile(email)
    }

    pub fn contains(&self, email: &str) -> bool {
        self.lock().contains(email)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
