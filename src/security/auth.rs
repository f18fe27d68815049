use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::user::{AccountError, AccountStore, LOCKOUT_DURATION_MINUTES};

/// Source of the current time for lockout decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl AccountStore {
    /// Authenticate `email` with `password` and return the account id.
    ///
    /// A locked account is refused without checking the password. Each wrong
    /// password counts toward the lockout threshold; reaching it locks the
    /// account for [`LOCKOUT_DURATION_MINUTES`]. A successful login clears
    /// both the counter and the lock.
    pub fn login(&mut self, email: &str, password: &str) -> Result<String, AccountError> {
        let now = self.clock.now();

        let Some(account) = self.accounts.get(email) else {
            warn!("Login attempt with non-existent email: {}", email);
            return Err(AccountError::EmailNotFound);
        };

        if let Some(locked_until) = account.locked_until {
            if now < locked_until {
                warn!("Login attempt on locked account: {}", email);
                return Err(AccountError::AccountLocked(locked_until));
            }
        }

        let verified = self.hasher.verify(password, &account.password_hash).map_err(|e| {
            error!("Password verification error for {}: {:#}", email, e);
            AccountError::Hashing(format!("{:#}", e))
        })?;

        if !verified {
            return Err(self.record_failed_attempt(email, now));
        }

        let upgraded_hash = if self.hasher.needs_rehash(&account.password_hash) {
            match self.hasher.hash(password) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    warn!("Failed to upgrade password hash for {}: {:#}", email, e);
                    None
                }
            }
        } else {
            None
        };

        let Some(account) = self.accounts.get_mut(email) else {
            return Err(AccountError::EmailNotFound);
        };
        account.login_attempts = 0;
        account.locked_until = None;
        if let Some(hash) = upgraded_hash {
            account.password_hash = hash;
            info!("Upgraded legacy password hash for {}", email);
        }
        let account_id = account.id.clone();
        self.save_logged();

        info!("Successful login: {}", email);
        Ok(account_id)
    }

    fn record_failed_attempt(&mut self, email: &str, now: DateTime<Utc>) -> AccountError {
        let max_attempts = self.max_login_attempts;
        let Some(account) = self.accounts.get_mut(email) else {
            return AccountError::EmailNotFound;
        };

        account.login_attempts = account.login_attempts.saturating_add(1);
        debug!("Failed login {} of {} for {}", account.login_attempts, max_attempts, email);

        if account.login_attempts >= max_attempts {
            account.locked_until = Some(now + Duration::minutes(LOCKOUT_DURATION_MINUTES));
            warn!("Account locked due to multiple failed attempts: {}", email);
            self.save_logged();
            return AccountError::TooManyAttempts(LOCKOUT_DURATION_MINUTES);
        }

        self.save_logged();
        warn!("Incorrect password for email: {}", email);
        AccountError::IncorrectPassword
    }
}
