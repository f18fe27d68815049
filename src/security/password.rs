use anyhow::Result;
use argon2::{
    password_hash::{SaltString, PasswordHasher as _, PasswordVerifier, PasswordHash},
    Argon2, Algorithm, Version, Params
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use log::debug;

/// Default Argon2 memory cost in KiB
pub const DEFAULT_KDF_MEMORY_KIB: u32 = 19456;

/// Argon2 passes over memory
const KDF_ITERATIONS: u32 = 2;

/// Hashes passwords for storage and checks candidates against stored hashes.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a one-way digest of `password` suitable for storage
    fn hash(&self, password: &str) -> Result<String>;

    /// Check `password` against a stored digest
    fn verify(&self, password: &str, stored: &str) -> Result<bool>;

    /// Whether a stored digest should be replaced after the next successful login
    fn needs_rehash(&self, stored: &str) -> bool;
}

/// Argon2id hasher producing PHC strings with a random per-hash salt
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    memory_kib: u32,
}

impl Argon2Hasher {
    pub fn new(memory_kib: u32) -> Self {
        Self { memory_kib }
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.memory_kib, // Memory cost (kibibytes)
            KDF_ITERATIONS,
            1,               // Parallelism
            None,            // Output length (defaults to 32 bytes)
        ).map_err(|e| anyhow::anyhow!("Invalid Argon2 parameters: {}", e))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new(DEFAULT_KDF_MEMORY_KIB)
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self.argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();

        Ok(hash)
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool> {
        if is_legacy_digest(stored) {
            debug!("Verifying against legacy unsalted digest");
            return Ok(legacy_digest(password) == stored.to_ascii_lowercase());
        }

        let parsed = PasswordHash::new(stored)
            .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

        // Parameters come from the PHC string itself
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow::anyhow!("Failed to verify password: {}", e)),
        }
    }

    fn needs_rehash(&self, stored: &str) -> bool {
        is_legacy_digest(stored)
    }
}

/// Unsalted SHA-256 hex digest, as written by earlier versions of the store
pub fn legacy_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn is_legacy_digest(stored: &str) -> bool {
    stored.len() == 64 && stored.chars().all(|c| c.is_ascii_hexdigit())
}
