use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use log::{debug, info};

pub mod models;

pub use models::{Account, Accounts};

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Accounts file not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: io::Error,
    },

    #[error("Failed to parse accounts file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Failed to serialize accounts: {0}")]
    Serialize(serde_json::Error),
}

/// The JSON document holding every account, read and written wholesale
#[derive(Debug, Clone)]
pub struct AccountFile {
    path: PathBuf,
}

impl AccountFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole accounts document
    pub fn load(&self) -> Result<Accounts, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(self.display()));
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let accounts: Accounts = serde_json::from_str(&contents).map_err(|e| StorageError::Parse {
            path: self.display(),
            source: e,
        })?;

        info!("Loaded {} accounts", accounts.len());
        Ok(accounts)
    }

    /// Replace the accounts document with `accounts`.
    ///
    /// The document is written to a temporary file next to the target and
    /// renamed over it, so readers never observe a partial write.
    pub fn save(&self, accounts: &Accounts) -> Result<(), StorageError> {
        let dir = self.parent_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;
        }

        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        accounts.serialize(&mut serializer).map_err(StorageError::Serialize)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&buf).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        debug!("Saved {} accounts to {}", accounts.len(), self.path.display());
        Ok(())
    }

    /// Move an unreadable accounts file aside so the next save does not destroy it.
    ///
    /// The first copy goes to `<path>.corrupt`; later ones get a numeric
    /// suffix (`<path>.corrupt.1`, ...) so earlier copies are never replaced.
    pub fn quarantine(&self) -> Result<PathBuf, StorageError> {
        let target = self.free_quarantine_path();
        std::fs::rename(&self.path, &target).map_err(|e| self.io_error(e))?;
        Ok(target)
    }

    fn free_quarantine_path(&self) -> PathBuf {
        let mut base = OsString::from(self.path.as_os_str());
        base.push(".corrupt");

        let mut candidate = PathBuf::from(&base);
        let mut counter: u32 = 1;
        while candidate.symlink_metadata().is_ok() {
            let mut name = base.clone();
            name.push(format!(".{}", counter));
            candidate = PathBuf::from(name);
            counter += 1;
        }
        candidate
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.display(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    fn sample_accounts() -> Accounts {
        let now = Utc::now();
        let mut locked = Account::new("hash-b".to_string(), now);
        locked.login_attempts = 5;
        locked.locked_until = Some(now + Duration::minutes(15));

        let mut accounts = Accounts::new();
        accounts.insert("a@example.com".to_string(), Account::new("hash-a".to_string(), now));
        accounts.insert("b@example.com".to_string(), locked);
        accounts
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let file = AccountFile::new(dir.path().join("accounts.json"));
        assert!(matches!(file.load(), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, "{ not json").unwrap();

        let file = AccountFile::new(&path);
        assert!(matches!(file.load(), Err(StorageError::Parse { .. })));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let file = AccountFile::new(dir.path().join("accounts.json"));
        let accounts = sample_accounts();

        file.save(&accounts).unwrap();
        assert_eq!(file.load().unwrap(), accounts);
    }

    #[test]
    fn test_save_is_stable() {
        let dir = tempdir().unwrap();
        let file = AccountFile::new(dir.path().join("accounts.json"));
        file.save(&sample_accounts()).unwrap();
        let first = std::fs::read_to_string(file.path()).unwrap();

        let reloaded = file.load().unwrap();
        file.save(&reloaded).unwrap();
        let second = std::fs::read_to_string(file.path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_save_uses_four_space_indent() {
        let dir = tempdir().unwrap();
        let file = AccountFile::new(dir.path().join("accounts.json"));
        file.save(&sample_accounts()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.starts_with("{\n    \"a@example.com\": {\n        \"id\""));
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let file = AccountFile::new(dir.path().join("data").join("accounts.json"));
        file.save(&Accounts::new()).unwrap();
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn test_quarantine_moves_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, "garbage").unwrap();

        let target = AccountFile::new(&path).quarantine().unwrap();
        assert_eq!(target, dir.path().join("accounts.json.corrupt"));
        assert!(!path.exists());
        assert_eq!(std::fs::read_to_string(target).unwrap(), "garbage");
    }

    #[test]
    fn test_quarantine_keeps_earlier_copies() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let file = AccountFile::new(&path);

        std::fs::write(&path, "FIRST CORRUPT DOCUMENT").unwrap();
        let first = file.quarantine().unwrap();

        std::fs::write(&path, "SECOND CORRUPT").unwrap();
        let second = file.quarantine().unwrap();

        std::fs::write(&path, "THIRD").unwrap();
        let third = file.quarantine().unwrap();

        assert_eq!(first, dir.path().join("accounts.json.corrupt"));
        assert_eq!(second, dir.path().join("accounts.json.corrupt.1"));
        assert_eq!(third, dir.path().join("accounts.json.corrupt.2"));
        assert_eq!(std::fs::read_to_string(first).unwrap(), "FIRST CORRUPT DOCUMENT");
        assert_eq!(std::fs::read_to_string(second).unwrap(), "SECOND CORRUPT");
        assert_eq!(std::fs::read_to_string(third).unwrap(), "THIRD");
    }
}
