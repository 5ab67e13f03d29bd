//! Persisted credential storage.
//!
//! The store is a dumb key-value surface: it holds the current token and the
//! identity fields as one logical unit and knows nothing about validation or
//! the network. Only the session controller writes it.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::session::Role;
use super::token::AuthError;

/// Credential file name inside the storage directory.
const CREDENTIALS_FILE: &str = "credentials.json";

/// The four identity fields written and cleared as a group, plus the
/// role-scoped numeric id cached for doctors. Serde renames carry the
/// name-stable key contract (`token`, `userRole`, `userName`, `userId`,
/// `doctorId`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    #[serde(rename = "userRole")]
    pub role: Role,
    #[serde(rename = "userName")]
    pub name: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "doctorId", default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<i64>,
}

impl Credentials {
    /// A record with any empty required field is unusable and gets reported
    /// by the store rather than returned.
    pub fn is_complete(&self) -> bool {
        !self.token.is_empty() && !self.name.is_empty() && !self.user_id.is_empty()
    }
}

/// Storage seam injected into the session controller.
pub trait CredentialStore: Send + Sync {
    /// Persist all fields as one logical unit.
    fn set(&self, credentials: &Credentials) -> Result<()>;

    /// Return the complete record, `Ok(None)` when nothing is stored, or
    /// `Err(IncompleteCredentials)` when a record exists but is partial or
    /// unreadable. Never a partial tuple.
    fn get(&self) -> Result<Option<Credentials>, AuthError>;

    /// Remove the whole record, including the cached doctor id.
    fn clear(&self) -> Result<()>;
}

/// File-backed store: one JSON document in the storage directory, written
/// whole and removed whole, so the group of fields can never be persisted
/// partially.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create storage directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }
}

impl CredentialStore for FileStore {
    fn set(&self, credentials: &Credentials) -> Result<()> {
        let contents = serde_json::to_string_pretty(credentials)?;
        std::fs::write(self.path(), contents).context("failed to write credential file")?;
        Ok(())
    }

    fn get(&self) -> Result<Option<Credentials>, AuthError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let Ok(contents) = std::fs::read_to_string(&path) else {
            warn!("credential file exists but could not be read");
            return Err(AuthError::IncompleteCredentials);
        };
        match serde_json::from_str::<Credentials>(&contents) {
            Ok(credentials) if credentials.is_complete() => Ok(Some(credentials)),
            Ok(_) => {
                warn!("stored credentials are incomplete");
                Err(AuthError::IncompleteCredentials)
            }
            Err(e) => {
                // Missing keys land here: a partial record is reported, never
                // returned as a partial tuple.
                warn!(error = %e, "stored credentials are unreadable");
                Err(AuthError::IncompleteCredentials)
            }
        }
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(&path).context("failed to remove credential file")?;
        }
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Credentials>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn set(&self, credentials: &Credentials) -> Result<()> {
        *self.slot.lock().unwrap() = Some(credentials.clone());
        Ok(())
    }

    fn get(&self) -> Result<Option<Credentials>, AuthError> {
        match self.slot.lock().unwrap().clone() {
            Some(credentials) if credentials.is_complete() => Ok(Some(credentials)),
            Some(_) => Err(AuthError::IncompleteCredentials),
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}
