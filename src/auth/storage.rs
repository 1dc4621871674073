//! Credential storage backends.
//!
//! The session record lives in exactly one of two scopes: a durable scope
//! that survives restarts (a JSON file in the config directory) or a
//! volatile scope that dies with the process. Both sit behind the
//! `CredentialStorage` trait so the session layer can be exercised in tests
//! without touching the filesystem.

use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};

use super::SessionCredential;

/// Persistence scope for the session credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Survives restarts ("remember me").
    Durable,
    /// Cleared when the process ends.
    Volatile,
}

impl Scope {
    pub fn other(self) -> Self {
        match self {
            Scope::Durable => Scope::Volatile,
            Scope::Volatile => Scope::Durable,
        }
    }
}

/// A backend holding at most one session credential under a fixed key.
pub trait CredentialStorage: Send + Sync {
    fn read(&self) -> Result<Option<SessionCredential>>;
    fn write(&self, credential: &SessionCredential) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Durable backend: one JSON file.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CredentialStorage for FileStorage {
    fn read(&self) -> Result<Option<SessionCredential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read session file")?;
        let credential = serde_json::from_str(&contents)
            .context("Failed to parse session file")?;
        Ok(Some(credential))
    }

    fn write(&self, credential: &SessionCredential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(credential)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Volatile backend: an in-process slot.
#[derive(Default)]
pub struct MemoryStorage {
    slot: RwLock<Option<SessionCredential>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStorage for MemoryStorage {
    fn read(&self) -> Result<Option<SessionCredential>> {
        let slot = self
            .slot
            .read()
            .map_err(|_| anyhow::anyhow!("Session storage lock poisoned"))?;
        Ok(slot.clone())
    }

    fn write(&self, credential: &SessionCredential) -> Result<()> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| anyhow::anyhow!("Session storage lock poisoned"))?;
        *slot = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| anyhow::anyhow!("Session storage lock poisoned"))?;
        *slot = None;
        Ok(())
    }
}
