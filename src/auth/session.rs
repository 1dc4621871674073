//! Session credential and the store that owns its two persistence scopes.
//!
//! At most one credential is active at a time. The scope holding it is
//! chosen once at login (`remember` picks durable) and recorded, so later
//! writes go to the right place without probing both scopes. A fresh
//! process probes durable first, then volatile, to pick up a remembered
//! session.

use std::sync::RwLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::storage::{CredentialStorage, FileStorage, MemoryStorage, Scope};
use crate::config::Config;

/// Account kinds recognized by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    JobSeeker,
    Recruiter,
}

/// The authenticated identity of the current session.
///
/// Serializes as the fixed flat record `{id, name, email, role, access,
/// refresh}` - the layout the backend issues and the durable scope stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Short-lived token authorizing API calls
    pub access: String,
    /// Long-lived token exchanged for a new access token
    pub refresh: String,
}

impl SessionCredential {
    /// The Authorization header value for this credential.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access)
    }
}

/// Dual-scope store for the session credential.
///
/// Owns one durable and one volatile backend plus the record of which scope
/// currently holds the session. All reads and writes are synchronous local
/// I/O; the store never touches the network.
pub struct SessionStore {
    durable: Box<dyn CredentialStorage>,
    volatile: Box<dyn CredentialStorage>,
    active: RwLock<Option<Scope>>,
}

impl SessionStore {
    pub fn new(durable: Box<dyn CredentialStorage>, volatile: Box<dyn CredentialStorage>) -> Self {
        Self {
            durable,
            volatile,
            active: RwLock::new(None),
        }
    }

    /// Store with the configured session file as the durable scope and an
    /// in-process slot as the volatile scope.
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Box::new(FileStorage::new(config.session_path()?)),
            Box::new(MemoryStorage::new()),
        ))
    }

    fn backend(&self, scope: Scope) -> &dyn CredentialStorage {
        match scope {
            Scope::Durable => self.durable.as_ref(),
            Scope::Volatile => self.volatile.as_ref(),
        }
    }

    fn active_scope(&self) -> Result<Option<Scope>> {
        let active = self
            .active
            .read()
            .map_err(|_| anyhow::anyhow!("Session scope lock poisoned"))?;
        Ok(*active)
    }

    fn set_active(&self, scope: Option<Scope>) -> Result<()> {
        let mut active = self
            .active
            .write()
            .map_err(|_| anyhow::anyhow!("Session scope lock poisoned"))?;
        *active = scope;
        Ok(())
    }

    /// Record a fresh login. `remember` selects the durable scope. The other
    /// scope is cleared so a stale copy cannot shadow the new credential.
    pub fn login(&self, credential: &SessionCredential, remember: bool) -> Result<()> {
        let scope = if remember {
            Scope::Durable
        } else {
            Scope::Volatile
        };
        self.backend(scope).write(credential)?;
        self.backend(scope.other()).clear()?;
        self.set_active(Some(scope))?;
        debug!(?scope, user = credential.id, "Stored session credential");
        Ok(())
    }

    /// The current credential, if any.
    ///
    /// When no scope has been recorded yet (first lookup in a fresh
    /// process) the durable scope is probed before the volatile one, and
    /// whichever holds a credential becomes the recorded scope.
    pub fn current(&self) -> Result<Option<SessionCredential>> {
        if let Some(scope) = self.active_scope()? {
            return self.backend(scope).read();
        }
        for scope in [Scope::Durable, Scope::Volatile] {
            if let Some(credential) = self.backend(scope).read()? {
                self.set_active(Some(scope))?;
                return Ok(Some(credential));
            }
        }
        Ok(None)
    }

    /// Overwrite only the access token, in whichever scope holds the session.
    pub fn update_access(&self, access: &str) -> Result<()> {
        let mut credential = self
            .current()?
            .context("No session credential to update")?;
        credential.access = access.to_string();
        let scope = self
            .active_scope()?
            .context("No active session scope")?;
        self.backend(scope).write(&credential)?;
        debug!(?scope, "Updated access credential");
        Ok(())
    }

    /// Remove the credential from both scopes. Clearing both covers the
    /// transient window where stale copies exist during scope migration.
    pub fn clear(&self) -> Result<()> {
        self.durable.clear()?;
        self.volatile.clear()?;
        self.set_active(None)
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        Ok(self.current()?.map(|c| c.access))
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.current()?.map(|c| c.refresh))
    }

    pub fn role(&self) -> Result<Option<Role>> {
        Ok(self.current()?.map(|c| c.role))
    }

    /// Which scope holds the session, if one is recorded.
    pub fn scope(&self) -> Option<Scope> {
        self.active_scope().ok().flatten()
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.current(), Ok(Some(_)))
    }
}
