//! Authentication module for managing the client-side session.
//!
//! This module provides:
//! - `SessionCredential`: the authenticated identity record held client-side
//! - `SessionStore`: dual-scope credential persistence (durable vs volatile)
//!
//! The durable scope survives restarts ("remember me"); the volatile scope
//! lives only as long as the process.

pub mod session;
pub mod storage;

pub use session::{Role, SessionCredential, SessionStore};
pub use storage::{CredentialStorage, FileStorage, MemoryStorage, Scope};
