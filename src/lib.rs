//! Joblane client core - session management and API client for the Joblane
//! job marketplace.
//!
//! This crate is the non-UI half of the Joblane client: it owns the
//! authenticated session (token storage across a durable and a volatile
//! scope, bearer attachment, silent refresh-and-replay on credential
//! expiry) and a typed client for the REST backend that the job search,
//! application, and recruiter screens consume.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{Role, Scope, SessionCredential, SessionStore};
pub use config::Config;

/// Re-export commonly used request types
pub use reqwest::{Method, StatusCode};
