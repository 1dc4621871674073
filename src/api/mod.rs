//! REST API client module for the Joblane backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! Joblane API: authentication flows, job search and posting,
//! applications, and profiles.
//!
//! Every request carries the bearer token from the shared session store;
//! a 401 triggers one silent token refresh and one replay of the request.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
