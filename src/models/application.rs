use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::Job;

/// One application from the seeker's side (`GET /jobs/applied/`).
#[derive(Debug, Clone, Deserialize)]
pub struct Application {
    pub id: i64,
    #[serde(default)]
    pub job: Option<Job>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
}

/// An applicant as the recruiter sees them (`GET /applicants/{id}/`).
#[derive(Debug, Clone, Deserialize)]
pub struct Applicant {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "super::skills::deserialize")]
    pub skills: Vec<String>,
    /// URL of the uploaded resume, when one exists
    #[serde(default)]
    pub resume: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Applicant {
    /// Uppercase initials for the avatar placeholder.
    pub fn initials(&self) -> String {
        self.name
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(|c| c.to_uppercase())
            .collect()
    }
}
