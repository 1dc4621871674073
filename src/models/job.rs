use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A job posting as returned by `GET /jobs/`.
///
/// Only the fields the listing cards rely on are required; everything the
/// backend fills in lazily is optional with a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "super::skills::deserialize")]
    pub skills: Vec<String>,
}

/// Payload for `POST /jobs/create/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub experience: Option<String>,
    pub job_type: String,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub description: String,
    pub skills: Vec<String>,
}
