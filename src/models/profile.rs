use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Job-seeker profile (`GET` / `PUT /profile/`).
///
/// The resume field carries the stored file's URL; uploading a new file is
/// a UI concern outside this crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "super::skills::deserialize")]
    pub skills: Vec<String>,
    #[serde(default)]
    pub resume: Option<String>,
}
