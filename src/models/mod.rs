//! Data models for the Joblane API surface.
//!
//! This module contains the data structures exchanged with the backend:
//!
//! - `Job`, `NewJob`: postings as seekers and recruiters see them
//! - `Application`, `Applicant`: the two sides of an application
//! - `Profile`, `CompanyProfile`: seeker and recruiter profiles
//! - `NewAccount`, `RegisterReceipt`: registration payloads

pub mod account;
pub mod application;
pub mod company;
pub mod job;
pub mod profile;

pub use account::{NewAccount, RegisterReceipt};
pub use application::{Applicant, Application};
pub use company::CompanyProfile;
pub use job::{Job, NewJob};
pub use profile::Profile;

/// The backend is inconsistent about skill lists: sometimes a JSON array,
/// sometimes one comma-separated string. Accept both.
pub(crate) mod skills {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SkillsRepr {
        List(Vec<String>),
        Csv(String),
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = Option::<SkillsRepr>::deserialize(deserializer)?;
        Ok(match repr {
            Some(SkillsRepr::List(list)) => list,
            Some(SkillsRepr::Csv(csv)) => csv
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "super::skills::deserialize")]
        skills: Vec<String>,
    }

    #[test]
    fn skills_accept_array_and_csv() {
        let from_array: Holder = serde_json::from_str(r#"{"skills": ["Rust", "SQL"]}"#).unwrap();
        assert_eq!(from_array.skills, vec!["Rust", "SQL"]);

        let from_csv: Holder = serde_json::from_str(r#"{"skills": "Rust, SQL, "}"#).unwrap();
        assert_eq!(from_csv.skills, vec!["Rust", "SQL"]);

        let missing: Holder = serde_json::from_str("{}").unwrap();
        assert!(missing.skills.is_empty());

        let null: Holder = serde_json::from_str(r#"{"skills": null}"#).unwrap();
        assert!(null.skills.is_empty());
    }
}
