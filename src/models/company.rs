use serde::{Deserialize, Serialize};

/// Recruiter company profile (`PUT /recruiter/company/`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    /// URL of the stored logo, when one exists
    #[serde(default)]
    pub logo: Option<String>,
}
