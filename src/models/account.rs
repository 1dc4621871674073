use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Payload for `POST /register/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

/// Reply from `POST /register/`. The backend follows up with an OTP email,
/// so there is no credential here, only an optional human-readable note.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterReceipt {
    #[serde(default)]
    pub detail: Option<String>,
}
