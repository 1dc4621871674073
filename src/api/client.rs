//! API client for communicating with the Joblane REST API.
//!
//! One parameterized client replaces the near-identical per-screen HTTP
//! wrappers the web app accumulated: `ApiClient` takes the base address and
//! a shared `SessionStore` at construction, and every call goes through the
//! same bearer-attach / refresh-once path.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{Role, SessionCredential, SessionStore};
use crate::config::Config;
use crate::models::{
    Applicant, Application, CompanyProfile, Job, NewAccount, NewJob, Profile, RegisterReceipt,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Called with the configured login path when the session is expired beyond
/// recovery. Stands in for the web client's full navigation to `/login`.
pub type SessionExpiredHook = dyn Fn(&str) + Send + Sync;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    id: i64,
    name: String,
    email: String,
    role: Role,
    token: String,
    refresh: String,
}

/// OTP verification issues the access token under `access`, not `token`.
#[derive(Debug, Deserialize)]
struct OtpLoginResponse {
    id: i64,
    name: String,
    email: String,
    role: Role,
    access: String,
    refresh: String,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

#[derive(Serialize)]
struct LogoutRequest<'a> {
    refresh_token: &'a str,
}

/// API client for the Joblane backend.
/// Clone is cheap - reqwest::Client and the shared state are Arc-backed.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    login_path: String,
    store: Arc<SessionStore>,
    /// Gate ensuring a single in-flight refresh even when several requests
    /// hit a 401 at the same time.
    refresh_gate: Arc<Mutex<()>>,
    on_session_expired: Option<Arc<SessionExpiredHook>>,
}

impl ApiClient {
    /// Create a new API client against `config.api_base_url`, reading and
    /// writing credentials through the given store.
    pub fn new(config: &Config, store: Arc<SessionStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            login_path: config.login_path.clone(),
            store,
            refresh_gate: Arc::new(Mutex::new(())),
            on_session_expired: None,
        })
    }

    /// Install a hook invoked with the login path when the refresh
    /// credential is rejected and the session is forcibly ended.
    pub fn on_session_expired(
        mut self,
        hook: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    /// The session store this client reads and writes.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    // ===== Request path =====

    /// Send a request to the protected API.
    ///
    /// The current access token, if any, is attached as a bearer header;
    /// that lookup is synchronous local I/O, never network. A 401 response
    /// triggers at most one silent refresh followed by one replay of the
    /// request; the replay's outcome is returned as-is, even another 401.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut bearer = self.store.access_token()?;
        let mut retried = false;

        loop {
            let mut request = self.client.request(method.clone(), &url);
            if let Some(ref access) = bearer {
                request = request.bearer_auth(access);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(ApiError::Network)
                .with_context(|| format!("Failed to send {method} request to {url}"))?;

            if response.status() == StatusCode::UNAUTHORIZED && !retried {
                retried = true;
                let Some(refresh) = self.store.refresh_token()? else {
                    debug!(url = %url, "401 with no refresh credential stored");
                    return Err(ApiError::Unauthorized.into());
                };
                bearer = Some(self.refresh_access(&refresh, bearer.as_deref()).await?);
                debug!(url = %url, "Replaying request with refreshed credential");
                continue;
            }

            return Ok(response);
        }
    }

    /// Exchange the refresh token for a new access token and persist it in
    /// whichever scope holds the session.
    ///
    /// Only one refresh is in flight at a time: a caller that loses the
    /// race re-reads the store after acquiring the gate and reuses the
    /// freshly written token instead of issuing a second refresh call.
    /// Rejection is fatal - both scopes are cleared and the
    /// session-expired hook fires.
    async fn refresh_access(&self, refresh: &str, stale_access: Option<&str>) -> Result<String> {
        let _gate = self.refresh_gate.lock().await;

        // A concurrent request may have finished refreshing while we waited.
        if let Some(current) = self.store.access_token()? {
            if Some(current.as_str()) != stale_access {
                debug!("Reusing access credential refreshed by a concurrent request");
                return Ok(current);
            }
        }

        match self.post_refresh(refresh).await {
            Ok(access) => {
                self.store.update_access(&access)?;
                info!("Access credential refreshed");
                Ok(access)
            }
            Err(err) => {
                warn!(error = %err, "Credential refresh failed, ending session");
                self.store.clear()?;
                if let Some(ref hook) = self.on_session_expired {
                    hook(&self.login_path);
                } else {
                    warn!(login_path = %self.login_path, "Session expired; redirect to login");
                }
                Err(err)
            }
        }
    }

    async fn post_refresh(&self, refresh: &str) -> Result<String> {
        let url = format!("{}/refresh/", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest { refresh })
            .send()
            .await
            .map_err(ApiError::Network)
            .context("Failed to send refresh request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::refresh_rejected(status, &body).into());
        }

        let parsed: RefreshResponse = response
            .json()
            .await
            .context("Failed to parse refresh response")?;
        Ok(parsed.access)
    }

    /// Check if response is successful, returning a classified error with
    /// the body if not.
    async fn check_response(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {path}"))
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {path}"))
    }

    /// Fire a request whose response body we don't care about.
    async fn send_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<()> {
        let response = self.send(method, path, body).await?;
        Self::check_response(response).await?;
        Ok(())
    }

    // ===== Authentication =====

    /// Log in with username and password. `remember` selects the durable
    /// storage scope so the session survives restarts.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<SessionCredential> {
        #[derive(Serialize)]
        struct LoginBody<'a> {
            username: &'a str,
            password: &'a str,
        }

        let reply: LoginResponse = self
            .post("/login/", &LoginBody { username, password })
            .await?;
        let credential = SessionCredential {
            id: reply.id,
            name: reply.name,
            email: reply.email,
            role: reply.role,
            access: reply.token,
            refresh: reply.refresh,
        };
        self.store.login(&credential, remember)?;
        info!(user = credential.id, remember, "Logged in");
        Ok(credential)
    }

    /// Create an account. The backend follows up with an OTP email; the
    /// session starts once `verify_otp` succeeds.
    pub async fn register(&self, account: &NewAccount) -> Result<RegisterReceipt> {
        self.post("/register/", account).await
    }

    /// Verify the registration OTP. Success logs the user in durably, the
    /// same as the web client.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<SessionCredential> {
        #[derive(Serialize)]
        struct VerifyOtpBody<'a> {
            email: &'a str,
            otp: &'a str,
        }

        let reply: OtpLoginResponse = self
            .post("/verify-otp/", &VerifyOtpBody { email, otp })
            .await?;
        let credential = SessionCredential {
            id: reply.id,
            name: reply.name,
            email: reply.email,
            role: reply.role,
            access: reply.access,
            refresh: reply.refresh,
        };
        self.store.login(&credential, true)?;
        info!(user = credential.id, "OTP verified, logged in");
        Ok(credential)
    }

    /// Ask the backend to resend the registration OTP.
    pub async fn send_otp(&self, email: &str) -> Result<()> {
        #[derive(Serialize)]
        struct SendOtpBody<'a> {
            email: &'a str,
        }
        self.send_unit(Method::POST, "/send-otp/", Some(&SendOtpBody { email }))
            .await
    }

    /// Identity-provider login. The tokens were issued out of band, so this
    /// only records the credential, in the durable scope.
    pub fn google_login(&self, credential: SessionCredential) -> Result<SessionCredential> {
        self.store.login(&credential, true)?;
        info!(user = credential.id, "Logged in via identity provider");
        Ok(credential)
    }

    /// Revoke the refresh credential (best effort) and clear both storage
    /// scopes. A failed revoke is logged, never surfaced.
    pub async fn logout(&self) -> Result<()> {
        if let Some(credential) = self.store.current()? {
            let url = format!("{}/logout/", self.base_url);
            let result = self
                .client
                .post(&url)
                .bearer_auth(&credential.access)
                .json(&LogoutRequest {
                    refresh_token: &credential.refresh,
                })
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => {
                    debug!("Refresh credential revoked");
                }
                Ok(response) => {
                    warn!(status = %response.status(), "Credential revoke failed");
                }
                Err(err) => {
                    warn!(error = %err, "Credential revoke failed");
                }
            }
        }
        self.store.clear()
    }

    // ===== Password reset =====

    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        #[derive(Serialize)]
        struct ForgotBody<'a> {
            email: &'a str,
        }
        self.send_unit(
            Method::POST,
            "/forgot-password/",
            Some(&ForgotBody { email }),
        )
        .await
    }

    pub async fn verify_reset_otp(&self, email: &str, otp: &str) -> Result<()> {
        #[derive(Serialize)]
        struct VerifyBody<'a> {
            email: &'a str,
            otp: &'a str,
        }
        self.send_unit(
            Method::POST,
            "/forgot-password/verify-otp/",
            Some(&VerifyBody { email, otp }),
        )
        .await
    }

    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<()> {
        #[derive(Serialize)]
        struct ResetBody<'a> {
            email: &'a str,
            password: &'a str,
        }
        self.send_unit(
            Method::POST,
            "/forgot-password/reset/",
            Some(&ResetBody {
                email,
                password: new_password,
            }),
        )
        .await
    }

    // ===== Jobs =====

    /// Fetch all open job postings
    pub async fn fetch_jobs(&self) -> Result<Vec<Job>> {
        self.get("/jobs/").await
    }

    /// Fetch a single job posting
    pub async fn fetch_job(&self, id: i64) -> Result<Job> {
        self.get(&format!("/jobs/{id}/")).await
    }

    /// Whether the current user has saved this job
    pub async fn is_job_saved(&self, id: i64) -> Result<bool> {
        #[derive(Deserialize)]
        struct SavedReply {
            #[serde(default)]
            is_saved: bool,
        }
        let reply: SavedReply = self.get(&format!("/jobs/{id}/is_saved/")).await?;
        Ok(reply.is_saved)
    }

    pub async fn save_job(&self, id: i64) -> Result<()> {
        self.send_unit(Method::POST, &format!("/jobs/{id}/save/"), None::<&()>)
            .await
    }

    pub async fn unsave_job(&self, id: i64) -> Result<()> {
        self.send_unit(Method::DELETE, &format!("/jobs/{id}/save/"), None::<&()>)
            .await
    }

    pub async fn apply_to_job(&self, id: i64) -> Result<()> {
        self.send_unit(Method::POST, &format!("/jobs/{id}/apply/"), None::<&()>)
            .await
    }

    /// Post a new job (recruiter)
    pub async fn create_job(&self, job: &NewJob) -> Result<()> {
        self.send_unit(Method::POST, "/jobs/create/", Some(job)).await
    }

    /// Fetch the jobs posted by the current recruiter
    pub async fn fetch_recruiter_jobs(&self) -> Result<Vec<Job>> {
        self.get("/jobs/recruiter/jobs").await
    }

    // ===== Applications =====

    /// Fetch the current seeker's applications
    pub async fn fetch_applied_jobs(&self) -> Result<Vec<Application>> {
        self.get("/jobs/applied/").await
    }

    /// Fetch the current seeker's saved jobs
    pub async fn fetch_saved_jobs(&self) -> Result<Vec<Job>> {
        self.get("/jobs/saved/").await
    }

    /// Fetch all applicants across the recruiter's postings
    pub async fn fetch_applicants(&self) -> Result<Vec<Applicant>> {
        self.get("/recruiter/applicants/").await
    }

    /// Fetch one applicant's detail
    pub async fn fetch_applicant(&self, id: i64) -> Result<Applicant> {
        self.get(&format!("/applicants/{id}/")).await
    }

    /// Move an application through the pipeline (recruiter)
    pub async fn set_application_status(&self, id: i64, status: &str) -> Result<()> {
        #[derive(Serialize)]
        struct StatusBody<'a> {
            status: &'a str,
        }
        self.send_unit(
            Method::PATCH,
            &format!("/applications/{id}/status/"),
            Some(&StatusBody { status }),
        )
        .await
    }

    // ===== Profiles =====

    pub async fn fetch_profile(&self) -> Result<Profile> {
        self.get("/profile/").await
    }

    pub async fn update_profile(&self, profile: &Profile) -> Result<()> {
        self.send_unit(Method::PUT, "/profile/", Some(profile)).await
    }

    pub async fn update_company(&self, company: &CompanyProfile) -> Result<()> {
        self.send_unit(Method::PUT, "/recruiter/company/", Some(company))
            .await
    }
}
