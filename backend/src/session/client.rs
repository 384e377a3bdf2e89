//! Client for the remote auth service
//!
//! Thin wrapper over the service's password-based REST endpoints. The app
//! delegates every account operation here; no auth protocol logic lives in
//! this codebase.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Errors an account operation can end in
#[derive(Error, Debug)]
pub enum AuthError {
    /// Auth is disabled or not configured; operations fail soft
    #[error("authentication is not available")]
    Disabled,

    /// The network call could not be completed
    #[error("auth request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote service answered with a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },
}

/// A signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
}

/// An access session as issued by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
}

/// Result of a sign-up call: the service either opens a session right away
/// or parks the account until the email is confirmed
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignUpOutcome {
    SignedIn { session: Session },
    ConfirmationRequired { user: User },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpBody {
    Session(Session),
    User(User),
}

#[derive(Debug, Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

/// Thin wrapper around the auth service's HTTP API
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
}

impl AuthClient {
    pub fn new(base_url: Url, anon_key: String) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .user_agent("FileFlexer/1.0")
            .build()?;

        Ok(Self {
            http,
            base_url,
            anon_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/auth/v1/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path
        )
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        debug!("Signing up {}", email);
        let response = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.anon_key)
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let outcome = match response.json::<SignUpBody>().await? {
            SignUpBody::Session(session) => SignUpOutcome::SignedIn { session },
            SignUpBody::User(user) => SignUpOutcome::ConfirmationRequired { user },
        };
        Ok(outcome)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        debug!("Signing in {}", email);
        let response = self
            .http
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json::<Session>().await?)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(())
    }

    pub async fn recover(&self, email: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.endpoint("recover"))
            .header("apikey", &self.anon_key)
            .json(&RecoverRequest { email })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(())
    }
}

/// Map a non-success response to an [`AuthError::Api`], preferring the
/// service's own error text over the bare status line
async fn api_error(response: reqwest::Response) -> AuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    AuthError::Api {
        status: status.as_u16(),
        message: error_message(&status.to_string(), &body),
    }
}

fn error_message(status_line: &str, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        msg: Option<String>,
        #[serde(default)]
        error_description: Option<String>,
        #[serde(default)]
        error: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.msg.or(b.error_description).or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| status_line.to_string())
}
