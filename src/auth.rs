//! Authentication collaborator.
//!
//! Email/password sign-in and sign-up against a Supabase (GoTrue) auth
//! service, plus a session-or-null subscription that front ends use to
//! react to logins and logouts.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("regionlore/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("email and password are required")]
    MissingCredentials,
    #[error("failed to reach auth service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid auth endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error("malformed auth response: {0}")]
    MalformedResponse(String),
}

/// Email and password, both non-empty
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Result<Self, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of a sign-up request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The service signed the user in straight away
    SignedIn(Session),
    /// A confirmation mail was sent; the user must confirm before signing in
    ConfirmationPending { email: String },
}

/// An email/password auth backend.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError>;
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError>;
}

/// Token payload shared by the sign-in and (auto-confirmed) sign-up endpoints.
/// A sign-up awaiting confirmation returns the bare user instead.
#[derive(Deserialize, Debug)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self, issued_at: DateTime<Utc>) -> Result<Session, AuthError> {
        let missing = |field: &str| AuthError::MalformedResponse(format!("missing {}", field));
        Ok(Session {
            access_token: self.access_token.ok_or_else(|| missing("access_token"))?,
            refresh_token: self.refresh_token.ok_or_else(|| missing("refresh_token"))?,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at: issued_at + Duration::seconds(self.expires_in.unwrap_or(3600)),
            user: self.user.ok_or_else(|| missing("user"))?,
        })
    }
}

/// The first message-like field of an auth error body, else the status text.
fn rejection_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| value.get(key)?.as_str().map(str::to_string))
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string())
        })
}

/// Supabase auth REST client
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    http: Client,
    token_url: Url,
    signup_url: Url,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, AuthError> {
        let base = base_url.trim_end_matches('/');
        let token_url = Url::parse_with_params(
            &format!("{}/auth/v1/token", base),
            &[("grant_type", "password")],
        )
        .map_err(|e| AuthError::InvalidEndpoint(format!("{}: {}", base, e)))?;
        let signup_url = Url::parse(&format!("{}/auth/v1/signup", base))
            .map_err(|e| AuthError::InvalidEndpoint(format!("{}: {}", base, e)))?;

        Ok(Self {
            http: Client::builder().user_agent(USER_AGENT).build()?,
            token_url,
            signup_url,
            anon_key: anon_key.to_string(),
        })
    }

    async fn post(&self, url: &Url, credentials: &Credentials) -> Result<TokenResponse, AuthError> {
        let response = self
            .http
            .post(url.clone())
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({
                "email": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = rejection_message(status, &body);
            warn!(status = status.as_u16(), %message, "auth request rejected");
            return Err(AuthError::Rejected { status, message });
        }

        serde_json::from_slice(&body).map_err(|e| AuthError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let issued_at = Utc::now();
        self.post(&self.token_url, credentials)
            .await?
            .into_session(issued_at)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let issued_at = Utc::now();
        let response = self.post(&self.signup_url, credentials).await?;
        if response.access_token.is_some() {
            return Ok(SignUpOutcome::SignedIn(response.into_session(issued_at)?));
        }
        let email = response
            .email
            .unwrap_or_else(|| credentials.email().to_string());
        Ok(SignUpOutcome::ConfirmationPending { email })
    }
}

/// Holds the current session and publishes every change to subscribers.
pub struct AuthService<P> {
    provider: P,
    state: watch::Sender<Option<Session>>,
}

impl<P: AuthProvider> AuthService<P> {
    pub fn new(provider: P) -> Self {
        let (state, _) = watch::channel(None);
        Self { provider, state }
    }

    /// Observe session-or-null changes. Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.state.subscribe(),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    /// Sign in and publish the new session. A failed attempt leaves the state alone.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let session = self.provider.sign_in(credentials).await?;
        info!(user = %session.user.id, "signed in");
        self.state.send_replace(Some(session.clone()));
        Ok(session)
    }

    pub async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let outcome = self.provider.sign_up(credentials).await?;
        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                info!(user = %session.user.id, "signed up and signed in");
                self.state.send_replace(Some(session.clone()));
            }
            SignUpOutcome::ConfirmationPending { email } => {
                info!(%email, "sign-up awaiting confirmation");
            }
        }
        Ok(outcome)
    }

    /// Forget the local session.
    pub fn sign_out(&self) {
        if self.state.send_replace(None).is_some() {
            info!("signed out");
        }
    }
}

/// A stream of session-or-null values
pub struct AuthSubscription {
    receiver: watch::Receiver<Option<Session>>,
}

impl AuthSubscription {
    /// Wait for the next change. Returns `None` once the service is gone.
    pub async fn next(&mut self) -> Option<Option<Session>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    pub fn current(&self) -> Option<Session> {
        self.receiver.borrow().clone()
    }
}
