//! Session provider: observable current-user state
//!
//! Wraps the remote auth client and owns the single current-user slot.
//! Presentation and the route guard read synchronous snapshots; the
//! WebSocket layer can watch for changes. All account operations delegate
//! to the remote service.

mod client;

pub use client::{AuthClient, AuthError, Session, SignUpOutcome, User};

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::config::AuthSettings;

struct SessionInner {
    /// The active session, if any; holds the access token for sign-out
    session: RwLock<Option<Session>>,

    /// Publishes the current user to watchers; new subscribers see the
    /// present value immediately
    user_tx: watch::Sender<Option<User>>,
}

/// Owner of the app's current-user state
#[derive(Clone)]
pub struct SessionProvider {
    /// None when auth is disabled or unconfigured
    client: Option<AuthClient>,
    inner: Arc<SessionInner>,
}

impl SessionProvider {
    pub fn new(settings: &AuthSettings) -> Result<Self, AuthError> {
        let client = match (&settings.url, settings.enabled) {
            (Some(url), true) => Some(AuthClient::new(url.clone(), settings.anon_key.clone())?),
            _ => {
                info!("Auth service not configured; running in single-user mode");
                None
            }
        };

        let (user_tx, _) = watch::channel(None);

        Ok(Self {
            client,
            inner: Arc::new(SessionInner {
                session: RwLock::new(None),
                user_tx,
            }),
        })
    }

    /// Whether an auth backend is configured at all
    pub fn enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Synchronous snapshot of the current user
    pub fn current_user(&self) -> Option<User> {
        self.inner.user_tx.borrow().clone()
    }

    /// Watch the current user; the receiver starts at the present value
    pub fn watch(&self) -> watch::Receiver<Option<User>> {
        self.inner.user_tx.subscribe()
    }

    /// Access token of the active session, if any
    pub fn access_token(&self) -> Option<String> {
        self.inner
            .session
            .read()
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let client = self.client.as_ref().ok_or(AuthError::Disabled)?;
        let outcome = client.sign_up(email, password).await?;

        if let SignUpOutcome::SignedIn { session } = &outcome {
            self.store_session(session.clone());
        }
        Ok(outcome)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let client = self.client.as_ref().ok_or(AuthError::Disabled)?;
        let session = client.sign_in(email, password).await?;

        info!("Signed in {}", session.user.email);
        self.store_session(session.clone());
        Ok(session)
    }

    /// Sign out: local state is cleared even when the remote call fails,
    /// so a dead auth service cannot pin a user to the session
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let client = self.client.as_ref().ok_or(AuthError::Disabled)?;
        let token = self.access_token();

        let result = match token {
            Some(token) => client.sign_out(&token).await,
            None => Ok(()),
        };

        self.clear_session();
        result
    }

    pub async fn recover(&self, email: &str) -> Result<(), AuthError> {
        let client = self.client.as_ref().ok_or(AuthError::Disabled)?;
        client.recover(email).await
    }

    fn store_session(&self, session: Session) {
        let user = session.user.clone();
        *self.inner.session.write() = Some(session);
        let _ = self.inner.user_tx.send(Some(user));
    }

    fn clear_session(&self) {
        *self.inner.session.write() = None;
        let _ = self.inner.user_tx.send(None);
    }
}
