//! Session state manager
//!
//! Owns the current authenticated user and mirrors the session to the
//! key-value store under the `token` and `user` keys. All user-visible
//! outcomes go through the [`EventSink`] hooks.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use tokio::sync::RwLock;

use crate::event::{EventSink, NavTarget, Notification};
use crate::storage::{keys, KeyValueStore};
use crate::{Error, Result};

use super::model::User;
use super::verifier::CredentialVerifier;

/// Two-state session holder: anonymous or authenticated
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    verifier: Arc<dyn CredentialVerifier>,
    sink: Arc<dyn EventSink>,
    user: Arc<RwLock<Option<User>>>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        verifier: Arc<dyn CredentialVerifier>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            verifier,
            sink,
            user: Arc::new(RwLock::new(None)),
        }
    }

    /// Restore a persisted session, if one exists.
    ///
    /// The session is restored only when both the token and the user record
    /// are present. A malformed user record is discarded together with its
    /// token; there is no failure path beyond absence.
    pub async fn initialize(&self) -> Result<Option<User>> {
        let token = self.store.get(keys::TOKEN).await?;
        let raw_user = self.store.get(keys::USER).await?;
        let (Some(_), Some(raw_user)) = (token, raw_user) else {
            return Ok(None);
        };

        match serde_json::from_str::<User>(&raw_user) {
            Ok(user) => {
                tracing::debug!("Restored session for {}", user.email);
                *self.user.write().await = Some(user.clone());
                Ok(Some(user))
            }
            Err(err) => {
                tracing::warn!("Discarding malformed user record: {}", err);
                self.store.remove(keys::TOKEN).await?;
                self.store.remove(keys::USER).await?;
                Ok(None)
            }
        }
    }

    /// Verify credentials and open a session.
    ///
    /// On mismatch the state stays anonymous, nothing is persisted, and the
    /// failure is surfaced through the sink.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let Some(user) = self.verifier.verify(email, password).await? else {
            tracing::debug!("Login rejected for {}", email);
            self.sink.notify(Notification::destructive(
                "Login Failed",
                "Invalid email or password.",
            ));
            return Err(Error::InvalidCredentials);
        };

        self.open_session(&user).await?;
        self.sink.notify(Notification::normal(
            "Login Successful",
            format!("Welcome back, {}!", user.name),
        ));
        self.sink.navigate(NavTarget::Dashboard);
        Ok(user)
    }

    /// Create a new account and open a session for it.
    ///
    /// Registration always succeeds. The password is accepted for interface
    /// parity with a real backend; the mock flow never stores it.
    pub async fn register(&self, name: &str, email: &str, _password: &str) -> Result<User> {
        let user = User::new(name.trim(), email.trim());
        self.open_session(&user).await?;
        self.sink.notify(Notification::normal(
            "Registration Successful",
            format!("Welcome, {}!", user.name),
        ));
        self.sink.navigate(NavTarget::Dashboard);
        Ok(user)
    }

    /// End the session: clears the in-memory user and removes the token,
    /// user record, and task collection from the store.
    pub async fn logout(&self) -> Result<()> {
        *self.user.write().await = None;
        self.store.remove(keys::TOKEN).await?;
        self.store.remove(keys::USER).await?;
        self.store.remove(keys::TASKS).await?;
        self.sink.notify(Notification::normal(
            "Logged Out",
            "You have been successfully logged out.",
        ));
        self.sink.navigate(NavTarget::Landing);
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    async fn open_session(&self, user: &User) -> Result<()> {
        let token = generate_session_token();
        self.store.set(keys::TOKEN, &token).await?;
        self.store
            .set(keys::USER, &serde_json::to_string(user)?)
            .await?;
        *self.user.write().await = Some(user.clone());
        tracing::info!("Session opened for {}", user.email);
        Ok(())
    }
}

fn generate_session_token() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("tv_{}", URL_SAFE_NO_PAD.encode(bytes))
}
