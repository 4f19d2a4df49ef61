//! Credential verification seam
//!
//! The session manager never embeds a verification rule; it delegates to a
//! [`CredentialVerifier`], which in a real deployment would call a
//! server-side authority. The shipped [`StaticVerifier`] stands in for that
//! authority with a single configured credential pair.

use async_trait::async_trait;

use super::model::User;
use crate::Result;

/// Default demo credentials accepted by [`StaticVerifier::demo`].
pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "password";

/// Trusted source for credential checks
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Check a credential pair; returns the matching user or `None` on
    /// mismatch. An `Err` is reserved for the source itself failing.
    async fn verify(&self, email: &str, password: &str) -> Result<Option<User>>;
}

/// Verifier backed by one configured credential pair.
///
/// The user record is fixed so the same account (and its tasks) is found
/// again on the next login.
pub struct StaticVerifier {
    email: String,
    password: String,
    user: User,
}

impl StaticVerifier {
    pub fn new(email: impl Into<String>, password: impl Into<String>, user: User) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            user,
        }
    }

    /// The demo account: `demo@example.com` / `password`
    pub fn demo() -> Self {
        Self::new(
            DEMO_EMAIL,
            DEMO_PASSWORD,
            User {
                id: "user-demo".to_string(),
                name: "Demo User".to_string(),
                email: DEMO_EMAIL.to_string(),
            },
        )
    }
}

#[async_trait]
impl CredentialVerifier for StaticVerifier {
    async fn verify(&self, email: &str, password: &str) -> Result<Option<User>> {
        let matches =
            email.trim().eq_ignore_ascii_case(&self.email) && password == self.password;
        Ok(matches.then(|| self.user.clone()))
    }
}
