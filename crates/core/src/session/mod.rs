//! Session module
//!
//! This module contains the authenticated-user state and the mock
//! credential verification seam.

mod manager;
mod model;
mod verifier;

pub use manager::SessionManager;
pub use model::User;
pub use verifier::{CredentialVerifier, StaticVerifier, DEMO_EMAIL, DEMO_PASSWORD};
