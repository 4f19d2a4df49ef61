//! User model definitions

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated account a session belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl User {
    /// Create a user with a freshly generated identifier
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
        }
    }
}
