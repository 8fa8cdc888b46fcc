//! Authenticated caller identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The caller behind a verified credential.
///
/// Identities are never persisted; one is derived per request and dropped
/// with it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
}

impl Identity {
    pub fn new(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }

    /// Whether this identity owns a resource recorded under `owner_user_id`.
    pub fn owns(&self, owner_user_id: i64) -> bool {
        self.user_id == owner_user_id
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.username, self.user_id)
    }
}
