// ABOUTME: The demo authentication session stored alongside the record collections.
// ABOUTME: Sessions carry a fixed demo user id and the identifier used to sign in.

use serde::{Deserialize, Serialize};

use crate::ids::Timestamp;

/// User id assigned to every demo session.
pub const DEMO_USER_ID: &str = "user_demo";

/// An active sign-in. At most one exists at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub identifier: String,
    pub signed_in_at: Timestamp,
}

impl Session {
    /// Create a demo session for the given identifier, stamped with `at`.
    pub fn demo(identifier: impl Into<String>, at: Timestamp) -> Self {
        Self {
            user_id: DEMO_USER_ID.to_string(),
            identifier: identifier.into(),
            signed_in_at: at,
        }
    }
}
