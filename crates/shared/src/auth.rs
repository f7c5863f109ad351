//! Authentication types for access tokens.
//!
//! Access tokens are minted by the hosted auth service. The claims carry the
//! user identity only; organization and role come from the user's profile row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UserId;

/// JWT claims of an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Database role the token runs as (`authenticated`).
    pub role: String,
    /// Audience.
    pub aud: String,
    /// Email of the signed-in user, when the auth service includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates claims for an `authenticated` user.
    #[must_use]
    pub fn new(user_id: Uuid, audience: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role: "authenticated".to_string(),
            aud: audience.to_string(),
            email: None,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }

    /// JSON document stored in `request.jwt.claims` for row-level security.
    #[must_use]
    pub fn to_rls_json(&self) -> String {
        serde_json::json!({
            "sub": self.sub,
            "role": self.role,
        })
        .to_string()
    }
}
