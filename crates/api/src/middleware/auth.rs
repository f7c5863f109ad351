//! Authentication middleware for protected routes.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use khata_core::tenancy::{AdminAction, SessionContext, TenantScope};
use khata_db::ProfileRepository;
use khata_shared::{Claims, JwtError};

use crate::{AppState, error::ApiError};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

/// Authentication middleware that validates access tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Loads the caller's profile, which carries their organization
/// 4. Stores the claims and the session in request extensions
///
/// A caller without a profile is let through; handlers that need an
/// organization reject them with `412`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return unauthorized(
            "missing_token",
            "Authorization header with Bearer token is required",
        );
    };

    let claims = match state.jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(JwtError::Expired) => return unauthorized("token_expired", "Token has expired"),
        Err(_) => return unauthorized("invalid_token", "Invalid or malformed token"),
    };

    let profile = match ProfileRepository::new(Arc::clone(&state.db))
        .find_for_claims(&claims)
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            error!(error = %e, user_id = %claims.sub, "Failed to load profile");
            return ApiError::from(e).into_response();
        }
    };

    let session = SessionContext::new(claims.user_id(), profile);
    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(session);
    next.run(request).await
}

/// Extractor for the authenticated caller.
///
/// ```ignore
/// async fn handler(auth: AuthSession) -> Result<Json<Vec<Farmer>>, ApiError> {
///     let scope = auth.scope("list farmers")?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthSession {
    claims: Claims,
    session: SessionContext,
}

impl AuthSession {
    /// Returns the validated token claims.
    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Returns the resolved session.
    #[must_use]
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Resolves the caller's organization for `action`.
    ///
    /// # Errors
    ///
    /// Returns `412` when the caller has no organization.
    pub fn scope(&self, action: &'static str) -> Result<TenantScope, ApiError> {
        Ok(self.session.scope(action)?)
    }

    /// Resolves the caller's organization for an admin-only action.
    ///
    /// # Errors
    ///
    /// Returns `412` when the caller has no organization and `403` when
    /// they are not an admin.
    pub fn require_admin(&self, action: AdminAction) -> Result<TenantScope, ApiError> {
        Ok(self.session.require_admin(action)?)
    }
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<Claims>().cloned();
        let session = parts.extensions.get::<SessionContext>().cloned();

        match (claims, session) {
            (Some(claims), Some(session)) => Ok(Self { claims, session }),
            _ => Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "unauthorized",
                    "message": "Authentication required"
                })),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
