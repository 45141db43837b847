//! Pre-authenticated caller identity.
//!
//! Authentication lives in front of this service; by the time a request
//! arrives the caller has been verified and their identity travels in the
//! `X-User-Id` and `X-User-Role` headers. This extractor trusts those
//! headers and performs no credential verification of its own.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use serde_json::{Value, json};
use uuid::Uuid;
use valcoin_core::rules::types::UserRole;

/// Header carrying the verified user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the verified role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The verified caller identity.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    /// Verified user id.
    pub user_id: Uuid,
    /// Verified platform role.
    pub role: UserRole,
}

impl Caller {
    /// Rejects callers that are not administrators.
    ///
    /// # Errors
    ///
    /// Returns a 403 response body for non-admin callers.
    pub fn require_admin(&self) -> Result<(), (StatusCode, Json<Value>)> {
        if self.role == UserRole::Admin {
            Ok(())
        } else {
            Err((
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "FORBIDDEN",
                    "message": "Administrator role required"
                })),
            ))
        }
    }
}

fn unauthorized(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "UNAUTHORIZED",
            "message": message
        })),
    )
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or_else(|| unauthorized("Missing or malformed X-User-Id header"))?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(UserRole::parse)
            .ok_or_else(|| unauthorized("Missing or malformed X-User-Role header"))?;

        Ok(Self { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_admin() {
        let admin = Caller {
            user_id: Uuid::now_v7(),
            role: UserRole::Admin,
        };
        assert!(admin.require_admin().is_ok());

        let professor = Caller {
            user_id: Uuid::now_v7(),
            role: UserRole::Professor,
        };
        let err = professor.require_admin().unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }
}
