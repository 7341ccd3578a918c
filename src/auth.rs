//! Request identity.
//!
//! Authentication itself lives in a fronting proxy; it forwards the verified
//! identity as headers. The extractor only parses them, so handlers receive
//! an explicit [`AuthenticatedUser`] instead of reading ambient state.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::ServiceError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_PHONE_HEADER: &str = "x-user-phone";

/// Identity of the caller as asserted by the auth proxy.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_str = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let id = header_str(USER_ID_HEADER)
            .ok_or_else(|| ServiceError::Unauthorized("missing user identity".to_string()))?;
        let id = Uuid::parse_str(&id)
            .map_err(|_| ServiceError::Unauthorized("malformed user identity".to_string()))?;

        Ok(AuthenticatedUser {
            id,
            email: header_str(USER_EMAIL_HEADER),
            phone: header_str(USER_PHONE_HEADER),
        })
    }
}
