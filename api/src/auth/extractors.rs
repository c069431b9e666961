use crate::auth::{AUTH_COOKIE, Claims, decode_jwt};
use crate::response::ApiError;
use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use axum_extra::extract::{CookieJar, TypedHeader};
use db::models::user::RoleType;
use headers::{Authorization, authorization::Bearer};
use services::service::AppError;
use std::str::FromStr;
use util::config;

pub const LEGACY_USER_HEADER: &str = "x-user-id";
pub const LEGACY_ROLE_HEADER: &str = "x-role-type";

/// Who the request claims to be, before the claim is checked against the database.
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    Token(Claims),
    Legacy { user_id: i64, role: Option<RoleType> },
}

impl Credential {
    pub fn user_id(&self) -> i64 {
        match self {
            Credential::Token(c) => c.sub,
            Credential::Legacy { user_id, .. } => *user_id,
        }
    }

    pub fn role(&self) -> Option<RoleType> {
        match self {
            Credential::Token(c) => Some(c.role),
            Credential::Legacy { role, .. } => *role,
        }
    }
}

/// Looks for a token in the session cookie, then the `Authorization: Bearer` header.
/// Legacy id/role headers are honoured only when enabled in configuration.
///
/// # Errors
/// `Unauthenticated` if no credential is present or the token is invalid or expired.
impl<S> FromRequestParts<S> for Credential
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(AUTH_COOKIE).filter(|c| !c.value().is_empty()) {
            return Ok(Credential::Token(decode_jwt(cookie.value())?));
        }

        if let Ok(TypedHeader(Authorization(bearer))) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
        {
            return Ok(Credential::Token(decode_jwt(bearer.token())?));
        }

        if config::allow_legacy_headers() {
            if let Some(legacy) = legacy_credential(&parts.headers) {
                tracing::warn!(user_id = legacy.user_id(), "Accepted legacy identity headers");
                return Ok(legacy);
            }
        }

        Err(AppError::Unauthenticated.into())
    }
}

fn legacy_credential(headers: &HeaderMap) -> Option<Credential> {
    let user_id = headers
        .get(LEGACY_USER_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    let role = headers
        .get(LEGACY_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| RoleType::from_str(v.trim()).ok());
    Some(Credential::Legacy { user_id, role })
}
