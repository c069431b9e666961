pub mod claims;
pub mod extractors;
pub mod guards;
pub mod middleware;

pub use claims::{AuthUser, Claims};

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use db::models::user::RoleType;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use services::service::AppError;
use util::config;

/// Name of the httpOnly session cookie carrying the JWT.
pub const AUTH_COOKIE: &str = "access_token";

/// Generates a JWT and its expiry timestamp for a given user.
pub fn generate_jwt(
    user_id: i64,
    email: &str,
    role: RoleType,
) -> Result<(String, String), AppError> {
    let expiry = Utc::now() + Duration::minutes(config::jwt_duration_minutes() as i64);
    let claims = Claims {
        sub: user_id,
        email: email.to_owned(),
        role,
        exp: expiry.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token encoding failed: {e}")))?;

    Ok((token, expiry.to_rfc3339()))
}

/// Verifies signature and expiry. Any failure is `Unauthenticated`.
pub fn decode_jwt(token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config::jwt_secret().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected token");
        AppError::Unauthenticated
    })
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config::cookie_secure())
        .build()
}

/// Same name and attributes as [`session_cookie`], with `Max-Age=0` and a past expiry.
pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = session_cookie(String::new());
    cookie.make_removal();
    cookie
}
