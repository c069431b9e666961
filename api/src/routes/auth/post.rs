use crate::auth::{expired_session_cookie, generate_jwt, session_cookie};
use crate::response::{ApiResponse, ApiResult, Empty};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use services::service::validate;
use services::user::{RegisterStudent, UserService, UserView};
use util::state::AppState;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserView,
    pub token: String,
    pub expires_at: String,
}

fn start_session(jar: CookieJar, user: UserView) -> ApiResult<(CookieJar, SessionResponse)> {
    let (token, expires_at) = generate_jwt(user.id, &user.email, user.role_type)?;
    let jar = jar.add(session_cookie(token.clone()));
    Ok((
        jar,
        SessionResponse {
            user,
            token,
            expires_at,
        },
    ))
}

/// POST /auth/register
///
/// Public self-registration. Always creates a student account and signs it in.
///
/// ### Request Body
/// ```json
/// {
///   "first_name": "Ada",
///   "last_name": "Lovelace",
///   "email": "ada@uni.test",
///   "password": "secret1",
///   "phone_number": "0123456789"
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the user, token and expiry; sets the `access_token` cookie
/// - `400 Bad Request` (validation failure)
/// - `409 Conflict` (email already registered)
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterStudent>,
) -> ApiResult<impl IntoResponse> {
    let user = UserService::register(state.db(), req).await?;
    let (jar, session) = start_session(jar, user)?;
    Ok((
        StatusCode::CREATED,
        jar,
        Json(ApiResponse::success(session, "User registered successfully")),
    ))
}

/// POST /auth/login
///
/// ### Request Body
/// ```json
/// { "email": "ada@uni.test", "password": "secret1" }
/// ```
///
/// ### Responses
/// - `200 OK` with the user, token and expiry; sets the `access_token` cookie
/// - `401 Unauthorized` (unknown email or wrong password)
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    validate(&req)?;
    let user = UserService::authenticate(state.db(), &req.email, &req.password).await?;
    let view = UserService::view(state.db(), &user).await?;
    let (jar, session) = start_session(jar, view)?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok((jar, Json(ApiResponse::success(session, "Login successful"))))
}

/// POST /auth/logout
///
/// Clears the session cookie. Always succeeds, and always sends the expired cookie
/// whether or not the request carried one.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(expired_session_cookie()),
        Json(ApiResponse::success(Empty::default(), "Logged out")),
    )
}
