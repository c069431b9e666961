use crate::auth::AuthUser;
use crate::response::{ApiResponse, ApiResult};
use crate::routes::common::FormData;
use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use services::user::{CreateUser, UserService};
use util::state::AppState;

/// POST /users
///
/// Creates an account of any role together with its role profile.
///
/// ### Multipart Fields
/// - `first_name`, `last_name`, `email`, `password` (required)
/// - `role_type`: `student` | `personnel` | `admin` (required)
/// - `phone_number` (optional)
/// - `photo`: JPEG, PNG, GIF or WebP (optional)
///
/// ### Responses
/// - `201 Created` with the new account
/// - `400 Bad Request` (missing field, bad email, unknown role, bad photo)
/// - `409 Conflict` (email already in use)
pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut form = FormData::read(multipart).await?;
    let input = CreateUser {
        first_name: form.required(&["first_name", "firstName"], "First name")?,
        last_name: form.required(&["last_name", "lastName"], "Last name")?,
        email: form.required(&["email"], "Email")?,
        password: form.required(&["password"], "Password")?,
        phone_number: form.text(&["phone_number", "phoneNumber"]),
        role_type: form.required(&["role_type", "roleType", "role"], "Role")?,
        photo: form.photo.take(),
    };
    let view = UserService::create_user(state.db(), &user.actor, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(view, "User created successfully")),
    ))
}
