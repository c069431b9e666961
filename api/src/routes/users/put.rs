use crate::auth::AuthUser;
use crate::response::{ApiResponse, ApiResult};
use crate::routes::common::FormData;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use services::user::{UpdateUser, UserService};
use util::state::AppState;

/// PUT /users/{user_id}
///
/// Partial multipart edit. Any of `first_name`, `last_name`, `email`, `password`,
/// `phone_number` (empty clears it), `role_type`, `photo`, `remove_photo`.
///
/// Changing `role_type` replaces the role profile. The old profile's records are
/// detached first: a student's complaints are deleted, a staff member's handled and
/// completed complaints keep the account reference but lose the profile one.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut form = FormData::read(multipart).await?;
    let input = UpdateUser {
        first_name: form.text(&["first_name", "firstName"]),
        last_name: form.text(&["last_name", "lastName"]),
        email: form.text(&["email"]),
        password: form.text(&["password"]),
        phone_number: form.present(&["phone_number", "phoneNumber"]),
        role_type: form.text(&["role_type", "roleType", "role"]),
        photo: form.photo.take(),
        remove_photo: form.flag(&["remove_photo", "removePhoto"]),
    };
    let view = UserService::update_user(state.db(), &user.actor, user_id, input).await?;
    Ok(Json(ApiResponse::success(view, "User updated successfully")))
}
