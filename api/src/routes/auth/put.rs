use crate::auth::AuthUser;
use crate::response::{ApiResponse, ApiResult};
use crate::routes::common::FormData;
use axum::{
    Extension, Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use services::user::{UpdateProfile, UserService};
use util::state::AppState;

/// PUT /auth/profile
///
/// Multipart update of the caller's own account. Fields: `first_name`, `last_name`,
/// `phone_number` (empty clears it), `password`, `photo` (file), `remove_photo`.
/// camelCase field names are accepted too.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut form = FormData::read(multipart).await?;
    let input = UpdateProfile {
        first_name: form.text(&["first_name", "firstName"]),
        last_name: form.text(&["last_name", "lastName"]),
        phone_number: form.present(&["phone_number", "phoneNumber"]),
        password: form.text(&["password"]),
        photo: form.photo.take(),
        remove_photo: form.flag(&["remove_photo", "removePhoto"]),
    };
    let view = UserService::update_own_profile(state.db(), &user.actor, input).await?;
    Ok(Json(ApiResponse::success(view, "Profile updated successfully")))
}
