use crate::auth::AuthUser;
use crate::response::{ApiResponse, ApiResult, Empty};
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use services::user::UserService;
use util::state::AppState;

/// DELETE /users/{user_id}
///
/// Removes the account, its role profile and stored photo. Admins cannot delete
/// themselves (`403`).
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    UserService::delete_user(state.db(), &user.actor, user_id).await?;
    Ok(Json(ApiResponse::success(Empty::default(), "User deleted successfully")))
}
