use crate::auth::AuthUser;
use crate::response::{ApiResponse, ApiResult};
use axum::{Extension, Json, extract::State, response::IntoResponse};
use services::user::UserService;
use util::state::AppState;

/// GET /auth/me
///
/// The authenticated user's account, including the active role profile.
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": 3,
///     "first_name": "Carol",
///     "role_type": "personnel",
///     "profile": { "kind": "personnel", "employee_number": "EMP3", "department": "General", ... }
///   },
///   "message": "User data retrieved successfully"
/// }
/// ```
pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let view = UserService::me(state.db(), &user.actor).await?;
    Ok(Json(ApiResponse::success(view, "User data retrieved successfully")))
}
