use crate::auth::AuthUser;
use crate::response::{ApiResponse, ApiResult};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use services::user::{UserQuery, UserService};
use util::state::AppState;

/// GET /users
///
/// Paginated account listing, newest first.
///
/// ### Query Parameters
/// - `page` (default 1), `limit` (default 10, max 100)
/// - `search`: matches first name, last name or email
/// - `role`: `student`, `personnel` or `admin`
///
/// ### Response
/// ```json
/// {
///   "success": true,
///   "data": {
///     "data": [
///       {
///         "id": 3,
///         "first_name": "Carol",
///         "last_name": "Nkosi",
///         "email": "carol@uni.test",
///         "role_type": "personnel",
///         "photo_url": null,
///         "profile": { "kind": "personnel", "employee_number": "EMP-0003", ... }
///       }
///     ],
///     "total": 1,
///     "page": 1,
///     "limit": 10,
///     "total_pages": 1
///   },
///   "message": "Users retrieved successfully"
/// }
/// ```
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<UserQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = UserService::list_users(state.db(), &user.actor, &query).await?;
    Ok(Json(ApiResponse::success(page, "Users retrieved successfully")))
}

/// GET /users/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let view = UserService::get_user(state.db(), &user.actor, user_id).await?;
    Ok(Json(ApiResponse::success(view, "User retrieved successfully")))
}
