use crate::auth::AuthUser;
use crate::response::{ApiResponse, ApiResult, Empty};
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use services::complaint::ComplaintService;
use util::state::AppState;

/// DELETE /complaints/{id}
///
/// Owner or admin, while the complaint is not closed. Its response thread goes with it.
pub async fn delete_complaint(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    ComplaintService::delete(state.db(), &user.actor, id).await?;
    Ok(Json(ApiResponse::success(Empty::default(), "Complaint deleted successfully")))
}
