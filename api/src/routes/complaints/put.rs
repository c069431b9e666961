use crate::auth::AuthUser;
use crate::response::{ApiResponse, ApiResult};
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use services::complaint::{ComplaintService, UpdateComplaint};
use util::state::AppState;

/// PUT /complaints/{id}
///
/// Partial edit by the owning student while the complaint is still `pending`. Send
/// `"courseId": null` to clear the course.
pub async fn update_complaint(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateComplaint>,
) -> ApiResult<impl IntoResponse> {
    let view = ComplaintService::update(state.db(), &user.actor, id, req).await?;
    Ok(Json(ApiResponse::success(view, "Complaint updated successfully")))
}
