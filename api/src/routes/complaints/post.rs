use crate::auth::AuthUser;
use crate::response::{ApiResponse, ApiResult};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use services::complaint::{ComplaintService, CreateComplaint};
use util::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResponseRequest {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// POST /complaints
///
/// ### Request Body
/// ```json
/// {
///   "title": "Projector broken",
///   "description": "Room 2-27 projector does not turn on",
///   "complaintTypeId": 1,
///   "courseId": 4,
///   "isPublic": true,
///   "isAnonymous": false
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the new complaint, including its unique code
/// - `400 Bad Request` (validation failure, or a course is required for this type)
/// - `403 Forbidden` (caller is not a student)
/// - `404 Not Found` (unknown complaint type or course)
pub async fn create_complaint(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateComplaint>,
) -> ApiResult<impl IntoResponse> {
    let view = ComplaintService::create(state.db(), &user.actor, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(view, "Complaint created successfully")),
    ))
}

/// POST /complaints/{id}/student-response
///
/// The owning student's reply to the latest staff response.
///
/// ```json
/// { "response": "It is still broken this morning" }
/// ```
pub async fn student_reply(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<ResponseRequest>,
) -> ApiResult<impl IntoResponse> {
    let view = ComplaintService::student_reply(state.db(), &user.actor, id, &req.response).await?;
    Ok(Json(ApiResponse::success(view, "Reply submitted")))
}

/// POST /complaints/{id}/respond
///
/// ```json
/// { "response": "A technician is on the way" }
/// ```
///
/// ### Responses
/// - `200 OK` with the complaint, now `answered`
/// - `400 Bad Request` if the complaint is closed or the student has not replied to the
///   previous response
pub async fn respond(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<ResponseRequest>,
) -> ApiResult<impl IntoResponse> {
    let view = ComplaintService::respond(state.db(), &user.actor, id, &req.response).await?;
    Ok(Json(ApiResponse::success(view, "Response submitted")))
}

/// POST /complaints/{id}/reject
///
/// ```json
/// { "reason": "Duplicate of AB12cd34EF" }
/// ```
pub async fn reject(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<RejectRequest>,
) -> ApiResult<impl IntoResponse> {
    let view = ComplaintService::reject(state.db(), &user.actor, id, &req.reason).await?;
    Ok(Json(ApiResponse::success(view, "Complaint rejected")))
}

pub async fn complete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let view = ComplaintService::complete(state.db(), &user.actor, id).await?;
    Ok(Json(ApiResponse::success(view, "Complaint completed")))
}
