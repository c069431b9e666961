use crate::auth::AuthUser;
use crate::response::{ApiResponse, ApiResult};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use services::catalog::CatalogService;
use services::complaint::{ComplaintQuery, ComplaintService};
use util::state::AppState;

/// GET /complaints/types
///
/// All complaint categories, with whether each needs a course.
pub async fn list_types(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let types = CatalogService::list_types(state.db()).await?;
    Ok(Json(ApiResponse::success(types, "Complaint types retrieved")))
}

/// GET /complaints/courses
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let courses = CatalogService::list_courses(state.db()).await?;
    Ok(Json(ApiResponse::success(courses, "Courses retrieved")))
}

/// GET /complaints/public
///
/// Public complaints, newest first. Students behind anonymous complaints are hidden.
///
/// ### Query Parameters
/// - `page` (default 1), `limit` (default 3, max 100)
/// - `search`: case-insensitive match on title or description
/// - `status`, `sortBy`, `sortOrder`
///
/// ### Response
/// ```json
/// {
///   "success": true,
///   "data": {
///     "data": [ { "id": 4, "unique_code": "aB3dE5gH7j", "student": null, ... } ],
///     "total": 1,
///     "page": 1,
///     "limit": 3,
///     "total_pages": 1
///   },
///   "message": "Public complaints retrieved"
/// }
/// ```
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<ComplaintQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = ComplaintService::public_list(state.db(), &query).await?;
    Ok(Json(ApiResponse::success(page, "Public complaints retrieved")))
}

/// GET /complaints/public/{id_or_code}
///
/// A numeric id is tried first, then the value is looked up as a unique code. Private
/// complaints answer `404`.
pub async fn get_public(
    State(state): State<AppState>,
    Path(id_or_code): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let view = ComplaintService::public_get(state.db(), &id_or_code).await?;
    Ok(Json(ApiResponse::success(view, "Complaint retrieved")))
}

/// GET /complaints/student/{user_id}
///
/// A student's own complaints. Staff may look up any student.
///
/// ### Query Parameters
/// `page`, `limit` (default 10), `status`, `search`,
/// `sortBy` ∈ {createdAt, title, status, resolvedAt}, `sortOrder` ∈ {ASC, DESC}
pub async fn list_student_complaints(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<i64>,
    Query(query): Query<ComplaintQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = ComplaintService::list_for_student(state.db(), &user.actor, user_id, &query).await?;
    Ok(Json(ApiResponse::success(page, "Complaints retrieved")))
}

pub async fn get_complaint(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let view = ComplaintService::get(state.db(), &user.actor, id).await?;
    Ok(Json(ApiResponse::success(view, "Complaint retrieved")))
}

pub async fn get_complaint_by_code(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(code): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let view = ComplaintService::get_by_code(state.db(), &user.actor, &code).await?;
    Ok(Json(ApiResponse::success(view, "Complaint retrieved")))
}

/// GET /complaints/personnel/pending
///
/// Complaints awaiting staff: untouched ones and answered ones where the student has
/// replied. Accepts `complaintTypeId` on top of the usual listing parameters.
pub async fn pending_queue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ComplaintQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = ComplaintService::pending_queue(state.db(), &user.actor, &query).await?;
    Ok(Json(ApiResponse::success(page, "Pending complaints retrieved")))
}

/// GET /complaints/personnel/my-complaints
///
/// Answered or rejected complaints that are not yet completed.
pub async fn answered_queue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ComplaintQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = ComplaintService::answered_queue(state.db(), &user.actor, &query).await?;
    Ok(Json(ApiResponse::success(page, "Answered complaints retrieved")))
}

pub async fn completed_queue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ComplaintQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = ComplaintService::completed_queue(state.db(), &user.actor, &query).await?;
    Ok(Json(ApiResponse::success(page, "Completed complaints retrieved")))
}

/// GET /complaints/all
///
/// Every complaint in any state. Administrators only.
pub async fn list_all(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ComplaintQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = ComplaintService::list_all(state.db(), &user.actor, &query).await?;
    Ok(Json(ApiResponse::success(page, "Complaints retrieved")))
}
