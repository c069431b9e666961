//! # complaints Routes Module
//!
//! Routes for the `/complaints` endpoint group.
//!
//! ## Structure
//! - `get.rs` — catalog, public exposure view, listings and single reads
//! - `post.rs` — filing and lifecycle transitions
//! - `put.rs` — owner edit
//! - `delete.rs` — removal
//!
//! ## Access
//! Catalog and `/public` routes are open. Everything else needs a session; the staff
//! queues and transitions additionally need a personnel or admin account, and the full
//! listing an admin account.

pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use crate::auth::guards::{allow_admin, allow_authenticated, allow_staff};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use util::state::AppState;

/// Builds the `/complaints` route group.
///
/// Public:
/// - `GET /complaints/types` → `list_types`
/// - `GET /complaints/courses` → `list_courses`
/// - `GET /complaints/public` → `list_public`
/// - `GET /complaints/public/{id_or_code}` → `get_public`
///
/// Authenticated:
/// - `POST /complaints` → `create_complaint` (student)
/// - `GET /complaints/student/{user_id}` → `list_student_complaints`
/// - `GET /complaints/code/{code}` → `get_complaint_by_code`
/// - `GET /complaints/{id}` → `get_complaint`
/// - `PUT /complaints/{id}` → `update_complaint` (owner, pending only)
/// - `DELETE /complaints/{id}` → `delete_complaint` (owner or admin)
/// - `POST /complaints/{id}/student-response` → `student_reply` (owner)
///
/// Staff:
/// - `GET /complaints/personnel/pending` → `pending_queue`
/// - `GET /complaints/personnel/my-complaints` → `answered_queue`
/// - `GET /complaints/personnel/completed` → `completed_queue`
/// - `POST /complaints/{id}/respond` → `respond`
/// - `POST /complaints/{id}/reject` → `reject`
/// - `POST /complaints/{id}/complete` → `complete`
///
/// Admin:
/// - `GET /complaints/all` → `list_all`
pub fn complaints_routes(app_state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/types", get(get::list_types))
        .route("/courses", get(get::list_courses))
        .route("/public", get(get::list_public))
        .route("/public/{id_or_code}", get(get::get_public));

    let authenticated = Router::new()
        .route("/", post(post::create_complaint))
        .route("/student/{user_id}", get(get::list_student_complaints))
        .route("/code/{code}", get(get::get_complaint_by_code))
        .route(
            "/{id}",
            get(get::get_complaint)
                .put(put::update_complaint)
                .delete(delete::delete_complaint),
        )
        .route("/{id}/student-response", post(post::student_reply))
        .route_layer(from_fn_with_state(app_state.clone(), allow_authenticated));

    let staff = Router::new()
        .route("/personnel/pending", get(get::pending_queue))
        .route("/personnel/my-complaints", get(get::answered_queue))
        .route("/personnel/completed", get(get::completed_queue))
        .route("/{id}/respond", post(post::respond))
        .route("/{id}/reject", post(post::reject))
        .route("/{id}/complete", post(post::complete))
        .route_layer(from_fn_with_state(app_state.clone(), allow_staff));

    let admin = Router::new()
        .route("/all", get(get::list_all))
        .route_layer(from_fn_with_state(app_state, allow_admin));

    public.merge(authenticated).merge(staff).merge(admin)
}
