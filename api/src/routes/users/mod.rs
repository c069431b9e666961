//! # Users Routes Module
//!
//! Routes for the `/users` endpoint group. Account administration only: the whole
//! group is nested behind `allow_admin` in `routes::routes`.
//!
//! ## Structure
//! - `get.rs` — list and fetch accounts
//! - `post.rs` — create an account (multipart, optional photo)
//! - `put.rs` — edit an account, including role changes (multipart)
//! - `delete.rs` — delete an account

use crate::routes::common::upload_body_limit;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::get,
};
use util::state::AppState;

pub mod delete;
pub mod get;
pub mod post;
pub mod put;

/// Builds the `/users` route group.
///
/// - `GET /users` → `list_users`
/// - `POST /users` → `create_user`
/// - `GET /users/{user_id}` → `get_user`
/// - `PUT /users/{user_id}` → `update_user`
/// - `DELETE /users/{user_id}` → `delete_user`
pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_users).post(post::create_user))
        .route(
            "/{user_id}",
            get(get::get_user)
                .put(put::update_user)
                .delete(delete::delete_user),
        )
        .layer(DefaultBodyLimit::max(upload_body_limit()))
}
