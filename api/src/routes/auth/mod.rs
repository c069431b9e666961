//! # auth Routes Module
//!
//! Routes for the `/auth` endpoint group.
//!
//! ## Structure
//! - `post.rs` — register, login, logout
//! - `get.rs` — current user
//! - `put.rs` — own profile update

pub mod get;
pub mod post;
pub mod put;

use crate::auth::guards::allow_authenticated;
use crate::routes::common::upload_body_limit;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use util::state::AppState;

/// Builds the `/auth` route group.
///
/// - `POST /auth/register` → `register`
/// - `POST /auth/login` → `login`
/// - `POST /auth/logout` → `logout`
/// - `GET /auth/me` → `get_me` (authenticated)
/// - `PUT /auth/profile` → `update_profile` (authenticated, multipart)
pub fn auth_routes(app_state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(get::get_me))
        .route(
            "/profile",
            put(put::update_profile).layer(DefaultBodyLimit::max(upload_body_limit())),
        )
        .route_layer(from_fn_with_state(app_state, allow_authenticated));

    Router::new()
        .route("/register", post(post::register))
        .route("/login", post(post::login))
        .route("/logout", post(post::logout))
        .merge(protected)
}
