//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → health check (public)
//! - `/auth` → registration, login, session and own profile
//! - `/complaints` → catalog, public exposure view, student and staff complaint workflow
//! - `/users` → account management (admin-only)

use crate::auth::guards::allow_admin;
use crate::routes::{
    auth::auth_routes, complaints::complaints_routes, health::health_routes,
    users::users_routes,
};
use axum::{Router, middleware::from_fn_with_state};
use util::state::AppState;

pub mod auth;
pub mod common;
pub mod complaints;
pub mod health;
pub mod users;

/// Builds the complete application router for all HTTP endpoints, with state applied.
///
/// Access control is layered per group; finer-grained ownership and lifecycle rules are
/// enforced by the services the handlers call.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes(app_state.clone()))
        .nest("/complaints", complaints_routes(app_state.clone()))
        .nest(
            "/users",
            users_routes().route_layer(from_fn_with_state(app_state.clone(), allow_admin)),
        )
        .with_state(app_state)
}
