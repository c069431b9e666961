use crate::auth::claims::AuthUser;
use crate::auth::extractors::Credential;
use crate::response::{ApiError, ApiResult};
use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use services::policy::{self, Action, Target};
use services::service::AppError;
use services::user::UserService;
use util::state::AppState;

/// Resolves the request's credential to a live account and inserts [`AuthUser`] into the
/// request extensions.
async fn extract_and_insert_authuser(
    state: &AppState,
    req: Request<Body>,
) -> ApiResult<(Request<Body>, AuthUser)> {
    let (mut parts, body) = req.into_parts();
    let credential = Credential::from_request_parts(&mut parts, state).await?;
    let (user, actor) =
        UserService::resolve_actor(state.db(), credential.user_id(), credential.role()).await?;

    let auth = AuthUser {
        user_id: user.id,
        actor,
    };
    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(auth.clone());
    Ok((req, auth))
}

/// Basic guard to ensure the request is authenticated.
pub async fn allow_authenticated(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let (req, _user) = extract_and_insert_authuser(&state, req).await?;
    Ok(next.run(req).await)
}

/// Personnel or admin.
pub async fn allow_staff(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let (req, user) = extract_and_insert_authuser(&state, req).await?;
    if !policy::can(Some(&user.actor), Action::ListStaffQueues, Target::None) {
        return Err(AppError::Forbidden("Personnel or administrator access required".into()).into());
    }
    Ok(next.run(req).await)
}

/// Admin-only guard.
pub async fn allow_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let (req, user) = extract_and_insert_authuser(&state, req).await?;
    if !policy::can(Some(&user.actor), Action::ManageUsers, Target::None) {
        return Err(AppError::Forbidden("Admin access required".into()).into());
    }
    Ok(next.run(req).await)
}
