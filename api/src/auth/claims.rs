use db::models::user::RoleType;
use serde::{Deserialize, Serialize};
use services::policy::Actor;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub role: RoleType,
    pub exp: usize,
}

/// The caller as resolved by the auth guards, available to handlers via
/// `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub actor: Actor,
}
