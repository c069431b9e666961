use crate::service::{AppError, ServiceResult};
use db::models::complaint;
use rand::{Rng, distr::Alphanumeric};
use sea_orm::ConnectionTrait;

pub const CODE_LENGTH: usize = 10;
pub const MAX_ATTEMPTS: usize = 10;

/// Ten random characters from `[A-Za-z0-9]`.
pub fn random_code() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(CODE_LENGTH)
        .map(char::from)
        .collect()
}

/// Draws candidates from `next` until one is unused, giving up after [`MAX_ATTEMPTS`].
pub async fn generate<C, G>(db: &C, mut next: G) -> ServiceResult<String>
where
    C: ConnectionTrait,
    G: FnMut() -> String,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = next();
        if !complaint::Model::code_exists(db, &candidate).await? {
            return Ok(candidate);
        }
        tracing::debug!(attempt, "Complaint code collision, retrying");
    }
    tracing::warn!("Exhausted complaint code attempts");
    Err(AppError::Conflict(
        "Could not generate a unique complaint code, please try again".into(),
    ))
}
