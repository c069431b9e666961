use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use util::filters::Pagination;
use validator::{Validate, ValidationErrors};

/// Every failure a service can report. The HTTP layer maps each variant to a status code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Illegal lifecycle transition or a missing field the current state requires.
    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                AppError::Conflict(format!("Duplicate value: {detail}"))
            }
            _ => match err {
                DbErr::RecordNotFound(msg) => AppError::NotFound(msg),
                other => AppError::Database(other),
            },
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(format_validation_errors(&errors))
    }
}

pub type ServiceResult<T> = Result<T, AppError>;

/// Flattens validator output into `"field: message; field: message"`.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: invalid value"),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

pub fn validate(input: &impl Validate) -> ServiceResult<()> {
    input.validate().map_err(AppError::from)
}

/// Paged listing envelope shared by every list operation.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            data,
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages: pagination.total_pages(total),
        }
    }

    /// Slices an already filtered and sorted list.
    pub fn from_slice(items: Vec<T>, pagination: Pagination) -> Self {
        let total = items.len() as u64;
        let data = items
            .into_iter()
            .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
            .take(pagination.limit as usize)
            .collect();
        Self::new(data, total, pagination)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

/// Deserializes a field that distinguishes "absent" (`None`) from "explicit null"
/// (`Some(None)`). Pair with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_pages_in_memory() {
        let page = Paginated::from_slice((1..=7).collect::<Vec<_>>(), Pagination::new(Some(2), Some(3), 10));
        assert_eq!(page.data, vec![4, 5, 6]);
        assert_eq!(page.total, 7);
        assert_eq!(page.total_pages, 3);

        let beyond = Paginated::from_slice(vec![1, 2], Pagination::new(Some(u64::MAX), Some(100), 10));
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.total, 2);
    }

    #[test]
    fn record_not_found_maps_to_not_found() {
        let err = AppError::from(DbErr::RecordNotFound("Complaint not found".into()));
        assert!(matches!(err, AppError::NotFound(m) if m == "Complaint not found"));
    }
}
