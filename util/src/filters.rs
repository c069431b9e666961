//! Backend-agnostic query descriptions.
//!
//! Services describe *what* to filter, search and sort on with these plain values;
//! `db::filter_utils` turns them into SeaORM conditions for a concrete entity.

/// Values a filter compares against. More than one value means set membership.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(Vec<String>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    IsNull,
}

#[derive(Debug, Clone)]
pub struct FilterParam {
    pub column: String,
    pub operator: CompareOp,
    pub value: FilterValue,
}

pub trait IntoFilterValue {
    fn into_filter_value(self) -> FilterValue;
}

impl IntoFilterValue for String {
    fn into_filter_value(self) -> FilterValue {
        FilterValue::String(vec![self])
    }
}

impl IntoFilterValue for &str {
    fn into_filter_value(self) -> FilterValue {
        FilterValue::String(vec![self.to_string()])
    }
}

impl IntoFilterValue for i64 {
    fn into_filter_value(self) -> FilterValue {
        FilterValue::Int(vec![self])
    }
}

impl IntoFilterValue for bool {
    fn into_filter_value(self) -> FilterValue {
        FilterValue::Bool(vec![self])
    }
}

impl<const N: usize> IntoFilterValue for [&str; N] {
    fn into_filter_value(self) -> FilterValue {
        FilterValue::String(self.into_iter().map(str::to_string).collect())
    }
}

impl FilterValue {
    pub fn len(&self) -> usize {
        match self {
            FilterValue::String(v) => v.len(),
            FilterValue::Int(v) => v.len(),
            FilterValue::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FilterParam {
    fn new(column: &str, operator: CompareOp, value: FilterValue) -> Self {
        Self {
            column: column.to_string(),
            operator,
            value,
        }
    }

    /// Equality; a multi-valued argument becomes `IN (...)`.
    pub fn eq(column: &str, value: impl IntoFilterValue) -> Self {
        Self::new(column, CompareOp::Eq, value.into_filter_value())
    }

    /// Inequality; a multi-valued argument becomes `NOT IN (...)`.
    pub fn ne(column: &str, value: impl IntoFilterValue) -> Self {
        Self::new(column, CompareOp::Ne, value.into_filter_value())
    }

    pub fn is_null(column: &str) -> Self {
        Self::new(column, CompareOp::IsNull, FilterValue::Bool(vec![]))
    }
}

/// Free-text search: matches when `query` appears (case-insensitively) in ANY column.
#[derive(Debug, Clone)]
pub struct QueryParam {
    pub columns: Vec<String>,
    pub query: String,
}

impl QueryParam {
    pub fn new(columns: &[&str], query: impl Into<String>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            query: query.into(),
        }
    }
}

/// Sort direction as accepted on the wire (`ASC` / `DESC`, any case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("ASC") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    /// Builds the `"column"` / `"-column"` form consumed by `SortUtils`.
    pub fn apply(self, column: &str) -> String {
        match self {
            SortOrder::Asc => column.to_string(),
            SortOrder::Desc => format!("-{column}"),
        }
    }
}

/// Highest page number honoured; larger requests land on an empty page.
pub const MAX_PAGE: u64 = 1_000_000;

/// One-based page request with the limit clamped to `1..=100` and the page to `1..=MAX_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1).min(MAX_PAGE),
            limit: limit.filter(|l| *l > 0).unwrap_or(default_limit).min(100),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}
