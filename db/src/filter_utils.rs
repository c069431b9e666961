use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, DbErr, EntityTrait, QueryOrder, Select};
use util::filters::{CompareOp, FilterParam, FilterValue, QueryParam};

fn single<T: Clone>(values: &[T], op: CompareOp) -> Result<T, DbErr> {
    match values {
        [v] => Ok(v.clone()),
        _ => Err(DbErr::Custom(format!(
            "Operator {:?} requires exactly one value, got {}",
            op,
            values.len()
        ))),
    }
}

fn lower_like<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", needle.to_lowercase());
    Expr::expr(Func::lower(Expr::col(column.as_column_ref()))).like(pattern)
}

pub struct FilterUtils;

impl FilterUtils {
    /// Builds the expression for a single filter against a resolved column.
    pub fn filter_expr<C>(column: C, filter_param: &FilterParam) -> Result<SimpleExpr, DbErr>
    where
        C: ColumnTrait,
    {
        let op = filter_param.operator;
        if op == CompareOp::IsNull {
            return Ok(column.is_null());
        }

        let expr = match (&filter_param.value, op) {
            (value, _) if value.is_empty() => {
                return Err(DbErr::Custom(format!(
                    "Filter on '{}' has no values",
                    filter_param.column
                )));
            }
            (FilterValue::String(v), CompareOp::Eq) if v.len() > 1 => column.is_in(v.clone()),
            (FilterValue::String(v), CompareOp::Ne) if v.len() > 1 => column.is_not_in(v.clone()),
            (FilterValue::Int(v), CompareOp::Eq) if v.len() > 1 => column.is_in(v.clone()),
            (FilterValue::Int(v), CompareOp::Ne) if v.len() > 1 => column.is_not_in(v.clone()),

            (FilterValue::String(v), CompareOp::Eq) => column.eq(single(v, op)?),
            (FilterValue::String(v), CompareOp::Ne) => column.ne(single(v, op)?),
            (FilterValue::Int(v), CompareOp::Eq) => column.eq(single(v, op)?),
            (FilterValue::Int(v), CompareOp::Ne) => column.ne(single(v, op)?),
            (FilterValue::Bool(v), CompareOp::Eq) => column.eq(single(v, op)?),
            (FilterValue::Bool(v), CompareOp::Ne) => column.ne(single(v, op)?),

            (value, op) => {
                return Err(DbErr::Custom(format!(
                    "Operator {:?} not supported for {:?} on '{}'",
                    op, value, filter_param.column
                )));
            }
        };

        Ok(expr)
    }

    /// AND-combines every filter, resolving column names through `column_resolver`.
    pub fn apply_all_filters<C>(
        filter_params: &[FilterParam],
        column_resolver: impl Fn(&str) -> Result<C, DbErr>,
    ) -> Result<Condition, DbErr>
    where
        C: ColumnTrait,
    {
        let mut condition = Condition::all();
        for filter_param in filter_params {
            let column = column_resolver(&filter_param.column)?;
            condition = condition.add(Self::filter_expr(column, filter_param)?);
        }
        Ok(condition)
    }
}

pub struct QueryUtils;

impl QueryUtils {
    /// Each query matches if ANY of its columns contains the text; queries are AND-ed.
    pub fn apply_all_queries<C>(
        query_params: &[QueryParam],
        column_resolver: impl Fn(&str) -> Result<C, DbErr>,
    ) -> Result<Condition, DbErr>
    where
        C: ColumnTrait,
    {
        let mut condition = Condition::all();
        for query_param in query_params {
            let needle = query_param.query.trim();
            if needle.is_empty() {
                continue;
            }
            let mut any = Condition::any();
            for column_name in &query_param.columns {
                any = any.add(lower_like(column_resolver(column_name)?, needle));
            }
            condition = condition.add(any);
        }
        Ok(condition)
    }
}

pub struct SortUtils;

impl SortUtils {
    /// `"col"` sorts ascending, `"-col"` descending. Comma-separated keys are applied in order.
    pub fn apply_sorting<E, C>(
        mut query: Select<E>,
        sort_by: Option<String>,
        column_resolver: impl Fn(&str) -> Result<C, DbErr>,
    ) -> Result<Select<E>, DbErr>
    where
        E: EntityTrait,
        C: ColumnTrait,
    {
        let Some(sort) = sort_by else {
            return Ok(query);
        };

        for key in sort.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            let (column_name, asc) = match key.strip_prefix('-') {
                Some(rest) => (rest, false),
                None => (key, true),
            };
            let column = column_resolver(column_name)?;
            query = if asc {
                query.order_by_asc(column)
            } else {
                query.order_by_desc(column)
            };
        }
        Ok(query)
    }
}
