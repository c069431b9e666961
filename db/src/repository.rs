use crate::filter_utils::{FilterUtils, QueryUtils, SortUtils};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Select,
};
use std::marker::PhantomData;
use std::str::FromStr;
use util::filters::{FilterParam, MAX_PAGE, QueryParam};

/// Generic repository over any SeaORM entity.
///
/// Every call takes the connection explicitly so the same code runs against the
/// pool or inside a `DatabaseTransaction`.
pub struct Repository<E, C>
where
    E: EntityTrait,
    C: ColumnTrait + FromStr,
{
    _phantom: PhantomData<(E, C)>,
}

fn resolve<C>(column_name: &str) -> Result<C, DbErr>
where
    C: FromStr,
    C::Err: std::fmt::Display,
{
    C::from_str(column_name)
        .map_err(|e| DbErr::Custom(format!("Invalid column name '{}': {}", column_name, e)))
}

impl<E, C> Repository<E, C>
where
    E: EntityTrait,
    E::Model: Sync + Send,
    C: ColumnTrait + FromStr,
    C::Err: std::fmt::Display,
{
    pub fn apply_filter(
        query: Select<E>,
        filter_params: &[FilterParam],
    ) -> Result<Select<E>, DbErr> {
        let condition = FilterUtils::apply_all_filters(filter_params, resolve::<C>)?;
        Ok(query.filter(condition))
    }

    pub fn apply_query(query: Select<E>, query_params: &[QueryParam]) -> Result<Select<E>, DbErr> {
        let condition = QueryUtils::apply_all_queries(query_params, resolve::<C>)?;
        Ok(query.filter(condition))
    }

    pub fn apply_sorting(query: Select<E>, sort_by: Option<String>) -> Result<Select<E>, DbErr> {
        SortUtils::apply_sorting(query, sort_by, resolve::<C>)
    }

    /// Filtered, searched and sorted `SELECT` ready for further refinement.
    pub fn select(
        filter_params: &[FilterParam],
        query_params: &[QueryParam],
        sort_by: Option<String>,
    ) -> Result<Select<E>, DbErr> {
        let query = Self::apply_filter(E::find(), filter_params)?;
        let query = Self::apply_query(query, query_params)?;
        Self::apply_sorting(query, sort_by)
    }

    pub async fn find_all<D: ConnectionTrait>(
        db: &D,
        filter_params: &[FilterParam],
        query_params: &[QueryParam],
        sort_by: Option<String>,
    ) -> Result<Vec<E::Model>, DbErr> {
        Self::select(filter_params, query_params, sort_by)?
            .all(db)
            .await
    }

    /// One page of results plus the total number of matching rows. `page` is one-based.
    pub async fn filter<D: ConnectionTrait>(
        db: &D,
        filter_params: &[FilterParam],
        query_params: &[QueryParam],
        page: u64,
        per_page: u64,
        sort_by: Option<String>,
    ) -> Result<(Vec<E::Model>, u64), DbErr> {
        let query = Self::select(filter_params, query_params, sort_by)?;
        let paginator = query.paginate(db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.clamp(1, MAX_PAGE) - 1).await?;
        Ok((items, total))
    }

    pub async fn count<D: ConnectionTrait>(
        db: &D,
        filter_params: &[FilterParam],
        query_params: &[QueryParam],
    ) -> Result<u64, DbErr> {
        Self::select(filter_params, query_params, None)?
            .count(db)
            .await
    }
}
