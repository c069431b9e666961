use crate::service::ServiceResult;
use db::models::{complaint_type, course, department};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseEntry {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub department: Option<department::Model>,
}

/// Read-only reference data for the complaint form.
pub struct CatalogService;

impl CatalogService {
    pub async fn list_types(db: &DatabaseConnection) -> ServiceResult<Vec<complaint_type::Model>> {
        Ok(complaint_type::Entity::find()
            .order_by_asc(complaint_type::Column::Name)
            .all(db)
            .await?)
    }

    pub async fn list_courses(db: &DatabaseConnection) -> ServiceResult<Vec<CourseEntry>> {
        let rows = course::Entity::find()
            .find_also_related(department::Entity)
            .order_by_asc(course::Column::Code)
            .all(db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(c, department)| CourseEntry {
                id: c.id,
                name: c.name,
                code: c.code,
                department,
            })
            .collect())
    }
}
