use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryOrder, Set};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::course::Entity")]
    Courses,

    #[sea_orm(has_many = "super::personnel::Entity")]
    Personnel,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Courses.def()
    }
}

impl Related<super::personnel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Personnel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const DEFAULT_DEPARTMENT_CODE: &str = "GEN";

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        name: &str,
        code: &str,
        description: Option<&str>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            name: Set(name.to_owned()),
            code: Set(code.to_owned()),
            description: Set(description.map(str::to_owned)),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Department assigned to personnel created without one: the lowest-id existing
    /// department, or a freshly created "General" department when none exist.
    pub async fn resolve_default<C: ConnectionTrait>(db: &C) -> Result<Model, DbErr> {
        if let Some(existing) = Entity::find().order_by_asc(Column::Id).one(db).await? {
            return Ok(existing);
        }
        Self::create(db, "General", DEFAULT_DEPARTMENT_CODE, None).await
    }
}
