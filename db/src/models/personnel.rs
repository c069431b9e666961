use chrono::{NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};

/// Staff role profile with a department affiliation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "personnel")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    #[sea_orm(unique)]
    pub employee_number: String,
    pub position: String,
    pub department_id: i64,
    pub hire_date: NaiveDate,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const DEFAULT_POSITION: &str = "Personnel";

impl Model {
    pub fn employee_number_for(user_id: i64) -> String {
        format!("EMP{user_id}")
    }

    pub async fn create_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        department_id: i64,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            user_id: Set(user_id),
            employee_number: Set(Self::employee_number_for(user_id)),
            position: Set(DEFAULT_POSITION.to_owned()),
            department_id: Set(department_id),
            hire_date: Set(Utc::now().date_naive()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_by_user<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await
    }
}
