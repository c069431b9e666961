use chrono::{Datelike, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};

/// Student role profile. `student_number` is derived from the owning user id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    #[sea_orm(unique)]
    pub student_number: String,
    pub enrollment_year: i32,
    pub current_year: i32,
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

    #[sea_orm(has_many = "super::complaint::Entity")]
    Complaints,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::complaint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Complaints.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn student_number_for(user_id: i64) -> String {
        format!("STU{user_id}")
    }

    /// Creates the profile with generated defaults: enrolled this year, first year of study.
    pub async fn create_for_user<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Model, DbErr> {
        ActiveModel {
            user_id: Set(user_id),
            student_number: Set(Self::student_number_for(user_id)),
            enrollment_year: Set(Utc::now().year()),
            current_year: Set(1),
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
