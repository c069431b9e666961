use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DeriveActiveEnum};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A complaint filed by a student. `unique_code` is the public lookup key.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "complaints")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub unique_code: String,
    pub title: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub student_id: i64,
    pub complaint_type_id: i64,
    pub course_id: Option<i64>,
    pub handled_by_personnel_id: Option<i64>,
    /// At most one of `completed_by_personnel_id` / `completed_by_user_id` is set.
    pub completed_by_personnel_id: Option<i64>,
    pub completed_by_user_id: Option<i64>,
    pub is_public: bool,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "complaint_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ComplaintStatus {
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "answered")]
    Answered,

    #[sea_orm(string_value = "rejected")]
    Rejected,

    #[sea_orm(string_value = "completed")]
    Completed,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::Answered => "answered",
            ComplaintStatus::Rejected => "rejected",
            ComplaintStatus::Completed => "completed",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id",
        on_delete = "Cascade"
    )]
    Student,

    #[sea_orm(
        belongs_to = "super::complaint_type::Entity",
        from = "Column::ComplaintTypeId",
        to = "super::complaint_type::Column::Id"
    )]
    ComplaintType,

    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "SetNull"
    )]
    Course,

    #[sea_orm(
        belongs_to = "super::personnel::Entity",
        from = "Column::HandledByPersonnelId",
        to = "super::personnel::Column::Id",
        on_delete = "SetNull"
    )]
    HandledBy,

    #[sea_orm(
        belongs_to = "super::personnel::Entity",
        from = "Column::CompletedByPersonnelId",
        to = "super::personnel::Column::Id",
        on_delete = "SetNull"
    )]
    CompletedByPersonnel,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CompletedByUserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    CompletedByUser,

    #[sea_orm(has_many = "super::complaint_response::Entity")]
    Responses,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::complaint_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ComplaintType.def()
    }
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::complaint_response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Completed or rejected by status, or carrying a completion stamp.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ComplaintStatus::Completed | ComplaintStatus::Rejected
        ) || self.is_completed()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_by_personnel_id.is_some() || self.completed_by_user_id.is_some()
    }

    pub async fn find_by_code<C: ConnectionTrait>(
        db: &C,
        code: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::UniqueCode.eq(code))
            .one(db)
            .await
    }

    pub async fn code_exists<C: ConnectionTrait>(db: &C, code: &str) -> Result<bool, DbErr> {
        Ok(Entity::find()
            .filter(Column::UniqueCode.eq(code))
            .count(db)
            .await?
            > 0)
    }
}
