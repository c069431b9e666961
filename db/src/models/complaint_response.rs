use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryOrder, Set};

/// One exchange in a complaint thread: a staff message, later answered in place by
/// the student.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "complaint_responses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub complaint_id: i64,
    pub personnel_response: Option<String>,
    pub student_response: Option<String>,
    pub responded_by_personnel_id: Option<i64>,
    pub responded_by_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::complaint::Entity",
        from = "Column::ComplaintId",
        to = "super::complaint::Column::Id",
        on_delete = "Cascade"
    )]
    Complaint,

    #[sea_orm(
        belongs_to = "super::personnel::Entity",
        from = "Column::RespondedByPersonnelId",
        to = "super::personnel::Column::Id",
        on_delete = "SetNull"
    )]
    RespondedByPersonnel,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RespondedByUserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    RespondedByUser,
}

impl Related<super::complaint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Complaint.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Who wrote a staff message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Responder {
    Personnel(i64),
    /// An admin, referenced by user id.
    User(i64),
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl Model {
    pub async fn create_staff<C: ConnectionTrait>(
        db: &C,
        complaint_id: i64,
        message: &str,
        responder: Responder,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let (personnel_id, user_id) = match responder {
            Responder::Personnel(id) => (Some(id), None),
            Responder::User(id) => (None, Some(id)),
        };
        ActiveModel {
            complaint_id: Set(complaint_id),
            personnel_response: Set(Some(message.to_owned())),
            student_response: Set(None),
            responded_by_personnel_id: Set(personnel_id),
            responded_by_user_id: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Most recent row carrying a staff message for the complaint.
    ///
    /// This is the single lookup behind "awaiting a student reply" and "student
    /// replied, staff must re-engage"; every caller goes through it.
    pub async fn latest_personnel_response<C: ConnectionTrait>(
        db: &C,
        complaint_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::ComplaintId.eq(complaint_id))
            .filter(Column::PersonnelResponse.is_not_null())
            .filter(Column::PersonnelResponse.ne(""))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .one(db)
            .await
    }

    /// In-memory counterpart of [`Model::latest_personnel_response`] for an
    /// already-loaded thread.
    pub fn latest_personnel_in(thread: &[Model]) -> Option<&Model> {
        thread
            .iter()
            .filter(|r| has_text(&r.personnel_response))
            .max_by_key(|r| (r.created_at, r.id))
    }

    pub fn has_student_reply(&self) -> bool {
        has_text(&self.student_response)
    }

    pub fn awaits_student_reply(&self) -> bool {
        has_text(&self.personnel_response) && !self.has_student_reply()
    }

    pub async fn thread<C: ConnectionTrait>(
        db: &C,
        complaint_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ComplaintId.eq(complaint_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}
