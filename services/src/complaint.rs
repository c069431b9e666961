//! Complaint filing, queues and lifecycle transitions.
//!
//! Every transition runs in one transaction: load the complaint, authorize, check the
//! state machine, write side effects, then flip the status with a guarded
//! `UPDATE ... WHERE status = <seen> AND not completed`. If another request changed the
//! complaint in between, the guard matches no row and the whole unit rolls back.

use crate::lifecycle::{self, Event};
use crate::policy::{self, Action, Actor, Target};
use crate::service::{AppError, Paginated, ServiceResult, double_option, validate};
use crate::unique_code;
use crate::views::{self, Audience, ComplaintView};
use chrono::Utc;
use db::models::{
    complaint::{self, ComplaintStatus},
    complaint_response::{self, Responder},
    complaint_type, course, student,
};
use db::repository::Repository;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, info};
use util::filters::{FilterParam, Pagination, QueryParam, SortOrder};
use validator::Validate;

type ComplaintRepo = Repository<complaint::Entity, complaint::Column>;

pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_PUBLIC_LIMIT: u64 = 3;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComplaint {
    #[validate(length(min = 1, max = 200, message = "Title is required (max 200 characters)"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[serde(alias = "complaintTypeId")]
    pub complaint_type_id: i64,

    #[serde(default, alias = "courseId")]
    pub course_id: Option<i64>,

    #[serde(default, alias = "isPublic")]
    pub is_public: bool,

    #[serde(default, alias = "isAnonymous")]
    pub is_anonymous: bool,
}

/// Partial edit. `course_id: Some(None)` clears the course.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateComplaint {
    #[validate(length(min = 1, max = 200, message = "Title cannot be empty (max 200 characters)"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,

    #[serde(default, alias = "complaintTypeId")]
    pub complaint_type_id: Option<i64>,

    #[serde(default, alias = "courseId", deserialize_with = "double_option")]
    pub course_id: Option<Option<i64>>,

    #[serde(default, alias = "isPublic")]
    pub is_public: Option<bool>,

    #[serde(default, alias = "isAnonymous")]
    pub is_anonymous: Option<bool>,
}

/// Query string shared by every complaint listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplaintQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub search: Option<String>,
    #[serde(alias = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(alias = "sortOrder")]
    pub sort_order: Option<String>,
    #[serde(alias = "complaintTypeId")]
    pub complaint_type_id: Option<i64>,
}

impl ComplaintQuery {
    fn pagination(&self, default_limit: u64) -> Pagination {
        Pagination::new(self.page, self.limit, default_limit)
    }

    fn sort(&self) -> String {
        let column = match self.sort_by.as_deref().map(str::trim) {
            Some("title") => "title",
            Some("status") => "status",
            Some("resolvedAt") | Some("resolved_at") => "resolved_at",
            _ => "created_at",
        };
        let order = SortOrder::parse(self.sort_order.as_deref());
        format!("{},{}", order.apply(column), order.apply("id"))
    }

    fn search(&self) -> Vec<QueryParam> {
        match self.search.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => vec![QueryParam::new(&["title", "description"], s)],
            _ => Vec::new(),
        }
    }

    fn status(&self) -> ServiceResult<Option<ComplaintStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(raw) => ComplaintStatus::from_str(raw)
                .map(Some)
                .map_err(|_| AppError::Validation(format!("Unknown status '{raw}'"))),
        }
    }

    fn shared_filters(&self) -> ServiceResult<Vec<FilterParam>> {
        let mut filters = Vec::new();
        if let Some(status) = self.status()? {
            filters.push(FilterParam::eq("status", status.as_str()));
        }
        if let Some(type_id) = self.complaint_type_id {
            filters.push(FilterParam::eq("complaint_type_id", type_id));
        }
        Ok(filters)
    }
}

fn not_completed() -> [FilterParam; 2] {
    [
        FilterParam::is_null("completed_by_personnel_id"),
        FilterParam::is_null("completed_by_user_id"),
    ]
}

fn clean_text(raw: &str, field: &str) -> ServiceResult<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(text.to_owned())
}

fn responder(actor: &Actor) -> ServiceResult<Responder> {
    if let Some(personnel_id) = actor.personnel_id() {
        Ok(Responder::Personnel(personnel_id))
    } else if actor.is_admin() {
        Ok(Responder::User(actor.user_id))
    } else {
        Err(AppError::Forbidden(
            "Personnel or administrator access required".into(),
        ))
    }
}

async fn load<C: ConnectionTrait>(db: &C, id: i64) -> ServiceResult<complaint::Model> {
    complaint::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Complaint not found".into()))
}

/// Type must exist; a course is required when the type says so and must exist if given.
async fn ensure_type_and_course<C: ConnectionTrait>(
    db: &C,
    complaint_type_id: i64,
    course_id: Option<i64>,
) -> ServiceResult<()> {
    let kind = complaint_type::Entity::find_by_id(complaint_type_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Complaint type not found".into()))?;

    match course_id {
        None if kind.requires_course => Err(AppError::InvalidState(format!(
            "A course must be selected for '{}' complaints",
            kind.name
        ))),
        None => Ok(()),
        Some(id) => course::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Course not found".into())),
    }
}

/// Applies `changes` only if the complaint still has the status we read and no
/// completion stamp.
async fn commit_guarded(
    txn: &DatabaseTransaction,
    seen: &complaint::Model,
    changes: complaint::ActiveModel,
) -> ServiceResult<()> {
    let res = complaint::Entity::update_many()
        .set(changes)
        .filter(complaint::Column::Id.eq(seen.id))
        .filter(complaint::Column::Status.eq(seen.status))
        .filter(complaint::Column::CompletedByPersonnelId.is_null())
        .filter(complaint::Column::CompletedByUserId.is_null())
        .exec(txn)
        .await?;

    if res.rows_affected == 0 {
        debug!(complaint_id = seen.id, "Guarded complaint update matched no row");
        return Err(AppError::InvalidState(
            "The complaint was changed by someone else, reload and try again".into(),
        ));
    }
    Ok(())
}

async fn page_of_views(
    db: &DatabaseConnection,
    page: Paginated<complaint::Model>,
    audience: Audience,
) -> ServiceResult<Paginated<ComplaintView>> {
    let Paginated {
        data,
        total,
        page,
        limit,
        total_pages,
    } = page;
    Ok(Paginated {
        data: views::build_many(db, data, audience).await?,
        total,
        page,
        limit,
        total_pages,
    })
}

pub struct ComplaintService;

impl ComplaintService {
    // ↓↓↓ CREATE ↓↓↓

    pub async fn create(
        db: &DatabaseConnection,
        actor: &Actor,
        input: CreateComplaint,
    ) -> ServiceResult<ComplaintView> {
        Self::create_with_codes(db, actor, input, unique_code::random_code).await
    }

    /// [`ComplaintService::create`] drawing code candidates from `codes`.
    pub async fn create_with_codes<G>(
        db: &DatabaseConnection,
        actor: &Actor,
        mut input: CreateComplaint,
        codes: G,
    ) -> ServiceResult<ComplaintView>
    where
        G: FnMut() -> String,
    {
        policy::authorize(Some(actor), Action::CreateComplaint, Target::None)?;
        let student_id = actor
            .student_id()
            .ok_or_else(|| AppError::Forbidden("Only students can file complaints".into()))?;

        input.title = input.title.trim().to_owned();
        input.description = input.description.trim().to_owned();
        validate(&input)?;
        ensure_type_and_course(db, input.complaint_type_id, input.course_id).await?;

        let code = unique_code::generate(db, codes).await?;
        let model = complaint::ActiveModel {
            unique_code: Set(code),
            title: Set(input.title),
            description: Set(input.description),
            status: Set(ComplaintStatus::Pending),
            student_id: Set(student_id),
            complaint_type_id: Set(input.complaint_type_id),
            course_id: Set(input.course_id),
            handled_by_personnel_id: Set(None),
            completed_by_personnel_id: Set(None),
            completed_by_user_id: Set(None),
            is_public: Set(input.is_public),
            is_anonymous: Set(input.is_anonymous),
            created_at: Set(Utc::now()),
            resolved_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(complaint_id = model.id, code = %model.unique_code, student_id, "Complaint filed");
        views::build_one(db, model, Audience::Internal).await
    }

    // ↓↓↓ READ ↓↓↓

    pub async fn get(
        db: &DatabaseConnection,
        actor: &Actor,
        id: i64,
    ) -> ServiceResult<ComplaintView> {
        let complaint = load(db, id).await?;
        policy::authorize(Some(actor), Action::ViewComplaint, Target::Complaint(&complaint))?;
        views::build_one(db, complaint, Audience::Internal).await
    }

    pub async fn get_by_code(
        db: &DatabaseConnection,
        actor: &Actor,
        code: &str,
    ) -> ServiceResult<ComplaintView> {
        let complaint = complaint::Model::find_by_code(db, code.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("Complaint not found".into()))?;
        policy::authorize(Some(actor), Action::ViewComplaint, Target::Complaint(&complaint))?;
        views::build_one(db, complaint, Audience::Internal).await
    }

    /// A student's own complaints.
    pub async fn list_for_student(
        db: &DatabaseConnection,
        actor: &Actor,
        student_user_id: i64,
        query: &ComplaintQuery,
    ) -> ServiceResult<Paginated<ComplaintView>> {
        policy::authorize(
            Some(actor),
            Action::ListStudentComplaints,
            Target::StudentUser(student_user_id),
        )?;
        let student = student::Model::find_by_user(db, student_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".into()))?;

        let mut filters = query.shared_filters()?;
        filters.push(FilterParam::eq("student_id", student.id));

        let pagination = query.pagination(DEFAULT_LIMIT);
        let (items, total) = ComplaintRepo::filter(
            db,
            &filters,
            &query.search(),
            pagination.page,
            pagination.limit,
            Some(query.sort()),
        )
        .await?;
        page_of_views(db, Paginated::new(items, total, pagination), Audience::Internal).await
    }

    /// Complaints needing staff attention: untouched ones, plus answered ones where the
    /// student has replied to the latest staff message.
    pub async fn pending_queue(
        db: &DatabaseConnection,
        actor: &Actor,
        query: &ComplaintQuery,
    ) -> ServiceResult<Paginated<ComplaintView>> {
        policy::authorize(Some(actor), Action::ListStaffQueues, Target::None)?;

        let mut filters = query.shared_filters()?;
        filters.push(FilterParam::eq("status", ["pending", "answered"]));
        filters.extend(not_completed());

        let candidates =
            ComplaintRepo::find_all(db, &filters, &query.search(), Some(query.sort())).await?;

        let answered_ids: Vec<i64> = candidates
            .iter()
            .filter(|c| c.status == ComplaintStatus::Answered)
            .map(|c| c.id)
            .collect();
        let threads = views::load_threads(db, &answered_ids).await?;

        let queue: Vec<complaint::Model> = candidates
            .into_iter()
            .filter(|c| {
                let latest = threads
                    .get(&c.id)
                    .and_then(|t| complaint_response::Model::latest_personnel_in(t));
                lifecycle::needs_staff_attention(c, latest)
            })
            .collect();

        let page = Paginated::from_slice(queue, query.pagination(DEFAULT_LIMIT));
        page_of_views(db, page, Audience::Internal).await
    }

    /// Answered or rejected complaints that nobody has completed yet.
    pub async fn answered_queue(
        db: &DatabaseConnection,
        actor: &Actor,
        query: &ComplaintQuery,
    ) -> ServiceResult<Paginated<ComplaintView>> {
        policy::authorize(Some(actor), Action::ListStaffQueues, Target::None)?;

        let mut filters = query.shared_filters()?;
        filters.push(FilterParam::eq("status", ["answered", "rejected"]));
        filters.extend(not_completed());

        Self::paged(db, &filters, query, DEFAULT_LIMIT, Audience::Internal).await
    }

    pub async fn completed_queue(
        db: &DatabaseConnection,
        actor: &Actor,
        query: &ComplaintQuery,
    ) -> ServiceResult<Paginated<ComplaintView>> {
        policy::authorize(Some(actor), Action::ListStaffQueues, Target::None)?;

        let mut filters = query.shared_filters()?;
        filters.push(FilterParam::eq("status", "completed"));

        Self::paged(db, &filters, query, DEFAULT_LIMIT, Audience::Internal).await
    }

    /// Every complaint regardless of state, for administrators.
    pub async fn list_all(
        db: &DatabaseConnection,
        actor: &Actor,
        query: &ComplaintQuery,
    ) -> ServiceResult<Paginated<ComplaintView>> {
        policy::authorize(Some(actor), Action::ListAllComplaints, Target::None)?;
        let filters = query.shared_filters()?;
        Self::paged(db, &filters, query, DEFAULT_LIMIT, Audience::Internal).await
    }

    /// Public complaints, anonymized where flagged. No authentication needed.
    pub async fn public_list(
        db: &DatabaseConnection,
        query: &ComplaintQuery,
    ) -> ServiceResult<Paginated<ComplaintView>> {
        policy::authorize(None, Action::ReadPublic, Target::None)?;

        let mut filters = query.shared_filters()?;
        filters.push(FilterParam::eq("is_public", true));

        Self::paged(db, &filters, query, DEFAULT_PUBLIC_LIMIT, Audience::Public).await
    }

    /// A public complaint by numeric id or unique code. Private complaints read as missing.
    pub async fn public_get(
        db: &DatabaseConnection,
        id_or_code: &str,
    ) -> ServiceResult<ComplaintView> {
        let key = id_or_code.trim();
        let readable =
            |c: &complaint::Model| policy::can(None, Action::ReadPublic, Target::Complaint(c));

        let by_id = match key.parse::<i64>() {
            Ok(id) => complaint::Entity::find_by_id(id).one(db).await?,
            Err(_) => None,
        };
        // A digit-only code may collide with the id of a private complaint.
        let found = match by_id.filter(readable) {
            Some(c) => Some(c),
            None => complaint::Model::find_by_code(db, key).await?.filter(readable),
        };

        match found {
            Some(c) => views::build_one(db, c, Audience::Public).await,
            None => Err(AppError::NotFound("Complaint not found".into())),
        }
    }

    async fn paged(
        db: &DatabaseConnection,
        filters: &[FilterParam],
        query: &ComplaintQuery,
        default_limit: u64,
        audience: Audience,
    ) -> ServiceResult<Paginated<ComplaintView>> {
        let pagination = query.pagination(default_limit);
        let (items, total) = ComplaintRepo::filter(
            db,
            filters,
            &query.search(),
            pagination.page,
            pagination.limit,
            Some(query.sort()),
        )
        .await?;
        page_of_views(db, Paginated::new(items, total, pagination), audience).await
    }

    // ↓↓↓ TRANSITIONS ↓↓↓

    /// Staff reply. First reply moves `pending` to `answered`; later replies are only
    /// accepted once the student has answered the previous one.
    pub async fn respond(
        db: &DatabaseConnection,
        actor: &Actor,
        id: i64,
        message: &str,
    ) -> ServiceResult<ComplaintView> {
        policy::authorize(Some(actor), Action::Respond, Target::None)?;
        let message = clean_text(message, "Response")?;
        let author = responder(actor)?;

        let txn = db.begin().await?;
        let complaint = load(&txn, id).await?;
        let latest = complaint_response::Model::latest_personnel_response(&txn, id).await?;
        let next = lifecycle::check(Event::Respond, &complaint, latest.as_ref())?;

        complaint_response::Model::create_staff(&txn, id, &message, author).await?;

        let mut changes = complaint::ActiveModel {
            status: Set(next),
            ..Default::default()
        };
        if complaint.resolved_at.is_none() {
            changes.resolved_at = Set(Some(Utc::now()));
        }
        if let Some(personnel_id) = actor.personnel_id() {
            if complaint.handled_by_personnel_id.is_none() {
                changes.handled_by_personnel_id = Set(Some(personnel_id));
            }
        }
        commit_guarded(&txn, &complaint, changes).await?;
        txn.commit().await?;

        info!(complaint_id = id, user_id = actor.user_id, "Complaint answered");
        views::build_one(db, load(db, id).await?, Audience::Internal).await
    }

    pub async fn reject(
        db: &DatabaseConnection,
        actor: &Actor,
        id: i64,
        reason: &str,
    ) -> ServiceResult<ComplaintView> {
        policy::authorize(Some(actor), Action::Reject, Target::None)?;
        let reason = clean_text(reason, "Rejection reason")?;
        let author = responder(actor)?;

        let txn = db.begin().await?;
        let complaint = load(&txn, id).await?;
        let next = lifecycle::check(Event::Reject, &complaint, None)?;

        complaint_response::Model::create_staff(&txn, id, &reason, author).await?;

        let mut changes = complaint::ActiveModel {
            status: Set(next),
            resolved_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        if let Some(personnel_id) = actor.personnel_id() {
            if complaint.handled_by_personnel_id.is_none() {
                changes.handled_by_personnel_id = Set(Some(personnel_id));
            }
        }
        commit_guarded(&txn, &complaint, changes).await?;
        txn.commit().await?;

        info!(complaint_id = id, user_id = actor.user_id, "Complaint rejected");
        views::build_one(db, load(db, id).await?, Audience::Internal).await
    }

    /// The owning student's answer, written into the latest staff response row.
    pub async fn student_reply(
        db: &DatabaseConnection,
        actor: &Actor,
        id: i64,
        text: &str,
    ) -> ServiceResult<ComplaintView> {
        let text = clean_text(text, "Reply")?;

        let txn = db.begin().await?;
        let complaint = load(&txn, id).await?;
        policy::authorize(Some(actor), Action::StudentReply, Target::Complaint(&complaint))?;
        let latest = complaint_response::Model::latest_personnel_response(&txn, id).await?;
        let next = lifecycle::check(Event::StudentReply, &complaint, latest.as_ref())?;
        let row = latest.ok_or_else(|| {
            AppError::InvalidState("There is no staff response to reply to".into())
        })?;

        let updated = complaint_response::Entity::update_many()
            .set(complaint_response::ActiveModel {
                student_response: Set(Some(text)),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(complaint_response::Column::Id.eq(row.id))
            .filter(
                Condition::any()
                    .add(complaint_response::Column::StudentResponse.is_null())
                    .add(complaint_response::Column::StudentResponse.eq("")),
            )
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(AppError::InvalidState(
                "The latest response has already been replied to".into(),
            ));
        }

        commit_guarded(
            &txn,
            &complaint,
            complaint::ActiveModel {
                status: Set(next),
                ..Default::default()
            },
        )
        .await?;
        txn.commit().await?;

        info!(complaint_id = id, response_id = row.id, "Student replied");
        views::build_one(db, load(db, id).await?, Audience::Internal).await
    }

    /// Closes a pending or answered complaint, crediting the personnel profile or, for
    /// admins, the user account.
    pub async fn complete(
        db: &DatabaseConnection,
        actor: &Actor,
        id: i64,
    ) -> ServiceResult<ComplaintView> {
        policy::authorize(Some(actor), Action::Complete, Target::None)?;
        let author = responder(actor)?;

        let txn = db.begin().await?;
        let complaint = load(&txn, id).await?;
        let next = lifecycle::check(Event::Complete, &complaint, None)?;

        let mut changes = complaint::ActiveModel {
            status: Set(next),
            ..Default::default()
        };
        match author {
            Responder::Personnel(pid) => changes.completed_by_personnel_id = Set(Some(pid)),
            Responder::User(uid) => changes.completed_by_user_id = Set(Some(uid)),
        }
        if complaint.resolved_at.is_none() {
            changes.resolved_at = Set(Some(Utc::now()));
        }
        commit_guarded(&txn, &complaint, changes).await?;
        txn.commit().await?;

        info!(complaint_id = id, user_id = actor.user_id, "Complaint completed");
        views::build_one(db, load(db, id).await?, Audience::Internal).await
    }

    /// Owner edit while still pending.
    pub async fn update(
        db: &DatabaseConnection,
        actor: &Actor,
        id: i64,
        mut input: UpdateComplaint,
    ) -> ServiceResult<ComplaintView> {
        input.title = input.title.map(|t| t.trim().to_owned());
        input.description = input.description.map(|d| d.trim().to_owned());
        validate(&input)?;

        let txn = db.begin().await?;
        let complaint = load(&txn, id).await?;
        policy::authorize(Some(actor), Action::UpdateComplaint, Target::Complaint(&complaint))?;
        let next = lifecycle::check(Event::Update, &complaint, None)?;

        let type_id = input.complaint_type_id.unwrap_or(complaint.complaint_type_id);
        let course_id = input.course_id.unwrap_or(complaint.course_id);
        if input.complaint_type_id.is_some() || input.course_id.is_some() {
            ensure_type_and_course(&txn, type_id, course_id).await?;
        }

        let mut changes = complaint::ActiveModel {
            status: Set(next),
            complaint_type_id: Set(type_id),
            course_id: Set(course_id),
            ..Default::default()
        };
        if let Some(title) = input.title {
            changes.title = Set(title);
        }
        if let Some(description) = input.description {
            changes.description = Set(description);
        }
        if let Some(is_public) = input.is_public {
            changes.is_public = Set(is_public);
        }
        if let Some(is_anonymous) = input.is_anonymous {
            changes.is_anonymous = Set(is_anonymous);
        }
        commit_guarded(&txn, &complaint, changes).await?;
        txn.commit().await?;

        info!(complaint_id = id, "Complaint edited");
        views::build_one(db, load(db, id).await?, Audience::Internal).await
    }

    /// Removes a non-terminal complaint and its thread.
    pub async fn delete(db: &DatabaseConnection, actor: &Actor, id: i64) -> ServiceResult<()> {
        let txn = db.begin().await?;
        let complaint = load(&txn, id).await?;
        policy::authorize(Some(actor), Action::DeleteComplaint, Target::Complaint(&complaint))?;
        lifecycle::check(Event::Delete, &complaint, None)?;

        complaint_response::Entity::delete_many()
            .filter(complaint_response::Column::ComplaintId.eq(id))
            .exec(&txn)
            .await?;
        let removed = complaint::Entity::delete_many()
            .filter(complaint::Column::Id.eq(id))
            .filter(complaint::Column::Status.eq(complaint.status))
            .filter(complaint::Column::CompletedByPersonnelId.is_null())
            .filter(complaint::Column::CompletedByUserId.is_null())
            .exec(&txn)
            .await?;
        if removed.rows_affected == 0 {
            return Err(AppError::InvalidState(
                "The complaint was changed by someone else, reload and try again".into(),
            ));
        }
        txn.commit().await?;

        info!(complaint_id = id, user_id = actor.user_id, "Complaint deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use db::models::complaint_response;
    use sea_orm::PaginatorTrait;
    use std::collections::HashSet;

    #[tokio::test]
    async fn create_then_fetch_by_code_and_id_agree() {
        let fx = Fixture::new().await;
        let created = fx.file(&fx.student, "Wi-Fi down").await;
        assert_eq!(created.status, ComplaintStatus::Pending);
        assert_eq!(created.unique_code.len(), 10);

        let by_id = ComplaintService::get(&fx.db, &fx.student, created.id)
            .await
            .unwrap();
        let by_code = ComplaintService::get_by_code(&fx.db, &fx.staff, &created.unique_code)
            .await
            .unwrap();
        assert_eq!(by_id, by_code);
        assert_eq!(by_id, created);
    }

    #[tokio::test]
    async fn course_is_required_only_when_the_type_demands_it() {
        let fx = Fixture::new().await;
        let mut input = fx.new_complaint("Grade dispute");
        input.complaint_type_id = fx.course_type;
        let err = ComplaintService::create(&fx.db, &fx.student, input.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        input.course_id = Some(9999);
        let err = ComplaintService::create(&fx.db, &fx.student, input.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        input.course_id = Some(fx.course);
        assert!(ComplaintService::create(&fx.db, &fx.student, input).await.is_ok());

        let mut general = fx.new_complaint("Noise");
        general.course_id = Some(fx.course);
        assert!(ComplaintService::create(&fx.db, &fx.student, general).await.is_ok());
    }

    #[tokio::test]
    async fn only_students_file_complaints() {
        let fx = Fixture::new().await;
        let err = ComplaintService::create(&fx.db, &fx.staff, fx.new_complaint("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn forced_collision_takes_a_second_attempt() {
        let fx = Fixture::new().await;
        let first = fx.file(&fx.student, "first").await;

        let mut calls = 0;
        let taken = first.unique_code.clone();
        let view = ComplaintService::create_with_codes(
            &fx.db,
            &fx.student,
            fx.new_complaint("second"),
            || {
                calls += 1;
                if calls == 1 { taken.clone() } else { "Zz9Yy8Xx7W".to_string() }
            },
        )
        .await
        .unwrap();
        assert_eq!(calls, 2);
        assert_eq!(view.unique_code, "Zz9Yy8Xx7W");
    }

    #[tokio::test]
    async fn exhausted_code_budget_is_a_conflict() {
        let fx = Fixture::new().await;
        let first = fx.file(&fx.student, "first").await;
        let mut calls = 0;
        let err = ComplaintService::create_with_codes(
            &fx.db,
            &fx.student,
            fx.new_complaint("second"),
            || {
                calls += 1;
                first.unique_code.clone()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(calls, unique_code::MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn a_thousand_codes_are_distinct() {
        let fx = Fixture::new().await;
        let mut seen = HashSet::new();
        for i in 0..1000 {
            let view = fx.file(&fx.student, &format!("bulk {i}")).await;
            assert!(seen.insert(view.unique_code));
        }
    }

    #[tokio::test]
    async fn respond_by_personnel_stamps_handler() {
        let fx = Fixture::new().await;
        let c = fx.file(&fx.student, "Heating").await;
        let view = ComplaintService::respond(&fx.db, &fx.staff, c.id, "On it")
            .await
            .unwrap();

        assert_eq!(view.status, ComplaintStatus::Answered);
        assert!(view.resolved_at.is_some());
        let handler = view.handled_by.unwrap();
        assert_eq!(handler.personnel_id, fx.staff.personnel_id());
        assert_eq!(view.responses.len(), 1);
        assert_eq!(view.responses[0].personnel_response.as_deref(), Some("On it"));
    }

    #[tokio::test]
    async fn respond_by_admin_leaves_personnel_fields_empty() {
        let fx = Fixture::new().await;
        let c = fx.file(&fx.student, "Heating").await;
        let view = ComplaintService::respond(&fx.db, &fx.admin, c.id, "Escalated")
            .await
            .unwrap();

        assert_eq!(view.status, ComplaintStatus::Answered);
        assert!(view.handled_by.is_none());
        let row = complaint_response::Entity::find()
            .filter(complaint_response::Column::ComplaintId.eq(c.id))
            .one(&fx.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.responded_by_user_id, Some(fx.admin.user_id));
        assert_eq!(row.responded_by_personnel_id, None);
    }

    #[tokio::test]
    async fn student_reply_updates_in_place_and_reopens_for_staff() {
        let fx = Fixture::new().await;
        let c = fx.file(&fx.student, "Library hours").await;
        ComplaintService::respond(&fx.db, &fx.staff, c.id, "Which branch?")
            .await
            .unwrap();

        let second_try = ComplaintService::respond(&fx.db, &fx.staff, c.id, "Hello?").await;
        assert!(matches!(second_try, Err(AppError::InvalidState(_))));

        let view = ComplaintService::student_reply(&fx.db, &fx.student, c.id, "Main campus")
            .await
            .unwrap();
        assert_eq!(view.responses.len(), 1);
        assert_eq!(view.responses[0].student_response.as_deref(), Some("Main campus"));
        assert_eq!(view.status, ComplaintStatus::Answered);

        let again = ComplaintService::student_reply(&fx.db, &fx.student, c.id, "Also weekends").await;
        assert!(matches!(again, Err(AppError::InvalidState(_))));

        let pending = ComplaintService::pending_queue(&fx.db, &fx.staff, &ComplaintQuery::default())
            .await
            .unwrap();
        assert!(pending.data.iter().any(|v| v.id == c.id));

        let view = ComplaintService::respond(&fx.db, &fx.staff, c.id, "Extended hours")
            .await
            .unwrap();
        assert_eq!(view.responses.len(), 2);

        let pending = ComplaintService::pending_queue(&fx.db, &fx.staff, &ComplaintQuery::default())
            .await
            .unwrap();
        assert!(pending.data.iter().all(|v| v.id != c.id));
    }

    #[tokio::test]
    async fn student_actions_are_owner_only() {
        let fx = Fixture::new().await;
        let c = fx.file(&fx.student, "Mine").await;
        ComplaintService::respond(&fx.db, &fx.staff, c.id, "ok").await.unwrap();

        for actor in [&fx.other_student, &fx.staff, &fx.admin] {
            let reply = ComplaintService::student_reply(&fx.db, actor, c.id, "hi").await;
            assert!(matches!(reply, Err(AppError::Forbidden(_))));
        }

        let pending = fx.file(&fx.student, "Editable").await;
        let edit = UpdateComplaint {
            title: Some("New title".into()),
            ..Default::default()
        };
        let err = ComplaintService::update(&fx.db, &fx.other_student, pending.id, edit.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = ComplaintService::delete(&fx.db, &fx.other_student, pending.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = ComplaintService::delete(&fx.db, &fx.staff, pending.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let view = ComplaintService::update(&fx.db, &fx.student, pending.id, edit)
            .await
            .unwrap();
        assert_eq!(view.title, "New title");
    }

    #[tokio::test]
    async fn completed_complaints_accept_no_further_transitions() {
        let fx = Fixture::new().await;
        let c = fx.file(&fx.student, "Done soon").await;
        ComplaintService::respond(&fx.db, &fx.staff, c.id, "Fixed").await.unwrap();
        let done = ComplaintService::complete(&fx.db, &fx.admin, c.id).await.unwrap();
        assert_eq!(done.status, ComplaintStatus::Completed);
        assert_eq!(done.completed_by.as_ref().map(|s| s.user_id), Some(fx.admin.user_id));

        let invalid = |r: ServiceResult<ComplaintView>| matches!(r, Err(AppError::InvalidState(_)));
        assert!(invalid(ComplaintService::respond(&fx.db, &fx.staff, c.id, "more").await));
        assert!(invalid(ComplaintService::reject(&fx.db, &fx.staff, c.id, "no").await));
        assert!(invalid(ComplaintService::complete(&fx.db, &fx.staff, c.id).await));
        assert!(invalid(ComplaintService::student_reply(&fx.db, &fx.student, c.id, "thx").await));
        assert!(invalid(
            ComplaintService::update(&fx.db, &fx.student, c.id, UpdateComplaint::default()).await
        ));
        assert!(matches!(
            ComplaintService::delete(&fx.db, &fx.student, c.id).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn personnel_can_complete_straight_from_pending() {
        let fx = Fixture::new().await;
        let c = fx.file(&fx.student, "Quick fix").await;
        let done = ComplaintService::complete(&fx.db, &fx.staff, c.id).await.unwrap();
        assert_eq!(done.status, ComplaintStatus::Completed);
        assert!(done.resolved_at.is_some());
        assert_eq!(
            done.completed_by.and_then(|s| s.personnel_id),
            fx.staff.personnel_id()
        );
    }

    #[tokio::test]
    async fn concurrent_completes_have_one_winner() {
        let fx = Fixture::new().await;
        let c = fx.file(&fx.student, "Race").await;
        let (a, b) = tokio::join!(
            ComplaintService::complete(&fx.db, &fx.staff, c.id),
            ComplaintService::complete(&fx.db, &fx.admin, c.id)
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn reject_only_from_pending_and_records_reason() {
        let fx = Fixture::new().await;
        let c = fx.file(&fx.student, "Spam?").await;
        let view = ComplaintService::reject(&fx.db, &fx.staff, c.id, "Duplicate")
            .await
            .unwrap();
        assert_eq!(view.status, ComplaintStatus::Rejected);
        assert_eq!(view.responses[0].personnel_response.as_deref(), Some("Duplicate"));

        let answered = fx.file(&fx.student, "Later").await;
        ComplaintService::respond(&fx.db, &fx.staff, answered.id, "hi").await.unwrap();
        let err = ComplaintService::reject(&fx.db, &fx.staff, answered.id, "no")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn update_only_while_pending_and_revalidates_course() {
        let fx = Fixture::new().await;
        let c = fx.file(&fx.student, "Edit me").await;

        let to_course_type = UpdateComplaint {
            complaint_type_id: Some(fx.course_type),
            ..Default::default()
        };
        let err = ComplaintService::update(&fx.db, &fx.student, c.id, to_course_type)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let with_course = UpdateComplaint {
            complaint_type_id: Some(fx.course_type),
            course_id: Some(Some(fx.course)),
            is_public: Some(true),
            ..Default::default()
        };
        let view = ComplaintService::update(&fx.db, &fx.student, c.id, with_course)
            .await
            .unwrap();
        assert_eq!(view.course.map(|co| co.id), Some(fx.course));
        assert!(view.is_public);

        ComplaintService::respond(&fx.db, &fx.staff, c.id, "seen").await.unwrap();
        let late = UpdateComplaint {
            is_anonymous: Some(true),
            ..Default::default()
        };
        let err = ComplaintService::update(&fx.db, &fx.student, c.id, late)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn delete_cascades_thread_and_admin_may_delete() {
        let fx = Fixture::new().await;
        let c = fx.file(&fx.student, "Remove").await;
        ComplaintService::respond(&fx.db, &fx.staff, c.id, "hm").await.unwrap();
        ComplaintService::delete(&fx.db, &fx.admin, c.id).await.unwrap();

        assert!(complaint::Entity::find_by_id(c.id).one(&fx.db).await.unwrap().is_none());
        let leftover = complaint_response::Entity::find()
            .filter(complaint_response::Column::ComplaintId.eq(c.id))
            .count(&fx.db)
            .await
            .unwrap();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn queues_partition_by_state() {
        let fx = Fixture::new().await;
        let untouched = fx.file(&fx.student, "untouched").await;
        let answered = fx.file(&fx.student, "answered").await;
        let rejected = fx.file(&fx.student, "rejected").await;
        let completed = fx.file(&fx.student, "completed").await;
        ComplaintService::respond(&fx.db, &fx.staff, answered.id, "a").await.unwrap();
        ComplaintService::reject(&fx.db, &fx.staff, rejected.id, "r").await.unwrap();
        ComplaintService::complete(&fx.db, &fx.staff, completed.id).await.unwrap();

        let q = ComplaintQuery::default();
        let ids = |p: Paginated<ComplaintView>| p.data.into_iter().map(|v| v.id).collect::<Vec<_>>();

        let pending = ids(ComplaintService::pending_queue(&fx.db, &fx.staff, &q).await.unwrap());
        assert_eq!(pending, vec![untouched.id]);

        let mut mine = ids(ComplaintService::answered_queue(&fx.db, &fx.staff, &q).await.unwrap());
        mine.sort();
        assert_eq!(mine, vec![answered.id, rejected.id]);

        let done = ids(ComplaintService::completed_queue(&fx.db, &fx.admin, &q).await.unwrap());
        assert_eq!(done, vec![completed.id]);

        let err = ComplaintService::pending_queue(&fx.db, &fx.student, &q).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn student_listing_filters_sorts_and_pages() {
        let fx = Fixture::new().await;
        for title in ["Bravo", "Alpha", "Charlie"] {
            fx.file(&fx.student, title).await;
        }
        fx.file(&fx.other_student, "Someone else").await;

        let q = ComplaintQuery {
            sort_by: Some("title".into()),
            sort_order: Some("ASC".into()),
            limit: Some(2),
            ..Default::default()
        };
        let page = ComplaintService::list_for_student(&fx.db, &fx.student, fx.student.user_id, &q)
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        let titles: Vec<_> = page.data.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Bravo"]);

        let searched = ComplaintQuery {
            search: Some("charl".into()),
            ..Default::default()
        };
        let page = ComplaintService::list_for_student(&fx.db, &fx.student, fx.student.user_id, &searched)
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let err = ComplaintService::list_for_student(
            &fx.db,
            &fx.other_student,
            fx.student.user_id,
            &q,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let bad = ComplaintQuery {
            status: Some("closed".into()),
            ..Default::default()
        };
        assert!(matches!(
            ComplaintService::list_for_student(&fx.db, &fx.student, fx.student.user_id, &bad).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn public_view_hides_private_and_masks_anonymous() {
        let fx = Fixture::new().await;
        let private = fx.file(&fx.student, "private").await;

        let mut input = fx.new_complaint("public anon");
        input.is_public = true;
        input.is_anonymous = true;
        let anon = ComplaintService::create(&fx.db, &fx.student, input).await.unwrap();

        let mut input = fx.new_complaint("public named");
        input.is_public = true;
        let named = ComplaintService::create(&fx.db, &fx.student, input).await.unwrap();

        let page = ComplaintService::public_list(&fx.db, &ComplaintQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.limit, DEFAULT_PUBLIC_LIMIT);
        assert_eq!(page.data[0].id, named.id);

        let by_code = ComplaintService::public_get(&fx.db, &anon.unique_code).await.unwrap();
        assert!(by_code.student.is_none());
        assert!(by_code.is_anonymous);

        let by_id = ComplaintService::public_get(&fx.db, &named.id.to_string()).await.unwrap();
        let student = by_id.student.unwrap();
        assert!(student.email.is_none());

        let hidden = ComplaintService::public_get(&fx.db, &private.unique_code).await;
        assert!(matches!(hidden, Err(AppError::NotFound(_))));

        // Staff still see who filed an anonymous complaint.
        let internal = ComplaintService::get(&fx.db, &fx.staff, anon.id).await.unwrap();
        assert!(internal.student.is_some());
    }

    #[tokio::test]
    async fn digit_code_matching_a_private_id_still_resolves() {
        let fx = Fixture::new().await;
        let private = fx.file(&fx.student, "private").await;

        let mut input = fx.new_complaint("public");
        input.is_public = true;
        let digits = private.id.to_string();
        let public = ComplaintService::create_with_codes(&fx.db, &fx.student, input, || {
            digits.clone()
        })
        .await
        .unwrap();
        assert_eq!(public.unique_code, private.id.to_string());

        let view = ComplaintService::public_get(&fx.db, &public.unique_code).await.unwrap();
        assert_eq!(view.id, public.id);
    }

    #[tokio::test]
    async fn huge_page_numbers_yield_empty_pages() {
        let fx = Fixture::new().await;
        let mut input = fx.new_complaint("visible");
        input.is_public = true;
        ComplaintService::create(&fx.db, &fx.student, input).await.unwrap();

        let q = ComplaintQuery {
            page: Some(u64::MAX),
            limit: Some(100),
            ..Default::default()
        };
        let pending = ComplaintService::pending_queue(&fx.db, &fx.staff, &q).await.unwrap();
        assert!(pending.data.is_empty());
        assert_eq!(pending.total, 1);

        let public = ComplaintService::public_list(&fx.db, &q).await.unwrap();
        assert!(public.data.is_empty());
        assert_eq!(public.total, 1);

        let all = ComplaintService::list_all(&fx.db, &fx.admin, &q).await.unwrap();
        assert!(all.data.is_empty());
    }

    #[tokio::test]
    async fn admin_lists_every_complaint() {
        let fx = Fixture::new().await;
        let open = fx.file(&fx.student, "open").await;
        let done = fx.file(&fx.other_student, "done").await;
        ComplaintService::complete(&fx.db, &fx.staff, done.id).await.unwrap();

        let page = ComplaintService::list_all(&fx.db, &fx.admin, &ComplaintQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        let mut ids: Vec<_> = page.data.iter().map(|v| v.id).collect();
        ids.sort();
        assert_eq!(ids, vec![open.id, done.id]);

        let completed = ComplaintQuery {
            status: Some("completed".into()),
            ..Default::default()
        };
        let page = ComplaintService::list_all(&fx.db, &fx.admin, &completed).await.unwrap();
        assert_eq!(page.data.iter().map(|v| v.id).collect::<Vec<_>>(), vec![done.id]);

        for actor in [&fx.staff, &fx.student] {
            let err = ComplaintService::list_all(&fx.db, actor, &ComplaintQuery::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
        }
    }
}
