//! Plain data projections returned to callers, assembled with batched id lookups.

use crate::service::ServiceResult;
use chrono::{DateTime, Utc};
use db::models::{
    complaint::{self, ComplaintStatus},
    complaint_response, complaint_type, course, personnel, student,
    user::{self, RoleType},
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    pub id: i64,
    pub name: String,
    pub requires_course: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    pub id: i64,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Internal views only.
    pub email: Option<String>,
    pub student_number: String,
}

/// A staff member (or an admin) credited with an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffRef {
    pub user_id: i64,
    pub personnel_id: Option<i64>,
    pub name: String,
    pub role: RoleType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseView {
    pub id: i64,
    pub personnel_response: Option<String>,
    pub student_response: Option<String>,
    pub responded_by: Option<StaffRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplaintView {
    pub id: i64,
    pub unique_code: String,
    pub title: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub is_public: bool,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub complaint_type: Option<TypeSummary>,
    pub course: Option<CourseSummary>,
    /// `None` in public listings when the complaint is anonymous.
    pub student: Option<StudentSummary>,
    pub handled_by: Option<StaffRef>,
    pub completed_by: Option<StaffRef>,
    /// Oldest first.
    pub responses: Vec<ResponseView>,
}

/// Whether identities flagged anonymous are hidden in the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Public,
    Internal,
}

fn staff_from_user(u: &user::Model, personnel_id: Option<i64>) -> StaffRef {
    StaffRef {
        user_id: u.id,
        personnel_id,
        name: u.full_name(),
        role: u.role_type,
    }
}

/// Loads responses for the given complaints, grouped and ordered oldest first.
pub async fn load_threads<C: ConnectionTrait>(
    db: &C,
    complaint_ids: &[i64],
) -> ServiceResult<HashMap<i64, Vec<complaint_response::Model>>> {
    let mut threads: HashMap<i64, Vec<complaint_response::Model>> = HashMap::new();
    if complaint_ids.is_empty() {
        return Ok(threads);
    }
    let rows = complaint_response::Entity::find()
        .filter(complaint_response::Column::ComplaintId.is_in(complaint_ids.to_vec()))
        .order_by_asc(complaint_response::Column::CreatedAt)
        .order_by_asc(complaint_response::Column::Id)
        .all(db)
        .await?;
    for row in rows {
        threads.entry(row.complaint_id).or_default().push(row);
    }
    Ok(threads)
}

pub async fn build_one<C: ConnectionTrait>(
    db: &C,
    complaint: complaint::Model,
    audience: Audience,
) -> ServiceResult<ComplaintView> {
    let mut views = build_many(db, vec![complaint], audience).await?;
    Ok(views.remove(0))
}

pub async fn build_many<C: ConnectionTrait>(
    db: &C,
    complaints: Vec<complaint::Model>,
    audience: Audience,
) -> ServiceResult<Vec<ComplaintView>> {
    if complaints.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = complaints.iter().map(|c| c.id).collect();
    let mut threads = load_threads(db, &ids).await?;

    let type_ids: HashSet<i64> = complaints.iter().map(|c| c.complaint_type_id).collect();
    let types: HashMap<i64, complaint_type::Model> = complaint_type::Entity::find()
        .filter(complaint_type::Column::Id.is_in(type_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let course_ids: HashSet<i64> = complaints.iter().filter_map(|c| c.course_id).collect();
    let courses: HashMap<i64, course::Model> = if course_ids.is_empty() {
        HashMap::new()
    } else {
        course::Entity::find()
            .filter(course::Column::Id.is_in(course_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };

    let student_ids: HashSet<i64> = complaints.iter().map(|c| c.student_id).collect();
    let students: HashMap<i64, (student::Model, Option<user::Model>)> = student::Entity::find()
        .filter(student::Column::Id.is_in(student_ids))
        .find_also_related(user::Entity)
        .all(db)
        .await?
        .into_iter()
        .map(|(s, u)| (s.id, (s, u)))
        .collect();

    let mut personnel_ids: HashSet<i64> = HashSet::new();
    let mut user_ids: HashSet<i64> = HashSet::new();
    for c in &complaints {
        personnel_ids.extend(c.handled_by_personnel_id);
        personnel_ids.extend(c.completed_by_personnel_id);
        user_ids.extend(c.completed_by_user_id);
    }
    for thread in threads.values() {
        for r in thread {
            personnel_ids.extend(r.responded_by_personnel_id);
            user_ids.extend(r.responded_by_user_id);
        }
    }

    let staff: HashMap<i64, StaffRef> = if personnel_ids.is_empty() {
        HashMap::new()
    } else {
        personnel::Entity::find()
            .filter(personnel::Column::Id.is_in(personnel_ids))
            .find_also_related(user::Entity)
            .all(db)
            .await?
            .into_iter()
            .filter_map(|(p, u)| u.map(|u| (p.id, staff_from_user(&u, Some(p.id)))))
            .collect()
    };

    let users: HashMap<i64, StaffRef> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, staff_from_user(&u, None)))
            .collect()
    };

    let credit = |personnel_id: Option<i64>, user_id: Option<i64>| -> Option<StaffRef> {
        personnel_id
            .and_then(|id| staff.get(&id).cloned())
            .or_else(|| user_id.and_then(|id| users.get(&id).cloned()))
    };

    let views = complaints
        .into_iter()
        .map(|c| {
            let hide_student = audience == Audience::Public && c.is_anonymous;
            let student = if hide_student {
                None
            } else {
                students.get(&c.student_id).and_then(|(s, u)| {
                    u.as_ref().map(|u| StudentSummary {
                        user_id: u.id,
                        first_name: u.first_name.clone(),
                        last_name: u.last_name.clone(),
                        email: (audience == Audience::Internal).then(|| u.email.clone()),
                        student_number: s.student_number.clone(),
                    })
                })
            };

            let responses = threads
                .remove(&c.id)
                .unwrap_or_default()
                .into_iter()
                .map(|r| ResponseView {
                    id: r.id,
                    responded_by: credit(r.responded_by_personnel_id, r.responded_by_user_id),
                    personnel_response: r.personnel_response,
                    student_response: r.student_response,
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                })
                .collect();

            ComplaintView {
                complaint_type: types.get(&c.complaint_type_id).map(|t| TypeSummary {
                    id: t.id,
                    name: t.name.clone(),
                    requires_course: t.requires_course,
                }),
                course: c.course_id.and_then(|id| courses.get(&id)).map(|co| CourseSummary {
                    id: co.id,
                    name: co.name.clone(),
                    code: co.code.clone(),
                }),
                student,
                handled_by: credit(c.handled_by_personnel_id, None),
                completed_by: credit(c.completed_by_personnel_id, c.completed_by_user_id),
                responses,
                id: c.id,
                unique_code: c.unique_code,
                title: c.title,
                description: c.description,
                status: c.status,
                is_public: c.is_public,
                is_anonymous: c.is_anonymous,
                created_at: c.created_at,
                resolved_at: c.resolved_at,
            }
        })
        .collect();

    Ok(views)
}
