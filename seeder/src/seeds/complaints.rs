use crate::seed::{Seeder, pick};
use db::models::{
    complaint, complaint_type, course,
    user::{self, RoleType},
};
use fake::{Fake, faker::lorem::en::Sentence};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use services::complaint::{ComplaintService, CreateComplaint};
use services::policy::Actor;
use services::profile::ProfileManager;
use services::service::AppError;

const COMPLAINTS: usize = 40;

const TITLES: &[&str] = &[
    "Projector not working",
    "Marks not released",
    "Lab computers offline",
    "Wi-Fi drops in library",
    "Lecture venue too small",
    "Registration form rejected",
    "Broken air conditioning",
    "Assignment deadline clash",
];

const STAFF_REPLIES: &[&str] = &[
    "Thanks for reporting this, we are looking into it.",
    "A technician has been scheduled.",
    "The lecturer has been notified.",
    "Please send your student number to the faculty office.",
];

const STUDENT_REPLIES: &[&str] = &[
    "Thank you, it is still happening though.",
    "Any update on this?",
    "That resolved it for me.",
];

/// The lifecycle stage a seeded complaint is driven to.
#[derive(Clone, Copy)]
enum Stage {
    Pending,
    Answered,
    Replied,
    Rejected,
    Completed,
}

const STAGES: &[Stage] = &[
    Stage::Pending,
    Stage::Pending,
    Stage::Answered,
    Stage::Replied,
    Stage::Rejected,
    Stage::Completed,
];

/// Complaints in every lifecycle state, driven through the same transitions the API
/// uses. Skipped when complaints already exist.
pub struct ComplaintSeeder;

async fn actors(db: &DatabaseConnection, role: RoleType) -> Result<Vec<Actor>, AppError> {
    let users = user::Entity::find()
        .filter(user::Column::RoleType.eq(role))
        .all(db)
        .await?;
    let mut actors = Vec::with_capacity(users.len());
    for u in &users {
        actors.push(ProfileManager::actor_for(db, u).await?);
    }
    Ok(actors)
}

#[async_trait::async_trait]
impl Seeder for ComplaintSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), AppError> {
        if complaint::Entity::find().count(db).await? > 0 {
            return Ok(());
        }

        let students = actors(db, RoleType::Student).await?;
        let mut staff = actors(db, RoleType::Personnel).await?;
        staff.extend(actors(db, RoleType::Admin).await?);
        let types = complaint_type::Entity::find().all(db).await?;
        let courses = course::Entity::find().all(db).await?;
        if students.is_empty() || staff.is_empty() || types.is_empty() {
            return Err(AppError::InvalidState(
                "Seed accounts and catalog before complaints".into(),
            ));
        }

        for _ in 0..COMPLAINTS {
            let student = pick(&students);
            let kind = pick(&types);
            let course_id = match (kind.requires_course, courses.is_empty()) {
                (true, false) => Some(pick(&courses).id),
                (true, true) => continue,
                (false, _) if fastrand::bool() && !courses.is_empty() => Some(pick(&courses).id),
                _ => None,
            };

            let filed = ComplaintService::create(
                db,
                student,
                CreateComplaint {
                    title: pick(TITLES).to_string(),
                    description: Sentence(8..20).fake(),
                    complaint_type_id: kind.id,
                    course_id,
                    is_public: fastrand::u8(..10) < 6,
                    is_anonymous: fastrand::u8(..10) < 3,
                },
            )
            .await?;

            let handler = pick(&staff);
            match pick(STAGES) {
                Stage::Pending => {}
                Stage::Answered => {
                    ComplaintService::respond(db, handler, filed.id, *pick(STAFF_REPLIES)).await?;
                }
                Stage::Replied => {
                    ComplaintService::respond(db, handler, filed.id, *pick(STAFF_REPLIES)).await?;
                    ComplaintService::student_reply(db, student, filed.id, *pick(STUDENT_REPLIES))
                        .await?;
                }
                Stage::Rejected => {
                    ComplaintService::reject(db, handler, filed.id, "Duplicate of an earlier report")
                        .await?;
                }
                Stage::Completed => {
                    ComplaintService::respond(db, handler, filed.id, *pick(STAFF_REPLIES)).await?;
                    ComplaintService::complete(db, handler, filed.id).await?;
                }
            }
        }
        Ok(())
    }
}
