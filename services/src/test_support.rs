//! Shared fixtures for service tests.

use crate::complaint::{ComplaintService, CreateComplaint};
use crate::policy::Actor;
use crate::profile::ProfileManager;
use crate::views::ComplaintView;
use db::models::{
    complaint_type, course, department,
    user::{self, NewUser, RoleType},
};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;

pub async fn make_actor(db: &DatabaseConnection, email: &str, role: RoleType) -> Actor {
    let user = user::Model::create(
        db,
        NewUser {
            first_name: "Test",
            last_name: email.split('@').next().unwrap_or("User"),
            email,
            password: "password123",
            phone_number: None,
            role_type: role,
        },
    )
    .await
    .unwrap();
    ProfileManager::create_profile(db, user.id, role).await.unwrap();
    ProfileManager::actor_for(db, &user).await.unwrap()
}

pub struct Fixture {
    pub db: DatabaseConnection,
    pub student: Actor,
    pub other_student: Actor,
    pub staff: Actor,
    pub admin: Actor,
    pub general_type: i64,
    pub course_type: i64,
    pub course: i64,
}

impl Fixture {
    pub async fn new() -> Self {
        let db = setup_test_db().await;
        let dept = department::Model::create(&db, "Computer Science", "CS", None)
            .await
            .unwrap();
        let course = course::Model::create(&db, "Algorithms", "COS212", dept.id)
            .await
            .unwrap();
        let general = complaint_type::Model::create(&db, "Facilities", None, false)
            .await
            .unwrap();
        let academic = complaint_type::Model::create(&db, "Academic", Some("Course issues"), true)
            .await
            .unwrap();

        Self {
            student: make_actor(&db, "alice@uni.test", RoleType::Student).await,
            other_student: make_actor(&db, "bob@uni.test", RoleType::Student).await,
            staff: make_actor(&db, "carol@uni.test", RoleType::Personnel).await,
            admin: make_actor(&db, "dave@uni.test", RoleType::Admin).await,
            general_type: general.id,
            course_type: academic.id,
            course: course.id,
            db,
        }
    }

    pub fn new_complaint(&self, title: &str) -> CreateComplaint {
        CreateComplaint {
            title: title.to_owned(),
            description: format!("Details about {title}"),
            complaint_type_id: self.general_type,
            course_id: None,
            is_public: false,
            is_anonymous: false,
        }
    }

    pub async fn file(&self, actor: &Actor, title: &str) -> ComplaintView {
        ComplaintService::create(&self.db, actor, self.new_complaint(title))
            .await
            .unwrap()
    }
}
