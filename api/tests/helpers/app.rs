use api::{auth::generate_jwt, routes::routes};
use axum::Router;
use db::models::{
    complaint_type, course, department,
    user::{self, NewUser, RoleType},
};
use db::test_utils::setup_test_db;
use services::profile::ProfileManager;
use tempfile::TempDir;
use util::{config::AppConfig, state::AppState, test_helpers::setup_test_storage_root};

pub const TEST_PASSWORD: &str = "password123";

/// Router over a fresh in-memory database, with photos stored under a temp dir.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub general_type: i64,
    pub course_type: i64,
    pub course: i64,
    _storage: TempDir,
}

pub async fn make_test_app() -> TestApp {
    AppConfig::reset();
    AppConfig::set_jwt_secret("test-secret");
    AppConfig::set_allow_legacy_headers(false);
    let storage = setup_test_storage_root();

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
    let academic = complaint_type::Model::create(&db, "Academic", None, true)
        .await
        .unwrap();

    let state = AppState::new(db);
    TestApp {
        router: routes(state.clone()),
        state,
        general_type: general.id,
        course_type: academic.id,
        course: course.id,
        _storage: storage,
    }
}

impl TestApp {
    /// Creates an account with its role profile and returns it with a bearer token.
    pub async fn user(&self, email: &str, role: RoleType) -> (user::Model, String) {
        let db = self.state.db();
        let user = user::Model::create(
            db,
            NewUser {
                first_name: "Test",
                last_name: email.split('@').next().unwrap_or("User"),
                email,
                password: TEST_PASSWORD,
                phone_number: None,
                role_type: role,
            },
        )
        .await
        .unwrap();
        ProfileManager::create_profile(db, user.id, role).await.unwrap();
        let (token, _) = generate_jwt(user.id, &user.email, role).unwrap();
        (user, token)
    }
}
