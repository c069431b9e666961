use crate::seed::Seeder;
use db::models::user::{self, NewUser, RoleType};
use fake::{
    Fake,
    faker::name::en::{FirstName, LastName},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use services::profile::ProfileManager;
use services::service::AppError;

pub const SEED_PASSWORD: &str = "password123";

/// Fixed logins, one per role, then random staff and students.
const FIXED: &[(&str, &str, &str, RoleType)] = &[
    ("Ada", "Admin", "admin@example.com", RoleType::Admin),
    ("Pat", "Personnel", "personnel@example.com", RoleType::Personnel),
    ("Sam", "Student", "student@example.com", RoleType::Student),
];

const RANDOM_PERSONNEL: usize = 4;
const RANDOM_STUDENTS: usize = 20;

pub struct AccountSeeder;

async fn account(
    db: &DatabaseConnection,
    first_name: &str,
    last_name: &str,
    email: &str,
    role: RoleType,
) -> Result<(), AppError> {
    if user::Model::find_by_email(db, email).await?.is_some() {
        return Ok(());
    }
    let txn = db.begin().await?;
    let created = user::Model::create(
        &txn,
        NewUser {
            first_name,
            last_name,
            email,
            password: SEED_PASSWORD,
            phone_number: None,
            role_type: role,
        },
    )
    .await?;
    ProfileManager::create_profile(&txn, created.id, role).await?;
    txn.commit().await?;
    Ok(())
}

#[async_trait::async_trait]
impl Seeder for AccountSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), AppError> {
        for (first, last, email, role) in FIXED {
            account(db, first, last, email, *role).await?;
        }

        let random = std::iter::repeat_n(RoleType::Personnel, RANDOM_PERSONNEL)
            .chain(std::iter::repeat_n(RoleType::Student, RANDOM_STUDENTS));
        for (i, role) in random.enumerate() {
            let first: String = FirstName().fake();
            let last: String = LastName().fake();
            let email = format!(
                "{}.{}{}@{}",
                first.to_lowercase(),
                last.to_lowercase().replace(['\'', ' '], ""),
                i,
                if role == RoleType::Student { "students.example.com" } else { "example.com" }
            );
            account(db, &first, &last, &email, role).await?;
        }
        Ok(())
    }
}
