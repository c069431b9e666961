use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DeriveActiveEnum, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// An authentication identity. Exactly one role profile row (student, personnel
/// or admin) belongs to it, selected by `role_type`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub role_type: RoleType,
    /// Path relative to the storage root, e.g. `users/4/photo.png`.
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RoleType {
    #[sea_orm(string_value = "student")]
    Student,

    #[sea_orm(string_value = "personnel")]
    Personnel,

    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::student::Entity")]
    Student,

    #[sea_orm(has_one = "super::personnel::Entity")]
    Personnel,

    #[sea_orm(has_one = "super::admin::Entity")]
    Admin,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::personnel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Personnel.def()
    }
}

impl Related<super::admin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admin.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields needed to insert a user row; the password is hashed on the way in.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub phone_number: Option<&'a str>,
    pub role_type: RoleType,
}

impl Model {
    pub async fn create<C: ConnectionTrait>(db: &C, new: NewUser<'_>) -> Result<Model, DbErr> {
        let now = Utc::now();
        let active = ActiveModel {
            first_name: Set(new.first_name.trim().to_owned()),
            last_name: Set(new.last_name.trim().to_owned()),
            email: Set(new.email.trim().to_lowercase()),
            password_hash: Set(Self::hash_password(new.password)?),
            phone_number: Set(new.phone_number.map(str::to_owned)),
            role_type: Set(new.role_type),
            photo: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        active.insert(db).await
    }

    pub async fn find_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::Email.eq(email.trim().to_lowercase()))
            .one(db)
            .await
    }

    pub fn hash_password(password: &str) -> Result<String, DbErr> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| DbErr::Custom(format!("Password hashing failed: {e}")))
    }

    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHash::new(&self.password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
