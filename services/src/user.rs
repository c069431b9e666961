use crate::photo::{PhotoStore, PhotoUpload};
use crate::policy::{self, Action, Actor, Target};
use crate::profile::{ProfileManager, RoleProfile};
use crate::service::{AppError, Paginated, ServiceResult, validate};
use chrono::{DateTime, NaiveDate, Utc};
use db::models::{
    department,
    user::{self, NewUser, RoleType},
};
use db::repository::Repository;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use util::filters::{FilterParam, Pagination, QueryParam};
use validator::Validate;

type UserRepo = Repository<user::Entity, user::Column>;

pub const UPLOADS_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterStudent {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub phone_number: Option<String>,
    pub role_type: String,
    pub photo: Option<PhotoUpload>,
}

/// Partial account edit. `phone_number: Some(None)` clears the number.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    pub phone_number: Option<Option<String>>,
    pub role_type: Option<String>,
    pub photo: Option<PhotoUpload>,
    pub remove_photo: bool,
}

/// What a user may change about their own account.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<Option<String>>,
    pub password: Option<String>,
    pub photo: Option<PhotoUpload>,
    pub remove_photo: bool,
}

impl From<UpdateProfile> for UpdateUser {
    fn from(p: UpdateProfile) -> Self {
        UpdateUser {
            first_name: p.first_name,
            last_name: p.last_name,
            email: None,
            password: p.password,
            phone_number: p.phone_number,
            role_type: None,
            photo: p.photo,
            remove_photo: p.remove_photo,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    #[serde(alias = "roleType", alias = "role_type")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProfileView {
    Student {
        id: i64,
        student_number: String,
        enrollment_year: i32,
        current_year: i32,
    },
    Personnel {
        id: i64,
        employee_number: String,
        position: String,
        department_id: i64,
        department: Option<String>,
        hire_date: NaiveDate,
    },
    Admin {
        id: i64,
        admin_level: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role_type: RoleType,
    pub photo_url: Option<String>,
    pub profile: Option<ProfileView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

pub struct UserService;

impl UserService {
    // ↓↓↓ AUTHENTICATION ↓↓↓

    /// Public sign-up. Always creates a student.
    pub async fn register(
        db: &DatabaseConnection,
        mut input: RegisterStudent,
    ) -> ServiceResult<UserView> {
        input.first_name = input.first_name.trim().to_owned();
        input.last_name = input.last_name.trim().to_owned();
        input.email = input.email.trim().to_lowercase();
        validate(&input)?;
        Self::ensure_email_free(db, &input.email, None).await?;

        let txn = db.begin().await?;
        let user = user::Model::create(
            &txn,
            NewUser {
                first_name: &input.first_name,
                last_name: &input.last_name,
                email: &input.email,
                password: &input.password,
                phone_number: trimmed(input.phone_number).as_deref(),
                role_type: RoleType::Student,
            },
        )
        .await?;
        ProfileManager::create_profile(&txn, user.id, RoleType::Student).await?;
        txn.commit().await?;

        info!(user_id = user.id, "Student registered");
        Self::view(db, &user).await
    }

    /// Email and password check. Any mismatch reads the same to the caller.
    pub async fn authenticate(
        db: &DatabaseConnection,
        email: &str,
        password: &str,
    ) -> ServiceResult<user::Model> {
        match user::Model::find_by_email(db, email).await? {
            Some(user) if user.verify_password(password) => Ok(user),
            _ => {
                warn!(email = %email.trim(), "Failed login attempt");
                Err(AppError::Unauthenticated)
            }
        }
    }

    /// Turns a credential's subject into an [`Actor`]. The credential's role must still
    /// be the account's role.
    pub async fn resolve_actor(
        db: &DatabaseConnection,
        user_id: i64,
        claimed_role: Option<RoleType>,
    ) -> ServiceResult<(user::Model, Actor)> {
        let user = user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or(AppError::Unauthenticated)?;
        if claimed_role.is_some_and(|role| role != user.role_type) {
            return Err(AppError::Unauthenticated);
        }
        let actor = ProfileManager::actor_for(db, &user).await?;
        Ok((user, actor))
    }

    // ↓↓↓ READ ↓↓↓

    pub async fn view(db: &DatabaseConnection, user: &user::Model) -> ServiceResult<UserView> {
        let profile = match ProfileManager::load(db, user).await? {
            None => None,
            Some(RoleProfile::Student(s)) => Some(ProfileView::Student {
                id: s.id,
                student_number: s.student_number,
                enrollment_year: s.enrollment_year,
                current_year: s.current_year,
            }),
            Some(RoleProfile::Personnel(p)) => {
                let department = department::Entity::find_by_id(p.department_id)
                    .one(db)
                    .await?
                    .map(|d| d.name);
                Some(ProfileView::Personnel {
                    id: p.id,
                    employee_number: p.employee_number,
                    position: p.position,
                    department_id: p.department_id,
                    department,
                    hire_date: p.hire_date,
                })
            }
            Some(RoleProfile::Admin(a)) => Some(ProfileView::Admin {
                id: a.id,
                admin_level: a.admin_level,
            }),
        };

        Ok(UserView {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            role_type: user.role_type,
            photo_url: user.photo.as_ref().map(|p| format!("{UPLOADS_PREFIX}/{p}")),
            profile,
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }

    /// The caller's own account.
    pub async fn me(db: &DatabaseConnection, actor: &Actor) -> ServiceResult<UserView> {
        let user = Self::load(db, actor.user_id).await?;
        Self::view(db, &user).await
    }

    pub async fn get_user(
        db: &DatabaseConnection,
        actor: &Actor,
        id: i64,
    ) -> ServiceResult<UserView> {
        policy::authorize(Some(actor), Action::ManageUsers, Target::None)?;
        let user = Self::load(db, id).await?;
        Self::view(db, &user).await
    }

    pub async fn list_users(
        db: &DatabaseConnection,
        actor: &Actor,
        query: &UserQuery,
    ) -> ServiceResult<Paginated<UserView>> {
        policy::authorize(Some(actor), Action::ManageUsers, Target::None)?;

        let mut filters = Vec::new();
        if let Some(role) = trimmed(query.role.clone()) {
            let role = ProfileManager::parse_role(&role)?;
            filters.push(FilterParam::eq("role_type", role.to_string()));
        }
        let search = match trimmed(query.search.clone()) {
            Some(s) => vec![QueryParam::new(&["first_name", "last_name", "email"], &s)],
            None => Vec::new(),
        };

        let pagination = Pagination::new(query.page, query.limit, 10);
        let (users, total) = UserRepo::filter(
            db,
            &filters,
            &search,
            pagination.page,
            pagination.limit,
            Some("-created_at,-id".to_string()),
        )
        .await?;

        let mut views = Vec::with_capacity(users.len());
        for u in &users {
            views.push(Self::view(db, u).await?);
        }
        Ok(Paginated::new(views, total, pagination))
    }

    // ↓↓↓ WRITE ↓↓↓

    pub async fn create_user(
        db: &DatabaseConnection,
        actor: &Actor,
        mut input: CreateUser,
    ) -> ServiceResult<UserView> {
        policy::authorize(Some(actor), Action::ManageUsers, Target::None)?;
        input.first_name = input.first_name.trim().to_owned();
        input.last_name = input.last_name.trim().to_owned();
        input.email = input.email.trim().to_lowercase();
        validate(&input)?;
        let role = ProfileManager::parse_role(&input.role_type)?;
        if let Some(photo) = &input.photo {
            photo.validate()?;
        }
        Self::ensure_email_free(db, &input.email, None).await?;

        let txn = db.begin().await?;
        let user = user::Model::create(
            &txn,
            NewUser {
                first_name: &input.first_name,
                last_name: &input.last_name,
                email: &input.email,
                password: &input.password,
                phone_number: trimmed(input.phone_number).as_deref(),
                role_type: role,
            },
        )
        .await?;
        ProfileManager::create_profile(&txn, user.id, role).await?;

        let mut stored = None;
        let user = match &input.photo {
            Some(upload) => {
                let relative = PhotoStore::store(user.id, upload).await?;
                stored = Some(relative.clone());
                let mut active: user::ActiveModel = user.into();
                active.photo = Set(Some(relative));
                active.update(&txn).await?
            }
            None => user,
        };

        if let Err(e) = txn.commit().await {
            if let Some(relative) = stored {
                PhotoStore::remove_best_effort(&relative).await;
            }
            return Err(e.into());
        }

        info!(user_id = user.id, role = %role, created_by = actor.user_id, "Created account");
        Self::view(db, &user).await
    }

    pub async fn update_user(
        db: &DatabaseConnection,
        actor: &Actor,
        id: i64,
        input: UpdateUser,
    ) -> ServiceResult<UserView> {
        policy::authorize(Some(actor), Action::ManageUsers, Target::None)?;
        Self::apply_update(db, id, input).await
    }

    /// Self-service edit of the caller's own account.
    pub async fn update_own_profile(
        db: &DatabaseConnection,
        actor: &Actor,
        input: UpdateProfile,
    ) -> ServiceResult<UserView> {
        Self::apply_update(db, actor.user_id, input.into()).await
    }

    pub async fn delete_user(db: &DatabaseConnection, actor: &Actor, id: i64) -> ServiceResult<()> {
        policy::authorize(Some(actor), Action::ManageUsers, Target::None)?;
        if actor.user_id == id {
            return Err(AppError::Forbidden("You cannot delete your own account".into()));
        }
        let user = Self::load(db, id).await?;

        let txn = db.begin().await?;
        ProfileManager::detach(&txn, &user).await?;
        user::Entity::delete_by_id(user.id).exec(&txn).await?;
        txn.commit().await?;

        if let Some(photo) = &user.photo {
            PhotoStore::remove_best_effort(photo).await;
        }
        info!(user_id = id, deleted_by = actor.user_id, "Deleted account");
        Ok(())
    }

    // ↓↓↓ HELPERS ↓↓↓

    async fn load(db: &DatabaseConnection, id: i64) -> ServiceResult<user::Model> {
        user::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn ensure_email_free(
        db: &DatabaseConnection,
        email: &str,
        except_user: Option<i64>,
    ) -> ServiceResult<()> {
        match user::Model::find_by_email(db, email).await? {
            Some(existing) if Some(existing.id) != except_user => Err(AppError::Conflict(
                "An account with this email already exists".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Validates everything first, then writes field changes, the role swap and a new
    /// photo reference in one transaction. Old photo files are removed afterwards.
    async fn apply_update(
        db: &DatabaseConnection,
        id: i64,
        mut input: UpdateUser,
    ) -> ServiceResult<UserView> {
        input.first_name = input.first_name.map(|v| v.trim().to_owned());
        input.last_name = input.last_name.map(|v| v.trim().to_owned());
        input.email = input.email.map(|v| v.trim().to_lowercase());
        validate(&input)?;
        let new_role = input
            .role_type
            .as_deref()
            .map(ProfileManager::parse_role)
            .transpose()?;
        if let Some(photo) = &input.photo {
            photo.validate()?;
        }

        let user = Self::load(db, id).await?;
        if let Some(email) = &input.email {
            Self::ensure_email_free(db, email, Some(user.id)).await?;
        }

        let old_photo = user.photo.clone();
        let mut active: user::ActiveModel = user.clone().into();
        if let Some(v) = input.first_name {
            active.first_name = Set(v);
        }
        if let Some(v) = input.last_name {
            active.last_name = Set(v);
        }
        if let Some(v) = input.email {
            active.email = Set(v);
        }
        if let Some(v) = input.phone_number {
            active.phone_number = Set(trimmed(v));
        }
        if let Some(password) = input.password.as_deref() {
            active.password_hash = Set(user::Model::hash_password(password)?);
        }

        if input.photo.is_none() && input.remove_photo {
            if let Some(old) = &old_photo {
                PhotoStore::remove(old).await?;
            }
            active.photo = Set(None);
        }

        let mut stored = None;
        if let Some(upload) = &input.photo {
            let relative = PhotoStore::store(user.id, upload).await?;
            active.photo = Set(Some(relative.clone()));
            stored = Some(relative);
        }
        active.updated_at = Set(Utc::now());

        let txn = db.begin().await?;
        let outcome = async {
            let updated = active.update(&txn).await?;
            match new_role {
                Some(role) if role != user.role_type => {
                    ProfileManager::change_role(&txn, &user, role).await?;
                }
                _ => {}
            }
            Ok::<_, AppError>(updated)
        }
        .await;

        let updated = match outcome {
            Ok(updated) => {
                txn.commit().await?;
                updated
            }
            Err(e) => {
                drop(txn);
                if let Some(relative) = stored {
                    PhotoStore::remove_best_effort(&relative).await;
                }
                return Err(e);
            }
        };

        if let (Some(new), Some(old)) = (&stored, &old_photo) {
            if new != old {
                PhotoStore::remove_best_effort(old).await;
            }
        }

        let updated = match new_role {
            Some(role) if role != user.role_type => Self::load(db, updated.id).await?,
            _ => updated,
        };
        info!(user_id = updated.id, "Updated account");
        Self::view(db, &updated).await
    }
}
