//! Keeps every account paired with exactly one role profile.
//!
//! A role change is a destructive swap: the old profile is detached from whatever
//! references it, deleted, and a fresh profile for the new role is created with
//! generated defaults. Call [`ProfileManager::change_role`] inside a transaction.

use crate::policy::{Actor, Profile};
use crate::service::{AppError, ServiceResult};
use chrono::Utc;
use db::models::{
    admin, complaint, complaint_response, department, personnel, student,
    user::{self, RoleType},
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set};
use std::str::FromStr;
use tracing::info;

/// The loaded profile row of an account, tagged by role.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleProfile {
    Student(student::Model),
    Personnel(personnel::Model),
    Admin(admin::Model),
}

impl RoleProfile {
    pub fn role(&self) -> RoleType {
        match self {
            RoleProfile::Student(_) => RoleType::Student,
            RoleProfile::Personnel(_) => RoleType::Personnel,
            RoleProfile::Admin(_) => RoleType::Admin,
        }
    }

    pub fn profile(&self) -> Profile {
        match self {
            RoleProfile::Student(s) => Profile::Student { student_id: s.id },
            RoleProfile::Personnel(p) => Profile::Personnel { personnel_id: p.id },
            RoleProfile::Admin(a) => Profile::Admin { admin_id: a.id },
        }
    }
}

pub struct ProfileManager;

impl ProfileManager {
    pub fn parse_role(raw: &str) -> ServiceResult<RoleType> {
        RoleType::from_str(raw.trim()).map_err(|_| {
            AppError::Validation(format!(
                "Unknown role '{}', expected student, personnel or admin",
                raw.trim()
            ))
        })
    }

    /// Inserts the profile row for `role` with generated defaults.
    pub async fn create_profile<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        role: RoleType,
    ) -> ServiceResult<RoleProfile> {
        let profile = match role {
            RoleType::Student => {
                RoleProfile::Student(student::Model::create_for_user(db, user_id).await?)
            }
            RoleType::Personnel => {
                let department = department::Model::resolve_default(db).await?;
                RoleProfile::Personnel(
                    personnel::Model::create_for_user(db, user_id, department.id).await?,
                )
            }
            RoleType::Admin => {
                RoleProfile::Admin(admin::Model::create_for_user(db, user_id).await?)
            }
        };
        Ok(profile)
    }

    /// The profile matching the account's current role, if present.
    pub async fn load<C: ConnectionTrait>(
        db: &C,
        user: &user::Model,
    ) -> ServiceResult<Option<RoleProfile>> {
        let profile = match user.role_type {
            RoleType::Student => student::Model::find_by_user(db, user.id)
                .await?
                .map(RoleProfile::Student),
            RoleType::Personnel => personnel::Model::find_by_user(db, user.id)
                .await?
                .map(RoleProfile::Personnel),
            RoleType::Admin => admin::Model::find_by_user(db, user.id)
                .await?
                .map(RoleProfile::Admin),
        };
        Ok(profile)
    }

    pub async fn actor_for<C: ConnectionTrait>(
        db: &C,
        user: &user::Model,
    ) -> ServiceResult<Actor> {
        let profile = Self::load(db, user).await?.ok_or_else(|| {
            AppError::Forbidden("This account has no active role profile".into())
        })?;
        Ok(Actor {
            user_id: user.id,
            profile: profile.profile(),
        })
    }

    /// Swaps the account's profile for one matching `new_role`. A no-op when the role is
    /// unchanged and the profile exists.
    pub async fn change_role<C: ConnectionTrait>(
        db: &C,
        user: &user::Model,
        new_role: RoleType,
    ) -> ServiceResult<RoleProfile> {
        if user.role_type == new_role {
            if let Some(existing) = Self::load(db, user).await? {
                return Ok(existing);
            }
            return Self::create_profile(db, user.id, new_role).await;
        }

        Self::detach(db, user).await?;

        user::Entity::update_many()
            .set(user::ActiveModel {
                role_type: Set(new_role),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(user::Column::Id.eq(user.id))
            .exec(db)
            .await?;

        let profile = Self::create_profile(db, user.id, new_role).await?;
        info!(
            user_id = user.id,
            from = %user.role_type,
            to = %new_role,
            "Changed account role"
        );
        Ok(profile)
    }

    /// Removes whatever profile rows the account has, clearing references to them first.
    ///
    /// A student's complaints and their threads go with the profile. Complaints a staff
    /// member handled stay, with personnel references cleared; completion and response
    /// credits move to the user account so completed complaints keep their stamp.
    pub(crate) async fn detach<C: ConnectionTrait>(
        db: &C,
        user: &user::Model,
    ) -> ServiceResult<()> {
        if let Some(s) = student::Model::find_by_user(db, user.id).await? {
            let complaint_ids: Vec<i64> = complaint::Entity::find()
                .select_only()
                .column(complaint::Column::Id)
                .filter(complaint::Column::StudentId.eq(s.id))
                .into_tuple()
                .all(db)
                .await?;

            if !complaint_ids.is_empty() {
                complaint_response::Entity::delete_many()
                    .filter(complaint_response::Column::ComplaintId.is_in(complaint_ids.clone()))
                    .exec(db)
                    .await?;
                complaint::Entity::delete_many()
                    .filter(complaint::Column::Id.is_in(complaint_ids.clone()))
                    .exec(db)
                    .await?;
            }
            student::Entity::delete_by_id(s.id).exec(db).await?;
            info!(
                user_id = user.id,
                complaints = complaint_ids.len(),
                "Removed student profile"
            );
        }

        if let Some(p) = personnel::Model::find_by_user(db, user.id).await? {
            complaint::Entity::update_many()
                .set(complaint::ActiveModel {
                    handled_by_personnel_id: Set(None),
                    ..Default::default()
                })
                .filter(complaint::Column::HandledByPersonnelId.eq(p.id))
                .exec(db)
                .await?;

            complaint::Entity::update_many()
                .set(complaint::ActiveModel {
                    completed_by_personnel_id: Set(None),
                    completed_by_user_id: Set(Some(user.id)),
                    ..Default::default()
                })
                .filter(complaint::Column::CompletedByPersonnelId.eq(p.id))
                .exec(db)
                .await?;

            complaint_response::Entity::update_many()
                .set(complaint_response::ActiveModel {
                    responded_by_personnel_id: Set(None),
                    responded_by_user_id: Set(Some(user.id)),
                    ..Default::default()
                })
                .filter(complaint_response::Column::RespondedByPersonnelId.eq(p.id))
                .exec(db)
                .await?;

            personnel::Entity::delete_by_id(p.id).exec(db).await?;
            info!(user_id = user.id, personnel_id = p.id, "Removed personnel profile");
        }

        if let Some(a) = admin::Model::find_by_user(db, user.id).await? {
            admin::Entity::delete_by_id(a.id).exec(db).await?;
            info!(user_id = user.id, "Removed admin profile");
        }

        Ok(())
    }
}
