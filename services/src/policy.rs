//! Authorization rules for every complaint and account operation.
//!
//! All permission decisions go through [`can`]. Callers resolve the acting user into an
//! [`Actor`] once (or pass `None` for anonymous callers) and ask before acting.

use crate::service::{AppError, ServiceResult};
use db::models::complaint;
use db::models::user::RoleType;

/// The single active role profile of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Student { student_id: i64 },
    Personnel { personnel_id: i64 },
    Admin { admin_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub profile: Profile,
}

impl Actor {
    pub fn role(&self) -> RoleType {
        match self.profile {
            Profile::Student { .. } => RoleType::Student,
            Profile::Personnel { .. } => RoleType::Personnel,
            Profile::Admin { .. } => RoleType::Admin,
        }
    }

    pub fn student_id(&self) -> Option<i64> {
        match self.profile {
            Profile::Student { student_id } => Some(student_id),
            _ => None,
        }
    }

    pub fn personnel_id(&self) -> Option<i64> {
        match self.profile {
            Profile::Personnel { personnel_id } => Some(personnel_id),
            _ => None,
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(
            self.profile,
            Profile::Personnel { .. } | Profile::Admin { .. }
        )
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.profile, Profile::Admin { .. })
    }

    fn owns(&self, complaint: &complaint::Model) -> bool {
        self.student_id() == Some(complaint.student_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadPublic,
    CreateComplaint,
    ListStudentComplaints,
    ViewComplaint,
    UpdateComplaint,
    DeleteComplaint,
    StudentReply,
    ListStaffQueues,
    Respond,
    Reject,
    Complete,
    ListAllComplaints,
    ManageUsers,
}

#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    None,
    Complaint(&'a complaint::Model),
    /// The user whose complaint list is requested.
    StudentUser(i64),
}

/// Whether `actor` may perform `action` on `target`.
pub fn can(actor: Option<&Actor>, action: Action, target: Target<'_>) -> bool {
    let public_ok = match target {
        Target::Complaint(c) => c.is_public,
        _ => true,
    };

    let Some(actor) = actor else {
        return action == Action::ReadPublic && public_ok;
    };

    match action {
        Action::ReadPublic => public_ok,
        Action::CreateComplaint => actor.student_id().is_some(),
        Action::ListStudentComplaints => match target {
            Target::StudentUser(user_id) => actor.is_staff() || actor.user_id == user_id,
            _ => false,
        },
        Action::ViewComplaint => match target {
            Target::Complaint(c) => actor.is_staff() || actor.owns(c),
            _ => false,
        },
        Action::UpdateComplaint | Action::StudentReply => match target {
            Target::Complaint(c) => actor.owns(c),
            _ => false,
        },
        Action::DeleteComplaint => match target {
            Target::Complaint(c) => actor.is_admin() || actor.owns(c),
            _ => false,
        },
        Action::ListStaffQueues | Action::Respond | Action::Reject | Action::Complete => {
            actor.is_staff()
        }
        Action::ListAllComplaints | Action::ManageUsers => actor.is_admin(),
    }
}

/// [`can`], turned into an error: anonymous callers get `Unauthenticated`, everyone
/// else `Forbidden`.
pub fn authorize(actor: Option<&Actor>, action: Action, target: Target<'_>) -> ServiceResult<()> {
    if can(actor, action, target) {
        return Ok(());
    }
    match actor {
        None => Err(AppError::Unauthenticated),
        Some(_) => Err(AppError::Forbidden(denial_message(action).to_string())),
    }
}

fn denial_message(action: Action) -> &'static str {
    match action {
        Action::CreateComplaint => "Only students can file complaints",
        Action::UpdateComplaint | Action::StudentReply => {
            "Only the student who filed this complaint can do that"
        }
        Action::DeleteComplaint => "Only the owner or an administrator can delete this complaint",
        Action::ListStaffQueues | Action::Respond | Action::Reject | Action::Complete => {
            "Personnel or administrator access required"
        }
        Action::ListAllComplaints | Action::ManageUsers => "Administrator access required",
        Action::ListStudentComplaints | Action::ViewComplaint | Action::ReadPublic => {
            "You do not have access to this complaint"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use db::models::complaint::ComplaintStatus;

    fn complaint(student_id: i64, is_public: bool) -> complaint::Model {
        complaint::Model {
            id: 1,
            unique_code: "ABCDEFGHIJ".into(),
            title: "t".into(),
            description: "d".into(),
            status: ComplaintStatus::Pending,
            student_id,
            complaint_type_id: 1,
            course_id: None,
            handled_by_personnel_id: None,
            completed_by_personnel_id: None,
            completed_by_user_id: None,
            is_public,
            is_anonymous: false,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    const OWNER: Actor = Actor {
        user_id: 10,
        profile: Profile::Student { student_id: 1 },
    };
    const OTHER_STUDENT: Actor = Actor {
        user_id: 11,
        profile: Profile::Student { student_id: 2 },
    };
    const STAFF: Actor = Actor {
        user_id: 20,
        profile: Profile::Personnel { personnel_id: 1 },
    };
    const ADMIN: Actor = Actor {
        user_id: 30,
        profile: Profile::Admin { admin_id: 1 },
    };

    #[test]
    fn student_only_actions_require_ownership() {
        let c = complaint(1, false);
        for action in [Action::UpdateComplaint, Action::StudentReply] {
            assert!(can(Some(&OWNER), action, Target::Complaint(&c)));
            assert!(!can(Some(&OTHER_STUDENT), action, Target::Complaint(&c)));
            assert!(!can(Some(&STAFF), action, Target::Complaint(&c)));
            assert!(!can(Some(&ADMIN), action, Target::Complaint(&c)));
        }
    }

    #[test]
    fn delete_is_owner_or_admin() {
        let c = complaint(1, false);
        assert!(can(Some(&OWNER), Action::DeleteComplaint, Target::Complaint(&c)));
        assert!(can(Some(&ADMIN), Action::DeleteComplaint, Target::Complaint(&c)));
        assert!(!can(Some(&STAFF), Action::DeleteComplaint, Target::Complaint(&c)));
        assert!(!can(Some(&OTHER_STUDENT), Action::DeleteComplaint, Target::Complaint(&c)));
    }

    #[test]
    fn staff_transitions_exclude_students() {
        for action in [Action::Respond, Action::Reject, Action::Complete, Action::ListStaffQueues] {
            assert!(can(Some(&STAFF), action, Target::None));
            assert!(can(Some(&ADMIN), action, Target::None));
            assert!(!can(Some(&OWNER), action, Target::None));
            assert!(!can(None, action, Target::None));
        }
    }

    #[test]
    fn anonymous_callers_only_read_public_complaints() {
        let public = complaint(1, true);
        let private = complaint(1, false);
        assert!(can(None, Action::ReadPublic, Target::Complaint(&public)));
        assert!(!can(None, Action::ReadPublic, Target::Complaint(&private)));
        assert!(can(None, Action::ReadPublic, Target::None));
        assert!(!can(None, Action::ViewComplaint, Target::Complaint(&public)));
        assert!(matches!(
            authorize(None, Action::CreateComplaint, Target::None),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn ownership_failures_are_forbidden_not_missing() {
        let c = complaint(1, false);
        assert!(matches!(
            authorize(Some(&OTHER_STUDENT), Action::ViewComplaint, Target::Complaint(&c)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn account_management_is_admin_only() {
        assert!(can(Some(&ADMIN), Action::ManageUsers, Target::None));
        assert!(!can(Some(&STAFF), Action::ManageUsers, Target::None));
        assert!(can(Some(&ADMIN), Action::ListAllComplaints, Target::None));
        assert!(!can(Some(&STAFF), Action::ListAllComplaints, Target::None));
        assert!(!can(Some(&OWNER), Action::ListAllComplaints, Target::None));
    }

    #[test]
    fn student_list_is_self_or_staff() {
        assert!(can(Some(&OWNER), Action::ListStudentComplaints, Target::StudentUser(10)));
        assert!(!can(Some(&OWNER), Action::ListStudentComplaints, Target::StudentUser(11)));
        assert!(can(Some(&STAFF), Action::ListStudentComplaints, Target::StudentUser(11)));
    }
}
