//! Complaint state machine.
//!
//! ```text
//! pending ──respond──▶ answered ──complete──▶ completed
//!    │                   │  ▲
//!    │                   └──┘ student reply / staff follow-up
//!    ├──reject──▶ rejected
//!    └──complete──▶ completed
//! ```
//!
//! `rejected` and `completed` are terminal, as is any complaint carrying a completion
//! stamp. [`check`] is pure: it decides whether an event is legal given the stored
//! complaint and the latest staff-authored response, and what status follows.

use crate::service::{AppError, ServiceResult};
use db::models::complaint::{ComplaintStatus, Model as Complaint};
use db::models::complaint_response::Model as Response;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Respond,
    Reject,
    StudentReply,
    Complete,
    Update,
    Delete,
}

impl Event {
    fn verb(self) -> &'static str {
        match self {
            Event::Respond => "respond to",
            Event::Reject => "reject",
            Event::StudentReply => "reply to",
            Event::Complete => "complete",
            Event::Update => "edit",
            Event::Delete => "delete",
        }
    }
}

/// Returns the status the complaint holds after `event`, or `InvalidState`.
///
/// `latest_staff` must be the most recent response row carrying a staff message.
pub fn check(
    event: Event,
    complaint: &Complaint,
    latest_staff: Option<&Response>,
) -> ServiceResult<ComplaintStatus> {
    if complaint.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "Cannot {} a complaint that is already {}",
            event.verb(),
            complaint.status
        )));
    }

    use ComplaintStatus::*;
    match (event, complaint.status) {
        (Event::Respond, Pending) => Ok(Answered),
        (Event::Respond, Answered) => match latest_staff {
            Some(r) if r.has_student_reply() => Ok(Answered),
            _ => Err(AppError::InvalidState(
                "The student has not replied to the last response yet".into(),
            )),
        },

        (Event::Reject, Pending) => Ok(Rejected),
        (Event::Reject, _) => Err(AppError::InvalidState(
            "Only pending complaints can be rejected".into(),
        )),

        (Event::StudentReply, Answered) => match latest_staff {
            Some(r) if r.awaits_student_reply() => Ok(Answered),
            Some(_) => Err(AppError::InvalidState(
                "The latest response has already been replied to".into(),
            )),
            None => Err(AppError::InvalidState(
                "There is no staff response to reply to".into(),
            )),
        },
        (Event::StudentReply, _) => Err(AppError::InvalidState(
            "There is no staff response to reply to".into(),
        )),

        (Event::Complete, Pending | Answered) => Ok(Completed),

        (Event::Update, Pending) => Ok(Pending),
        (Event::Update, _) => Err(AppError::InvalidState(
            "Complaints can only be edited while pending".into(),
        )),

        (Event::Delete, status) => Ok(status),

        (event, status) => Err(AppError::InvalidState(format!(
            "Cannot {} a complaint that is {}",
            event.verb(),
            status
        ))),
    }
}

/// True when the complaint belongs in the staff pending queue: untouched, or
/// answered with the student's reply waiting on staff.
pub fn needs_staff_attention(complaint: &Complaint, latest_staff: Option<&Response>) -> bool {
    if complaint.is_completed() {
        return false;
    }
    match complaint.status {
        ComplaintStatus::Pending => true,
        ComplaintStatus::Answered => latest_staff.is_some_and(Response::has_student_reply),
        _ => false,
    }
}
