use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::ExamAssignment;
use crate::db::types::AssignmentStatus;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignExams {
    #[serde(alias = "studentEmail")]
    #[validate(email(message = "student_email must be a valid email"))]
    pub(crate) student_email: String,
    #[serde(alias = "examIds")]
    #[validate(length(min = 1, message = "exam_ids must not be empty"))]
    pub(crate) exam_ids: Vec<String>,
    #[serde(default)]
    #[serde(alias = "departmentId")]
    pub(crate) department_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RevokeAssignments {
    #[serde(alias = "assignmentIds")]
    #[validate(length(min = 1, message = "assignment_ids must not be empty"))]
    pub(crate) assignment_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignOutcome {
    pub(crate) assigned: Vec<AssignmentResponse>,
    /// Exam ids that were skipped: unknown exam, or an active assignment
    /// for this student already exists.
    pub(crate) skipped: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RevokeOutcome {
    pub(crate) revoked: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_email: String,
    pub(crate) student_id: Option<String>,
    pub(crate) department_id: Option<String>,
    pub(crate) status: AssignmentStatus,
    pub(crate) assigned_by: String,
    pub(crate) created_at: String,
}

impl AssignmentResponse {
    pub(crate) fn from_db(assignment: ExamAssignment) -> Self {
        Self {
            id: assignment.id,
            exam_id: assignment.exam_id,
            student_email: assignment.student_email,
            student_id: assignment.student_id,
            department_id: assignment.department_id,
            status: assignment.status,
            assigned_by: assignment.assigned_by,
            created_at: format_primitive(assignment.created_at),
        }
    }
}
