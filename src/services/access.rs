use crate::api::errors::ApiError;
use crate::db::models::{ExamAssignment, User};
use crate::repositories;

/// Resolves whether a student may access an exam: an active assignment must
/// exist matching either the student id or the student email.
pub(crate) async fn require_exam_access(
    pool: &sqlx::PgPool,
    exam_id: &str,
    student: &User,
) -> Result<ExamAssignment, ApiError> {
    let assignment = repositories::assignments::find_active_for_exam(
        pool,
        exam_id,
        &student.id,
        &student.email,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to verify exam access"))?;

    assignment.ok_or(ApiError::Forbidden("You are not assigned to this exam"))
}
