use sqlx::PgPool;

use crate::db::models::ExamAssignment;
use crate::db::types::AssignmentStatus;

pub(crate) const COLUMNS: &str = "\
    id, exam_id, student_email, student_id, department_id, status, \
    assigned_by, created_at, updated_at";

pub(crate) struct CreateAssignment<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) student_email: &'a str,
    pub(crate) student_id: Option<&'a str>,
    pub(crate) department_id: Option<&'a str>,
    pub(crate) assigned_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

/// Returns None when an assignment for (exam_id, student_email) already exists.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAssignment<'_>,
) -> Result<Option<ExamAssignment>, sqlx::Error> {
    sqlx::query_as::<_, ExamAssignment>(&format!(
        "INSERT INTO exam_assignments (
            id, exam_id, student_email, student_id, department_id, status,
            assigned_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        ON CONFLICT (exam_id, student_email) DO NOTHING
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.student_email)
    .bind(params.student_id)
    .bind(params.department_id)
    .bind(AssignmentStatus::Active)
    .bind(params.assigned_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ExamAssignment>, sqlx::Error> {
    sqlx::query_as::<_, ExamAssignment>(&format!(
        "SELECT {COLUMNS} FROM exam_assignments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_active_for_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    student_id: &str,
    student_email: &str,
) -> Result<Option<ExamAssignment>, sqlx::Error> {
    sqlx::query_as::<_, ExamAssignment>(&format!(
        "SELECT {COLUMNS} FROM exam_assignments
         WHERE exam_id = $1
           AND status = $2
           AND (student_id = $3 OR student_email = $4)
         LIMIT 1"
    ))
    .bind(exam_id)
    .bind(AssignmentStatus::Active)
    .bind(student_id)
    .bind(student_email)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_active_for_student(
    pool: &PgPool,
    student_id: &str,
    student_email: &str,
) -> Result<Vec<ExamAssignment>, sqlx::Error> {
    sqlx::query_as::<_, ExamAssignment>(&format!(
        "SELECT {COLUMNS} FROM exam_assignments
         WHERE status = $1
           AND (student_id = $2 OR student_email = $3)
         ORDER BY created_at DESC"
    ))
    .bind(AssignmentStatus::Active)
    .bind(student_id)
    .bind(student_email)
    .fetch_all(pool)
    .await
}

/// Revokes the given assignments; returns the ids that were actually active.
pub(crate) async fn revoke(
    pool: &PgPool,
    ids: &[String],
    now: time::PrimitiveDateTime,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "UPDATE exam_assignments
         SET status = $1, updated_at = $2
         WHERE id = ANY($3) AND status = $4
         RETURNING id",
    )
    .bind(AssignmentStatus::Revoked)
    .bind(now)
    .bind(ids)
    .bind(AssignmentStatus::Active)
    .fetch_all(pool)
    .await
}

/// Links assignments created before the student registered to the new account.
pub(crate) async fn backfill_student_id(
    pool: &PgPool,
    student_email: &str,
    student_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE exam_assignments
         SET student_id = $1, updated_at = $2
         WHERE student_email = $3 AND student_id IS NULL",
    )
    .bind(student_id)
    .bind(now)
    .bind(student_email)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
