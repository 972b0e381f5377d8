use sqlx::PgPool;

use crate::db::models::ExamSession;
use crate::db::types::SessionStatus;

pub(crate) const COLUMNS: &str = "\
    id, exam_id, student_id, status, started_at, completed_at, \
    total_score, violations_count, created_at, updated_at";

pub(crate) struct CreateSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) started_at: time::PrimitiveDateTime,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!("SELECT {COLUMNS} FROM exam_sessions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_exam_and_student(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    student_id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions WHERE exam_id = $1 AND student_id = $2"
    ))
    .bind(exam_id)
    .bind(student_id)
    .fetch_optional(executor)
    .await
}

/// Serializes concurrent start calls for one (exam, student) pair within the
/// surrounding transaction.
pub(crate) async fn acquire_exam_student_lock(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    student_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("exam_session:{exam_id}:{student_id}"))
        .execute(executor)
        .await?;
    Ok(())
}

/// Conditional insert backed by the (exam_id, student_id) unique constraint;
/// returns false when a session row already exists.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    session: CreateSession<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO exam_sessions (
            id, exam_id, student_id, status, started_at,
            total_score, violations_count, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,0,0,$6,$7)
        ON CONFLICT (exam_id, student_id) DO NOTHING",
    )
    .bind(session.id)
    .bind(session.exam_id)
    .bind(session.student_id)
    .bind(SessionStatus::InProgress)
    .bind(session.started_at)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn complete(
    pool: &PgPool,
    id: &str,
    total_score: f64,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_sessions
         SET status = $1, completed_at = $2, total_score = $3, updated_at = $2
         WHERE id = $4",
    )
    .bind(SessionStatus::Completed)
    .bind(now)
    .bind(total_score)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn list_completed_by_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions
         WHERE student_id = $1 AND status = $2
         ORDER BY completed_at DESC NULLS LAST"
    ))
    .bind(student_id)
    .bind(SessionStatus::Completed)
    .fetch_all(pool)
    .await
}
