use sqlx::PgPool;

use crate::db::models::StudentResponse;
use crate::db::types::GradingStatus;

const COLUMNS: &str = "\
    id, exam_session_id, student_id, answers, total_score, \
    grading_status, created_at, updated_at";

pub(crate) async fn find_by_session_and_student(
    pool: &PgPool,
    exam_session_id: &str,
    student_id: &str,
) -> Result<Option<StudentResponse>, sqlx::Error> {
    sqlx::query_as::<_, StudentResponse>(&format!(
        "SELECT {COLUMNS} FROM student_responses
         WHERE exam_session_id = $1 AND student_id = $2"
    ))
    .bind(exam_session_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

/// Create-or-replace keyed by (exam_session_id, student_id); the whole answers
/// map is overwritten, individual entries are never merged.
pub(crate) async fn upsert_answers(
    pool: &PgPool,
    id: &str,
    exam_session_id: &str,
    student_id: &str,
    answers: serde_json::Value,
    now: time::PrimitiveDateTime,
) -> Result<StudentResponse, sqlx::Error> {
    sqlx::query_as::<_, StudentResponse>(&format!(
        "INSERT INTO student_responses (
            id, exam_session_id, student_id, answers, total_score,
            grading_status, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,0,$5,$6,$6)
        ON CONFLICT (exam_session_id, student_id)
        DO UPDATE SET answers = EXCLUDED.answers, updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(exam_session_id)
    .bind(student_id)
    .bind(answers)
    .bind(GradingStatus::Pending)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn finalize(
    pool: &PgPool,
    exam_session_id: &str,
    student_id: &str,
    total_score: f64,
    grading_status: GradingStatus,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE student_responses
         SET total_score = $1, grading_status = $2, updated_at = $3
         WHERE exam_session_id = $4 AND student_id = $5",
    )
    .bind(total_score)
    .bind(grading_status)
    .bind(now)
    .bind(exam_session_id)
    .bind(student_id)
    .execute(pool)
    .await?;
    Ok(())
}
