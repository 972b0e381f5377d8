use sqlx::PgPool;

use crate::db::models::Question;
use crate::db::types::QuestionKind;

const COLUMNS: &str =
    "id, exam_id, kind, prompt, options, correct_answer, points, position, created_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) kind: QuestionKind,
    pub(crate) prompt: &'a str,
    pub(crate) options: serde_json::Value,
    pub(crate) correct_answer: Option<&'a str>,
    pub(crate) points: f64,
    pub(crate) position: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, exam_id, kind, prompt, options, correct_answer, points, position, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.kind)
    .bind(params.prompt)
    .bind(params.options)
    .bind(params.correct_answer)
    .bind(params.points)
    .bind(params.position)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY position ASC, created_at ASC"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn delete(pool: &PgPool, exam_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1 AND exam_id = $2")
        .bind(id)
        .bind(exam_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
