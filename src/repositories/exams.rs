use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Exam;

pub(crate) const COLUMNS: &str = "\
    id, title, description, department_id, start_time, end_time, duration_minutes, \
    unique_code, shuffle_questions, auto_grade, created_by, created_at, updated_at";

pub(crate) struct CreateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) department_id: Option<&'a str>,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) duration_minutes: i32,
    pub(crate) unique_code: &'a str,
    pub(crate) shuffle_questions: bool,
    pub(crate) auto_grade: bool,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            id, title, description, department_id, start_time, end_time, duration_minutes,
            unique_code, shuffle_questions, auto_grade, created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.department_id)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.duration_minutes)
    .bind(params.unique_code)
    .bind(params.shuffle_questions)
    .bind(params.auto_grade)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn exists_by_unique_code(
    pool: &PgPool,
    unique_code: &str,
) -> Result<bool, sqlx::Error> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT id FROM exams WHERE unique_code = $1")
            .bind(unique_code)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

pub(crate) async fn list(
    pool: &PgPool,
    created_by: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Exam>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM exams WHERE TRUE"));

    if let Some(created_by) = created_by {
        builder.push(" AND created_by = ");
        builder.push_bind(created_by);
    }

    builder.push(" ORDER BY start_time DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Exam>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, created_by: Option<&str>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM exams WHERE TRUE");

    if let Some(created_by) = created_by {
        builder.push(" AND created_by = ");
        builder.push_bind(created_by);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) struct UpdateExam {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) department_id: Option<String>,
    pub(crate) start_time: Option<PrimitiveDateTime>,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) shuffle_questions: Option<bool>,
    pub(crate) auto_grade: Option<bool>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(pool: &PgPool, id: &str, params: UpdateExam) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exams SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            department_id = COALESCE($3, department_id),
            start_time = COALESCE($4, start_time),
            end_time = COALESCE($5, end_time),
            duration_minutes = COALESCE($6, duration_minutes),
            shuffle_questions = COALESCE($7, shuffle_questions),
            auto_grade = COALESCE($8, auto_grade),
            updated_at = $9
         WHERE id = $10",
    )
    .bind(params.title)
    .bind(params.description)
    .bind(params.department_id)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.duration_minutes)
    .bind(params.shuffle_questions)
    .bind(params.auto_grade)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
