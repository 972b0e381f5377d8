use sqlx::PgPool;

use crate::db::models::Institution;

const COLUMNS: &str = "id, name, created_at, updated_at";

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    name: &str,
    now: time::PrimitiveDateTime,
) -> Result<Institution, sqlx::Error> {
    sqlx::query_as::<_, Institution>(&format!(
        "INSERT INTO institutions (id, name, created_at, updated_at)
         VALUES ($1,$2,$3,$4)
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(name)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Institution>, sqlx::Error> {
    sqlx::query_as::<_, Institution>(&format!("SELECT {COLUMNS} FROM institutions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_name_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT name FROM institutions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Institution>, sqlx::Error> {
    sqlx::query_as::<_, Institution>(&format!(
        "SELECT {COLUMNS} FROM institutions ORDER BY name ASC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn update_name(
    pool: &PgPool,
    id: &str,
    name: &str,
    now: time::PrimitiveDateTime,
) -> Result<Option<Institution>, sqlx::Error> {
    sqlx::query_as::<_, Institution>(&format!(
        "UPDATE institutions SET name = $1, updated_at = $2 WHERE id = $3
         RETURNING {COLUMNS}",
    ))
    .bind(name)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

// Departments are removed through the ON DELETE CASCADE foreign key.
pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM institutions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
