use sqlx::PgPool;

use crate::db::models::Department;

const COLUMNS: &str = "id, name, code, institution_id, created_at, updated_at";

pub(crate) struct CreateDepartment<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) code: Option<&'a str>,
    pub(crate) institution_id: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateDepartment<'_>,
) -> Result<Department, sqlx::Error> {
    sqlx::query_as::<_, Department>(&format!(
        "INSERT INTO departments (id, name, code, institution_id, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.code)
    .bind(params.institution_id)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>(&format!("SELECT {COLUMNS} FROM departments WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    institution_id: Option<&str>,
) -> Result<Vec<Department>, sqlx::Error> {
    match institution_id {
        Some(institution_id) => {
            sqlx::query_as::<_, Department>(&format!(
                "SELECT {COLUMNS} FROM departments WHERE institution_id = $1 ORDER BY name ASC"
            ))
            .bind(institution_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Department>(&format!(
                "SELECT {COLUMNS} FROM departments ORDER BY name ASC"
            ))
            .fetch_all(pool)
            .await
        }
    }
}

pub(crate) struct UpdateDepartment {
    pub(crate) name: Option<String>,
    pub(crate) code: Option<String>,
    pub(crate) institution_id: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateDepartment,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE departments SET
            name = COALESCE($1, name),
            code = COALESCE($2, code),
            institution_id = COALESCE($3, institution_id),
            updated_at = $4
         WHERE id = $5",
    )
    .bind(params.name)
    .bind(params.code)
    .bind(params.institution_id)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM departments WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
