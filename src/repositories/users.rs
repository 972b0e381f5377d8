use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::User;
use crate::db::types::{AccountStatus, UserRole};

const COLUMNS: &str = "\
    id, email, hashed_password, full_name, role, account_status, \
    institution_id, department_id, profile_completed, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) email: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) full_name: &'a str,
    pub(crate) role: UserRole,
    pub(crate) account_status: AccountStatus,
    pub(crate) institution_id: Option<&'a str>,
    pub(crate) department_id: Option<&'a str>,
    pub(crate) profile_completed: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateUser<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, email, hashed_password, full_name, role, account_status,
            institution_id, department_id, profile_completed, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.full_name)
    .bind(params.role)
    .bind(params.account_status)
    .bind(params.institution_id)
    .bind(params.department_id)
    .bind(params.profile_completed)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) struct UpdateUser {
    pub(crate) full_name: Option<String>,
    pub(crate) role: Option<UserRole>,
    pub(crate) account_status: Option<AccountStatus>,
    pub(crate) hashed_password: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(pool: &PgPool, id: &str, params: UpdateUser) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET
            full_name = COALESCE($1, full_name),
            role = COALESCE($2, role),
            account_status = COALESCE($3, account_status),
            hashed_password = COALESCE($4, hashed_password),
            updated_at = $5
         WHERE id = $6",
    )
    .bind(params.full_name)
    .bind(params.role)
    .bind(params.account_status)
    .bind(params.hashed_password)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) struct UpdateProfile<'a> {
    pub(crate) full_name: Option<&'a str>,
    pub(crate) institution_id: Option<&'a str>,
    pub(crate) department_id: Option<&'a str>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update_profile(
    pool: &PgPool,
    id: &str,
    params: UpdateProfile<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET
            full_name = COALESCE($1, full_name),
            institution_id = COALESCE($2, institution_id),
            department_id = COALESCE($3, department_id),
            profile_completed = TRUE,
            updated_at = $4
         WHERE id = $5",
    )
    .bind(params.full_name)
    .bind(params.institution_id)
    .bind(params.department_id)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    role: Option<UserRole>,
    skip: i64,
    limit: i64,
) -> Result<Vec<User>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM users WHERE TRUE"));

    if let Some(role) = role {
        builder.push(" AND role = ");
        builder.push_bind(role);
    }

    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<User>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, role: Option<UserRole>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");

    if let Some(role) = role {
        builder.push(" AND role = ");
        builder.push_bind(role);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}
