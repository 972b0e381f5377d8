use sqlx::PgPool;

use crate::db::models::StudentInvitation;
use crate::db::types::InvitationStatus;

const COLUMNS: &str = "\
    id, email, full_name, department_id, exam_id, status, token_hash, \
    expires_at, accepted_at, student_id, invited_by, created_at, updated_at";

pub(crate) struct CreateInvitation<'a> {
    pub(crate) id: &'a str,
    pub(crate) email: &'a str,
    pub(crate) full_name: &'a str,
    pub(crate) department_id: Option<&'a str>,
    pub(crate) exam_id: Option<&'a str>,
    pub(crate) token_hash: &'a str,
    pub(crate) expires_at: time::PrimitiveDateTime,
    pub(crate) invited_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateInvitation<'_>,
) -> Result<StudentInvitation, sqlx::Error> {
    sqlx::query_as::<_, StudentInvitation>(&format!(
        "INSERT INTO student_invitations (
            id, email, full_name, department_id, exam_id, status, token_hash,
            expires_at, invited_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.email)
    .bind(params.full_name)
    .bind(params.department_id)
    .bind(params.exam_id)
    .bind(InvitationStatus::Pending)
    .bind(params.token_hash)
    .bind(params.expires_at)
    .bind(params.invited_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_token_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<StudentInvitation>, sqlx::Error> {
    sqlx::query_as::<_, StudentInvitation>(&format!(
        "SELECT {COLUMNS} FROM student_invitations WHERE token_hash = $1"
    ))
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn mark_accepted(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    student_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE student_invitations
         SET status = $1, student_id = $2, accepted_at = $3, updated_at = $3
         WHERE id = $4",
    )
    .bind(InvitationStatus::Accepted)
    .bind(student_id)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}
