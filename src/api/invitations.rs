use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::validation::{normalize_email, validate_password_len, validate_payload};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::StudentInvitation;
use crate::db::types::{AccountStatus, InvitationStatus, UserRole};
use crate::repositories;
use crate::schemas::auth::TokenResponse;
use crate::schemas::invitation::{
    AcceptInvitation, AcceptInvitationResponse, InvitationPreview, StudentInvitationCreate,
    StudentInvitationResponse, ValidateToken,
};
use crate::schemas::user::UserResponse;
use crate::services::{directory, invitation_tokens};

const VALIDATE_RATE_LIMIT: u64 = 30;
const VALIDATE_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_invitation))
        .route("/validate", post(validate_token))
        .route("/accept", post(accept_invitation))
}

async fn create_invitation(
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<StudentInvitationCreate>,
) -> Result<(StatusCode, Json<StudentInvitationResponse>), ApiError> {
    validate_payload(&payload)?;

    let email = normalize_email(&payload.email);

    let existing = repositories::users::exists_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let exam = repositories::exams::find_by_id(state.db(), &payload.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;
    if exam.is_none() {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    let token = invitation_tokens::generate_token();
    let token_hash = invitation_tokens::hash_token(&token);

    let now = primitive_now_utc();
    let expires_at = now + time::Duration::hours(state.settings().invitation().expires_hours as i64);

    let invitation = repositories::invitations::create(
        state.db(),
        repositories::invitations::CreateInvitation {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            full_name: &payload.full_name,
            department_id: Some(&payload.department_id),
            exam_id: Some(&payload.exam_id),
            token_hash: &token_hash,
            expires_at,
            invited_by: &user.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create invitation"))?;

    tracing::info!(
        invitation_id = %invitation.id,
        invited_by = %user.id,
        "Student invitation created"
    );

    Ok((StatusCode::CREATED, Json(StudentInvitationResponse::from_db(invitation, Some(token)))))
}

async fn validate_token(
    State(state): State<AppState>,
    Json(payload): Json<ValidateToken>,
) -> Result<Json<InvitationPreview>, ApiError> {
    // Keyed on the hashed token so an attacker probing random tokens is
    // throttled while distinct legitimate links are not.
    let rate_key = format!(
        "rl:invitation_validate:{}",
        &invitation_tokens::hash_token(&payload.token)[..16]
    );
    let allowed = state
        .redis()
        .rate_limit(&rate_key, VALIDATE_RATE_LIMIT, VALIDATE_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many validation attempts, try again later"));
    }

    let invitation = fetch_usable_invitation(&state, &payload.token).await?;

    let (department_name, institution_name) = match invitation.department_id.as_deref() {
        Some(department_id) => {
            let names = directory::resolve_directory_names(state.db(), department_id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to resolve directory names"))?;
            (Some(names.department_name), names.institution_name)
        }
        None => (None, None),
    };

    Ok(Json(InvitationPreview {
        email: invitation.email,
        full_name: invitation.full_name,
        department_id: invitation.department_id,
        department_name,
        institution_name,
        expires_at: crate::core::time::format_primitive(invitation.expires_at),
    }))
}

async fn accept_invitation(
    State(state): State<AppState>,
    Json(payload): Json<AcceptInvitation>,
) -> Result<(StatusCode, Json<AcceptInvitationResponse>), ApiError> {
    validate_password_len(&payload.password)?;

    let invitation = fetch_usable_invitation(&state, &payload.token).await?;

    let existing = repositories::users::exists_by_email(state.db(), &invitation.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let now = primitive_now_utc();
    let student_id = Uuid::new_v4().to_string();

    // The institution is derived from the invitation's department when
    // that department row exists.
    let institution_id = match invitation.department_id.as_deref() {
        Some(department_id) => repositories::departments::find_by_id(state.db(), department_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch department"))?
            .and_then(|department| department.institution_id),
        None => None,
    };

    // Account creation, invitation consumption and the exam assignment
    // commit or roll back together.
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let user = repositories::users::create(
        &mut *tx,
        repositories::users::CreateUser {
            id: &student_id,
            email: &invitation.email,
            hashed_password,
            full_name: &invitation.full_name,
            role: UserRole::Student,
            account_status: AccountStatus::Active,
            institution_id: institution_id.as_deref(),
            department_id: invitation.department_id.as_deref(),
            profile_completed: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    repositories::invitations::mark_accepted(&mut *tx, &invitation.id, &student_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to accept invitation"))?;

    if let Some(exam_id) = invitation.exam_id.as_deref() {
        repositories::assignments::create(
            &mut *tx,
            repositories::assignments::CreateAssignment {
                id: &Uuid::new_v4().to_string(),
                exam_id,
                student_email: &invitation.email,
                student_id: Some(&student_id),
                department_id: invitation.department_id.as_deref(),
                assigned_by: &invitation.invited_by,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create exam assignment"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    // Pre-registration assignments addressed to this email are linked
    // outside the transaction; a failure here only delays the linking.
    if let Err(err) =
        repositories::assignments::backfill_student_id(state.db(), &invitation.email, &student_id, now)
            .await
    {
        tracing::warn!(
            error = %err,
            student_id = %student_id,
            "Failed to backfill assignments after invitation acceptance"
        );
    }

    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    tracing::info!(
        invitation_id = %invitation.id,
        student_id = %student_id,
        "Student invitation accepted"
    );

    Ok((
        StatusCode::CREATED,
        Json(AcceptInvitationResponse {
            exam_id: invitation.exam_id,
            auth: TokenResponse {
                access_token: token,
                token_type: "bearer".to_string(),
                user: UserResponse::from_db(user),
            },
        }),
    ))
}

async fn fetch_usable_invitation(
    state: &AppState,
    token: &str,
) -> Result<StudentInvitation, ApiError> {
    let token_hash = invitation_tokens::hash_token(token);

    let invitation = repositories::invitations::find_by_token_hash(state.db(), &token_hash)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch invitation"))?;

    let Some(invitation) = invitation else {
        return Err(ApiError::NotFound("Invitation not found".to_string()));
    };

    if invitation.status != InvitationStatus::Pending {
        return Err(ApiError::BadRequest("Invitation has already been used".to_string()));
    }

    if invitation.expires_at <= primitive_now_utc() {
        return Err(ApiError::BadRequest("Invitation has expired".to_string()));
    }

    Ok(invitation)
}
