use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::{normalize_email, validate_password_len, validate_payload};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::TeacherInvitation;
use crate::db::types::{AccountStatus, InvitationStatus, UserRole};
use crate::repositories;
use crate::schemas::auth::TokenResponse;
use crate::schemas::invitation::{
    AcceptInvitation, InvitationPreview, TeacherInvitationCreate, TeacherInvitationResponse,
    ValidateToken,
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
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<TeacherInvitationCreate>,
) -> Result<(StatusCode, Json<TeacherInvitationResponse>), ApiError> {
    validate_payload(&payload)?;

    let email = normalize_email(&payload.email);

    let existing = repositories::users::exists_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let token = invitation_tokens::generate_token();
    let token_hash = invitation_tokens::hash_token(&token);

    let now = primitive_now_utc();
    let expires_at = now + time::Duration::hours(state.settings().invitation().expires_hours as i64);

    let invitation = repositories::teacher_invitations::create(
        state.db(),
        repositories::teacher_invitations::CreateTeacherInvitation {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            full_name: &payload.full_name,
            department_id: Some(&payload.department_id),
            token_hash: &token_hash,
            expires_at,
            invited_by: &admin.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create teacher invitation"))?;

    tracing::info!(
        invitation_id = %invitation.id,
        invited_by = %admin.id,
        "Teacher invitation created"
    );

    Ok((StatusCode::CREATED, Json(TeacherInvitationResponse::from_db(invitation, Some(token)))))
}

async fn validate_token(
    State(state): State<AppState>,
    Json(payload): Json<ValidateToken>,
) -> Result<Json<InvitationPreview>, ApiError> {
    let rate_key = format!(
        "rl:teacher_invitation_validate:{}",
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
        expires_at: format_primitive(invitation.expires_at),
    }))
}

async fn accept_invitation(
    State(state): State<AppState>,
    Json(payload): Json<AcceptInvitation>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
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
    let teacher_id = Uuid::new_v4().to_string();

    let institution_id = match invitation.department_id.as_deref() {
        Some(department_id) => repositories::departments::find_by_id(state.db(), department_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch department"))?
            .and_then(|department| department.institution_id),
        None => None,
    };

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let user = repositories::users::create(
        &mut *tx,
        repositories::users::CreateUser {
            id: &teacher_id,
            email: &invitation.email,
            hashed_password,
            full_name: &invitation.full_name,
            role: UserRole::Teacher,
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

    repositories::teacher_invitations::mark_accepted(&mut *tx, &invitation.id, &teacher_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to accept invitation"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    tracing::info!(
        invitation_id = %invitation.id,
        teacher_id = %teacher_id,
        "Teacher invitation accepted"
    );

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            access_token: token,
            token_type: "bearer".to_string(),
            user: UserResponse::from_db(user),
        }),
    ))
}

async fn fetch_usable_invitation(
    state: &AppState,
    token: &str,
) -> Result<TeacherInvitation, ApiError> {
    let token_hash = invitation_tokens::hash_token(token);

    let invitation = repositories::teacher_invitations::find_by_token_hash(state.db(), &token_hash)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch invitation"))?;

    let Some(invitation) = invitation else {
        return Err(ApiError::BadRequest("Invalid invitation token".to_string()));
    };

    if invitation.status != InvitationStatus::Pending {
        return Err(ApiError::BadRequest("Invitation has already been used".to_string()));
    }

    if invitation.expires_at <= primitive_now_utc() {
        return Err(ApiError::BadRequest("Invitation has expired".to_string()));
    }

    Ok(invitation)
}
