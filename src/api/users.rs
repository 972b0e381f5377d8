use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{default_limit, PaginatedResponse};
use crate::api::validation::{normalize_email, validate_password_len, validate_payload};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{AccountStatus, UserRole};
use crate::repositories;
use crate::schemas::user::{AdminUserCreate, AdminUserUpdate, UserResponse};

#[derive(Debug, Deserialize)]
pub(crate) struct UserListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    role: Option<UserRole>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:user_id", get(get_user).patch(update_user))
}

async fn list_users(
    Query(params): Query<UserListQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<UserResponse>>, ApiError> {
    let skip = params.skip.max(0);
    let limit = params.limit.clamp(1, 1000);

    let users = repositories::users::list(state.db(), params.role, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    let total_count = repositories::users::count(state.db(), params.role)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users"))?;

    Ok(Json(PaginatedResponse {
        items: users.into_iter().map(UserResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn get_user(
    Path(user_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    let Some(user) = user else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    Ok(Json(UserResponse::from_db(user)))
}

async fn create_user(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminUserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_payload(&payload)?;
    validate_password_len(&payload.password)?;

    let email = normalize_email(&payload.email);

    let existing = repositories::users::exists_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;

    if existing.is_some() {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let now = primitive_now_utc();

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            hashed_password,
            full_name: &payload.full_name,
            role: payload.role,
            account_status: AccountStatus::Active,
            institution_id: None,
            department_id: None,
            profile_completed: false,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %user.id,
        action = "user_create",
        "Admin created user"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn update_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminUserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    if user.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let hashed_password = if let Some(password) = payload.password.as_ref() {
        validate_password_len(password)?;
        Some(
            security::hash_password(password)
                .map_err(|e| ApiError::internal(e, "Failed to hash password"))?,
        )
    } else {
        None
    };

    repositories::users::update(
        state.db(),
        &user_id,
        repositories::users::UpdateUser {
            full_name: payload.full_name,
            role: payload.role,
            account_status: payload.account_status,
            hashed_password,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user"))?;

    let updated = repositories::users::fetch_one_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated user"))?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %updated.id,
        action = "user_update",
        "Admin updated user"
    );

    Ok(Json(UserResponse::from_db(updated)))
}
