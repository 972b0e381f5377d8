use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::{normalize_email, validate_password_len, validate_payload};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::{AccountStatus, UserRole};
use crate::repositories;
use crate::schemas::auth::TokenResponse;
use crate::schemas::user::{ProfileUpdate, UserLogin, UserResponse, UserSignup};

/// Max attempts per window for auth endpoints (login/signup).
const AUTH_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/profile", patch(update_profile))
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<UserSignup>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    validate_payload(&payload)?;
    validate_password_len(&payload.password)?;

    let email = normalize_email(&payload.email);

    let rate_key = format!("rl:signup:{email}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many signup attempts, try again later"));
    }

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
            role: UserRole::Student,
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

    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    let response = TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = normalize_email(&payload.email);

    let rate_key = format!("rl:login:{email}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let user = fetch_user_by_email(&state, &email).await?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect email or password"))?;

    if !verified {
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    if user.account_status != AccountStatus::Active {
        return Err(ApiError::Unauthorized("Account is not active"));
    }

    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    if let Some(institution_id) = payload.institution_id.as_deref() {
        let institution = repositories::institutions::find_by_id(state.db(), institution_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load institution"))?;
        if institution.is_none() {
            return Err(ApiError::BadRequest("Unknown institution".to_string()));
        }
    }

    if let Some(department_id) = payload.department_id.as_deref() {
        let department = repositories::departments::find_by_id(state.db(), department_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load department"))?;
        if department.is_none() {
            return Err(ApiError::BadRequest("Unknown department".to_string()));
        }
    }

    repositories::users::update_profile(
        state.db(),
        &user.id,
        repositories::users::UpdateProfile {
            full_name: payload.full_name.as_deref(),
            institution_id: payload.institution_id.as_deref(),
            department_id: payload.department_id.as_deref(),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update profile"))?;

    let updated = repositories::users::fetch_one_by_id(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated profile"))?;

    Ok(Json(UserResponse::from_db(updated)))
}

async fn fetch_user_by_email(state: &AppState, email: &str) -> Result<User, ApiError> {
    repositories::users::find_by_email(state.db(), email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect email or password"))
}
