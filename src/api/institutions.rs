use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::Institution;
use crate::repositories;

#[derive(Debug, Deserialize, Validate)]
struct InstitutionCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: String,
}

#[derive(Debug, Deserialize, Validate)]
struct InstitutionUpdate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: String,
}

#[derive(Debug, Serialize)]
struct InstitutionResponse {
    id: String,
    name: String,
    created_at: String,
}

impl InstitutionResponse {
    fn from_db(institution: Institution) -> Self {
        Self {
            id: institution.id,
            name: institution.name,
            created_at: format_primitive(institution.created_at),
        }
    }
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_institutions).post(create_institution))
        .route("/:institution_id", get(get_institution).patch(update_institution).delete(delete_institution))
}

async fn list_institutions(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<InstitutionResponse>>, ApiError> {
    let institutions = repositories::institutions::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list institutions"))?;

    Ok(Json(institutions.into_iter().map(InstitutionResponse::from_db).collect()))
}

async fn get_institution(
    Path(institution_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<InstitutionResponse>, ApiError> {
    let institution = repositories::institutions::find_by_id(state.db(), &institution_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch institution"))?;

    let Some(institution) = institution else {
        return Err(ApiError::NotFound("Institution not found".to_string()));
    };

    Ok(Json(InstitutionResponse::from_db(institution)))
}

async fn create_institution(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<InstitutionCreate>,
) -> Result<(StatusCode, Json<InstitutionResponse>), ApiError> {
    validate_payload(&payload)?;

    let institution = repositories::institutions::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        &payload.name,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create institution"))?;

    Ok((StatusCode::CREATED, Json(InstitutionResponse::from_db(institution))))
}

async fn update_institution(
    Path(institution_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<InstitutionUpdate>,
) -> Result<Json<InstitutionResponse>, ApiError> {
    validate_payload(&payload)?;

    let updated = repositories::institutions::update_name(
        state.db(),
        &institution_id,
        &payload.name,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update institution"))?;

    let Some(updated) = updated else {
        return Err(ApiError::NotFound("Institution not found".to_string()));
    };

    Ok(Json(InstitutionResponse::from_db(updated)))
}

async fn delete_institution(
    Path(institution_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::institutions::delete(state.db(), &institution_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete institution"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Institution not found".to_string()))
    }
}
