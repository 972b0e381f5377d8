use axum::extract::{Path, Query, State};
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
use crate::core::time::primitive_now_utc;
use crate::db::models::Department;
use crate::repositories;

#[derive(Debug, Deserialize)]
struct DepartmentListQuery {
    #[serde(default)]
    #[serde(alias = "institutionId")]
    institution_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct DepartmentCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    #[serde(alias = "institutionId")]
    institution_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DepartmentUpdate {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    #[serde(alias = "institutionId")]
    institution_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct DepartmentResponse {
    id: String,
    name: String,
    code: Option<String>,
    institution_id: Option<String>,
}

impl DepartmentResponse {
    fn from_db(department: Department) -> Self {
        Self {
            id: department.id,
            name: department.name,
            code: department.code,
            institution_id: department.institution_id,
        }
    }
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_departments).post(create_department))
        .route("/:department_id", get(get_department).patch(update_department).delete(delete_department))
}

async fn list_departments(
    Query(params): Query<DepartmentListQuery>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<DepartmentResponse>>, ApiError> {
    let departments = repositories::departments::list(state.db(), params.institution_id.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list departments"))?;

    Ok(Json(departments.into_iter().map(DepartmentResponse::from_db).collect()))
}

async fn get_department(
    Path(department_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<DepartmentResponse>, ApiError> {
    let department = repositories::departments::find_by_id(state.db(), &department_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch department"))?;

    let Some(department) = department else {
        return Err(ApiError::NotFound("Department not found".to_string()));
    };

    Ok(Json(DepartmentResponse::from_db(department)))
}

async fn create_department(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<DepartmentCreate>,
) -> Result<(StatusCode, Json<DepartmentResponse>), ApiError> {
    validate_payload(&payload)?;

    if let Some(institution_id) = payload.institution_id.as_deref() {
        let institution = repositories::institutions::find_by_id(state.db(), institution_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load institution"))?;
        if institution.is_none() {
            return Err(ApiError::BadRequest("Unknown institution".to_string()));
        }
    }

    let now = primitive_now_utc();
    let department = repositories::departments::create(
        state.db(),
        repositories::departments::CreateDepartment {
            id: &Uuid::new_v4().to_string(),
            name: &payload.name,
            code: payload.code.as_deref(),
            institution_id: payload.institution_id.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create department"))?;

    Ok((StatusCode::CREATED, Json(DepartmentResponse::from_db(department))))
}

async fn update_department(
    Path(department_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<DepartmentUpdate>,
) -> Result<Json<DepartmentResponse>, ApiError> {
    let existing = repositories::departments::find_by_id(state.db(), &department_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch department"))?;

    if existing.is_none() {
        return Err(ApiError::NotFound("Department not found".to_string()));
    }

    repositories::departments::update(
        state.db(),
        &department_id,
        repositories::departments::UpdateDepartment {
            name: payload.name,
            code: payload.code,
            institution_id: payload.institution_id,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update department"))?;

    let updated = repositories::departments::find_by_id(state.db(), &department_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated department"))?
        .ok_or_else(|| ApiError::NotFound("Department not found".to_string()))?;

    Ok(Json(DepartmentResponse::from_db(updated)))
}

async fn delete_department(
    Path(department_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::departments::delete(state.db(), &department_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete department"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Department not found".to_string()))
    }
}
