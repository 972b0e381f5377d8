use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::validation::{normalize_email, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::assignment::{
    AssignExams, AssignOutcome, AssignmentResponse, RevokeAssignments, RevokeOutcome,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(assign_exams))
        .route("/revoke", post(revoke_assignments))
        .route("/:assignment_id", get(get_assignment))
}

async fn get_assignment(
    Path(assignment_id): Path<String>,
    CurrentTeacher(_user): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let assignment = repositories::assignments::find_by_id(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?;

    let Some(assignment) = assignment else {
        return Err(ApiError::NotFound("Assignment not found".to_string()));
    };

    Ok(Json(AssignmentResponse::from_db(assignment)))
}

async fn assign_exams(
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<AssignExams>,
) -> Result<(StatusCode, Json<AssignOutcome>), ApiError> {
    validate_payload(&payload)?;

    let email = normalize_email(&payload.student_email);

    // Resolve a registered account immediately if one exists; otherwise
    // the student_id is backfilled when the invitation is accepted.
    let student_id = repositories::users::exists_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to resolve student account"))?;

    let now = primitive_now_utc();
    let mut assigned = Vec::new();
    let mut skipped = Vec::new();

    for exam_id in &payload.exam_ids {
        let exam = repositories::exams::find_by_id(state.db(), exam_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

        if exam.is_none() {
            skipped.push(exam_id.clone());
            continue;
        }

        let created = repositories::assignments::create(
            state.db(),
            repositories::assignments::CreateAssignment {
                id: &Uuid::new_v4().to_string(),
                exam_id,
                student_email: &email,
                student_id: student_id.as_deref(),
                department_id: payload.department_id.as_deref(),
                assigned_by: &user.id,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create assignment"))?;

        match created {
            Some(assignment) => assigned.push(AssignmentResponse::from_db(assignment)),
            None => skipped.push(exam_id.clone()),
        }
    }

    tracing::info!(
        student_email = %email,
        assigned_by = %user.id,
        assigned = assigned.len(),
        skipped = skipped.len(),
        "Exam assignments created"
    );

    Ok((StatusCode::CREATED, Json(AssignOutcome { assigned, skipped })))
}

async fn revoke_assignments(
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<RevokeAssignments>,
) -> Result<Json<RevokeOutcome>, ApiError> {
    validate_payload(&payload)?;

    let revoked =
        repositories::assignments::revoke(state.db(), &payload.assignment_ids, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to revoke assignments"))?;

    if revoked.is_empty() {
        return Err(ApiError::NotFound(
            "No active assignments matched the given ids".to_string(),
        ));
    }

    tracing::info!(
        revoked_by = %user.id,
        revoked = revoked.len(),
        "Exam assignments revoked"
    );

    Ok(Json(RevokeOutcome { revoked }))
}
