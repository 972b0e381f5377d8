use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::pagination::{default_limit, PaginatedResponse};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::{parse_rfc3339, primitive_now_utc};
use crate::db::models::{Exam, User};
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::exam::{ExamCreate, ExamResponse, ExamUpdate, QuestionCreate, QuestionResponse};
use crate::services::exam_codes;

/// Retries when a freshly generated exam code collides with an existing one.
const CODE_GENERATION_ATTEMPTS: usize = 5;

#[derive(Debug, Deserialize)]
struct ExamListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    mine: bool,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_exams).post(create_exam))
        .route("/:exam_id", get(get_exam).patch(update_exam).delete(delete_exam))
        .route("/:exam_id/questions", get(list_questions).post(create_question))
        .route("/:exam_id/questions/:question_id", axum::routing::delete(delete_question))
}

async fn list_exams(
    Query(params): Query<ExamListQuery>,
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<ExamResponse>>, ApiError> {
    let skip = params.skip.max(0);
    let limit = params.limit.clamp(1, 1000);
    let created_by = params.mine.then_some(user.id.as_str());

    let exams = repositories::exams::list(state.db(), created_by, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let total_count = repositories::exams::count(state.db(), created_by)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exams"))?;

    Ok(Json(PaginatedResponse {
        items: exams.into_iter().map(ExamResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn get_exam(
    Path(exam_id): Path<String>,
    CurrentTeacher(_user): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = fetch_exam(&state, &exam_id).await?;
    Ok(Json(ExamResponse::from_db(exam)))
}

async fn create_exam(
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    validate_payload(&payload)?;

    let start_time = parse_timestamp(&payload.start_time, "start_time")?;
    let end_time = payload
        .end_time
        .as_deref()
        .map(|raw| parse_timestamp(raw, "end_time"))
        .transpose()?;

    if let Some(end_time) = end_time {
        if end_time <= start_time {
            return Err(ApiError::BadRequest("end_time must be after start_time".to_string()));
        }
    }

    let unique_code = allocate_unique_code(&state).await?;
    let now = primitive_now_utc();

    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            title: &payload.title,
            description: payload.description.as_deref(),
            department_id: payload.department_id.as_deref(),
            start_time,
            end_time,
            duration_minutes: payload.duration_minutes,
            unique_code: &unique_code,
            shuffle_questions: payload.shuffle_questions,
            auto_grade: payload.auto_grade,
            created_by: &user.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    tracing::info!(exam_id = %exam.id, created_by = %user.id, "Exam created");

    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam))))
}

async fn update_exam(
    Path(exam_id): Path<String>,
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = fetch_exam(&state, &exam_id).await?;
    require_exam_owner(&exam, &user)?;

    let start_time = payload
        .start_time
        .as_deref()
        .map(|raw| parse_timestamp(raw, "start_time"))
        .transpose()?;
    let end_time = payload
        .end_time
        .as_deref()
        .map(|raw| parse_timestamp(raw, "end_time"))
        .transpose()?;

    repositories::exams::update(
        state.db(),
        &exam_id,
        repositories::exams::UpdateExam {
            title: payload.title,
            description: payload.description,
            department_id: payload.department_id,
            start_time,
            end_time,
            duration_minutes: payload.duration_minutes,
            shuffle_questions: payload.shuffle_questions,
            auto_grade: payload.auto_grade,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?;

    let updated = repositories::exams::fetch_one_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated exam"))?;

    Ok(Json(ExamResponse::from_db(updated)))
}

async fn delete_exam(
    Path(exam_id): Path<String>,
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let exam = fetch_exam(&state, &exam_id).await?;
    require_exam_owner(&exam, &user)?;

    let deleted = repositories::exams::delete(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;

    if deleted {
        tracing::info!(exam_id = %exam_id, deleted_by = %user.id, "Exam deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Exam not found".to_string()))
    }
}

async fn list_questions(
    Path(exam_id): Path<String>,
    CurrentTeacher(_user): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    fetch_exam(&state, &exam_id).await?;

    let questions = repositories::questions::list_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    Ok(Json(questions.into_iter().map(QuestionResponse::from_db).collect()))
}

async fn create_question(
    Path(exam_id): Path<String>,
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    validate_payload(&payload)?;

    let exam = fetch_exam(&state, &exam_id).await?;
    require_exam_owner(&exam, &user)?;

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam_id,
            kind: payload.kind,
            prompt: &payload.prompt,
            options: serde_json::Value::Array(payload.options),
            correct_answer: payload.correct_answer.as_deref(),
            points: payload.points,
            position: payload.position,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

async fn delete_question(
    Path((exam_id, question_id)): Path<(String, String)>,
    CurrentTeacher(user): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let exam = fetch_exam(&state, &exam_id).await?;
    require_exam_owner(&exam, &user)?;

    let deleted = repositories::questions::delete(state.db(), &exam_id, &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Question not found".to_string()))
    }
}

async fn fetch_exam(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
}

fn require_exam_owner(exam: &Exam, user: &User) -> Result<(), ApiError> {
    if user.role == UserRole::Admin || exam.created_by == user.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Only the exam owner can modify this exam"))
    }
}

fn parse_timestamp(raw: &str, field: &str) -> Result<PrimitiveDateTime, ApiError> {
    parse_rfc3339(raw)
        .ok_or_else(|| ApiError::BadRequest(format!("{field} must be an RFC 3339 timestamp")))
}

async fn allocate_unique_code(state: &AppState) -> Result<String, ApiError> {
    for _ in 0..CODE_GENERATION_ATTEMPTS {
        let code = exam_codes::generate_unique_code();
        let taken = repositories::exams::exists_by_unique_code(state.db(), &code)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check exam code"))?;
        if !taken {
            return Ok(code);
        }
    }
    Err(ApiError::Internal("Failed to allocate an exam code".to_string()))
}
