use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_student, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{Exam, ExamSession, User};
use crate::db::types::{GradingStatus, QuestionKind, SessionStatus};
use crate::repositories;
use crate::schemas::session::{
    AssignedExamResponse, ExamResultResponse, SaveAnswers, SaveAnswersResponse, SessionResponse,
    StartExamResponse, SubmitExamResponse,
};
use crate::services::access::require_exam_access;
use crate::services::exam_status::derive_display_status;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/exams", get(list_assigned_exams))
        .route("/exams/:exam_id/start", post(start_exam))
        .route("/exams/:exam_id/save", post(save_answers))
        .route("/exams/:exam_id/submit", post(submit_exam))
        .route("/results", get(list_results))
}

async fn list_assigned_exams(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AssignedExamResponse>>, ApiError> {
    require_student(&user)?;

    let assignments =
        repositories::assignments::list_active_for_student(state.db(), &user.id, &user.email)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;

    let now = primitive_now_utc();
    let mut exams = Vec::with_capacity(assignments.len());

    for assignment in assignments {
        let exam = repositories::exams::find_by_id(state.db(), &assignment.exam_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

        // Assignments pointing at a deleted exam are dropped from the list.
        let Some(exam) = exam else {
            tracing::warn!(
                assignment_id = %assignment.id,
                exam_id = %assignment.exam_id,
                "Assignment references a missing exam"
            );
            continue;
        };

        let session =
            repositories::sessions::find_by_exam_and_student(state.db(), &exam.id, &user.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch exam session"))?;

        let total_questions = repositories::questions::count_by_exam(state.db(), &exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

        let status = derive_display_status(
            now,
            exam.start_time,
            exam.end_time,
            session.as_ref().map(|s| s.status),
        );

        exams.push(AssignedExamResponse {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            start_time: format_primitive(exam.start_time),
            end_time: exam.end_time.map(format_primitive),
            duration_minutes: exam.duration_minutes,
            total_questions,
            status,
            session_id: session.map(|s| s.id),
        });
    }

    Ok(Json(exams))
}

async fn start_exam(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<StartExamResponse>), ApiError> {
    require_student(&user)?;
    require_exam_access(state.db(), &exam_id, &user).await?;

    let exam = fetch_exam(&state, &exam_id).await?;

    let now = primitive_now_utc();
    if now < exam.start_time {
        return Err(ApiError::BadRequest("Exam has not started yet".to_string()));
    }
    if let Some(end_time) = exam.end_time {
        if now > end_time {
            return Err(ApiError::BadRequest("Exam window has closed".to_string()));
        }
    }

    // The advisory lock plus the (exam_id, student_id) unique constraint
    // guarantee at most one session per student and exam, even under
    // concurrent start requests.
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::sessions::acquire_exam_student_lock(&mut *tx, &exam_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to acquire session lock"))?;

    let existing =
        repositories::sessions::find_by_exam_and_student(&mut *tx, &exam_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch exam session"))?;

    if let Some(session) = existing {
        tx.rollback()
            .await
            .map_err(|e| ApiError::internal(e, "Failed to roll back transaction"))?;

        let detail = match session.status {
            SessionStatus::Completed => "Exam has already been completed",
            SessionStatus::InProgress => "Exam session already exists",
        };
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(StartExamResponse {
                success: false,
                detail: Some(detail.to_string()),
                session: SessionResponse::from_db(session),
            }),
        ));
    }

    let session_id = Uuid::new_v4().to_string();
    repositories::sessions::create(
        &mut *tx,
        repositories::sessions::CreateSession {
            id: &session_id,
            exam_id: &exam_id,
            student_id: &user.id,
            started_at: now,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam session"))?;

    let session = repositories::sessions::find_by_exam_and_student(&mut *tx, &exam_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam session"))?
        .ok_or_else(|| ApiError::Internal("Session missing after creation".to_string()))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(session_id = %session.id, exam_id = %exam_id, student_id = %user.id, "Exam session started");

    Ok((
        StatusCode::CREATED,
        Json(StartExamResponse {
            success: true,
            detail: None,
            session: SessionResponse::from_db(session),
        }),
    ))
}

async fn save_answers(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SaveAnswers>,
) -> Result<Json<SaveAnswersResponse>, ApiError> {
    require_student(&user)?;
    require_exam_access(state.db(), &exam_id, &user).await?;

    let session = repositories::sessions::find_by_id(state.db(), &payload.session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam session"))?
        .ok_or_else(|| ApiError::NotFound("Exam session not found".to_string()))?;

    if session.student_id != user.id {
        return Err(ApiError::Forbidden("Exam session belongs to another student"));
    }
    if session.exam_id != exam_id {
        return Err(ApiError::BadRequest(
            "Exam session does not belong to this exam".to_string(),
        ));
    }
    if session.status != SessionStatus::InProgress {
        return Err(ApiError::BadRequest("Exam has already been completed".to_string()));
    }

    let answers = serde_json::to_value(&payload.answers)
        .map_err(|e| ApiError::internal(e, "Failed to serialize answers"))?;

    let response = repositories::responses::upsert_answers(
        state.db(),
        &Uuid::new_v4().to_string(),
        &session.id,
        &user.id,
        answers,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save answers"))?;

    Ok(Json(SaveAnswersResponse {
        saved: true,
        answer_count: payload.answers.len(),
        updated_at: format_primitive(response.updated_at),
    }))
}

async fn submit_exam(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubmitExamResponse>, ApiError> {
    require_student(&user)?;
    require_exam_access(state.db(), &exam_id, &user).await?;

    let session = fetch_in_progress_session(&state, &exam_id, &user).await?;
    let exam = fetch_exam(&state, &exam_id).await?;

    let response = repositories::responses::find_by_session_and_student(
        state.db(),
        &session.id,
        &user.id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch saved answers"))?;

    let now = primitive_now_utc();
    let (total_score, grading_status) = if exam.auto_grade {
        let answers = response.as_ref().map(|r| &r.answers.0);
        let score = grade_mcq_answers(&state, &exam_id, answers).await?;
        (score, GradingStatus::Graded)
    } else {
        (0.0, GradingStatus::Pending)
    };

    if response.is_some() {
        repositories::responses::finalize(
            state.db(),
            &session.id,
            &user.id,
            total_score,
            grading_status,
            now,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to finalize answers"))?;
    }

    repositories::sessions::complete(state.db(), &session.id, total_score, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to complete exam session"))?;

    let completed = repositories::sessions::find_by_id(state.db(), &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam session"))?
        .ok_or_else(|| ApiError::Internal("Session missing after completion".to_string()))?;

    tracing::info!(
        session_id = %completed.id,
        exam_id = %exam_id,
        student_id = %user.id,
        total_score,
        "Exam submitted"
    );

    Ok(Json(SubmitExamResponse {
        session: SessionResponse::from_db(completed),
        grading_status,
        total_score,
    }))
}

async fn list_results(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResultResponse>>, ApiError> {
    require_student(&user)?;

    let sessions = repositories::sessions::list_completed_by_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list completed sessions"))?;

    let mut results = Vec::with_capacity(sessions.len());

    for session in sessions {
        let exam = repositories::exams::find_by_id(state.db(), &session.exam_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

        let Some(exam) = exam else {
            continue;
        };

        let response = repositories::responses::find_by_session_and_student(
            state.db(),
            &session.id,
            &user.id,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch saved answers"))?;

        results.push(ExamResultResponse::from_db(session, exam.title, response.as_ref()));
    }

    Ok(Json(results))
}

/// Sums the points of multiple-choice questions whose stored correct answer
/// matches the saved answer exactly.
async fn grade_mcq_answers(
    state: &AppState,
    exam_id: &str,
    answers: Option<&std::collections::HashMap<String, serde_json::Value>>,
) -> Result<f64, ApiError> {
    let Some(answers) = answers else {
        return Ok(0.0);
    };

    let questions = repositories::questions::list_by_exam(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    let mut score = 0.0;
    for question in questions {
        // SAQ and coding answers stay at zero until graded manually.
        if question.kind != QuestionKind::Mcq {
            continue;
        }
        let Some(correct) = question.correct_answer.as_deref() else {
            continue;
        };
        let Some(answer) = answers.get(&question.id).and_then(|value| value.as_str()) else {
            continue;
        };
        if answer == correct {
            score += question.points;
        }
    }

    Ok(score)
}

async fn fetch_exam(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
}

async fn fetch_in_progress_session(
    state: &AppState,
    exam_id: &str,
    user: &User,
) -> Result<ExamSession, ApiError> {
    let session =
        repositories::sessions::find_by_exam_and_student(state.db(), exam_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch exam session"))?;

    let Some(session) = session else {
        return Err(ApiError::BadRequest("Exam session has not been started".to_string()));
    };

    if session.status != SessionStatus::InProgress {
        return Err(ApiError::BadRequest("Exam has already been completed".to_string()));
    }

    Ok(session)
}
