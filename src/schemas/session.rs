use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::{ExamSession, StudentResponse};
use crate::db::types::{GradingStatus, SessionStatus};
use crate::services::exam_status::DisplayStatus;

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) status: SessionStatus,
    pub(crate) started_at: String,
    pub(crate) completed_at: Option<String>,
    pub(crate) total_score: f64,
    pub(crate) violations_count: i32,
}

impl SessionResponse {
    pub(crate) fn from_db(session: ExamSession) -> Self {
        Self {
            id: session.id,
            exam_id: session.exam_id,
            student_id: session.student_id,
            status: session.status,
            started_at: format_primitive(session.started_at),
            completed_at: session.completed_at.map(format_primitive),
            total_score: session.total_score,
            violations_count: session.violations_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StartExamResponse {
    pub(crate) success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) detail: Option<String>,
    pub(crate) session: SessionResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignedExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) start_time: String,
    pub(crate) end_time: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) total_questions: i64,
    pub(crate) status: DisplayStatus,
    pub(crate) session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveAnswers {
    #[serde(alias = "sessionId")]
    pub(crate) session_id: String,
    pub(crate) answers: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveAnswersResponse {
    pub(crate) saved: bool,
    pub(crate) answer_count: usize,
    pub(crate) updated_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitExamResponse {
    pub(crate) session: SessionResponse,
    pub(crate) grading_status: GradingStatus,
    pub(crate) total_score: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResultResponse {
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) session_id: String,
    pub(crate) completed_at: Option<String>,
    pub(crate) total_score: f64,
    pub(crate) grading_status: GradingStatus,
}

impl ExamResultResponse {
    pub(crate) fn from_db(
        session: ExamSession,
        exam_title: String,
        response: Option<&StudentResponse>,
    ) -> Self {
        Self {
            exam_id: session.exam_id,
            exam_title,
            session_id: session.id,
            completed_at: session.completed_at.map(format_primitive),
            total_score: session.total_score,
            grading_status: response
                .map(|r| r.grading_status)
                .unwrap_or(GradingStatus::Pending),
        }
    }
}
