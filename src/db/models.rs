use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{
    AccountStatus, AssignmentStatus, GradingStatus, InvitationStatus, QuestionKind, SessionStatus,
    UserRole,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) account_status: AccountStatus,
    pub(crate) institution_id: Option<String>,
    pub(crate) department_id: Option<String>,
    pub(crate) profile_completed: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Institution {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Department {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) code: Option<String>,
    pub(crate) institution_id: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) department_id: Option<String>,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) duration_minutes: i32,
    pub(crate) unique_code: String,
    pub(crate) shuffle_questions: bool,
    pub(crate) auto_grade: bool,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) prompt: String,
    pub(crate) options: Json<Vec<serde_json::Value>>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) points: f64,
    pub(crate) position: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudentInvitation {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) department_id: Option<String>,
    pub(crate) exam_id: Option<String>,
    pub(crate) status: InvitationStatus,
    pub(crate) token_hash: String,
    pub(crate) expires_at: PrimitiveDateTime,
    pub(crate) accepted_at: Option<PrimitiveDateTime>,
    pub(crate) student_id: Option<String>,
    pub(crate) invited_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct TeacherInvitation {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) department_id: Option<String>,
    pub(crate) status: InvitationStatus,
    pub(crate) token_hash: String,
    pub(crate) expires_at: PrimitiveDateTime,
    pub(crate) accepted_at: Option<PrimitiveDateTime>,
    pub(crate) teacher_id: Option<String>,
    pub(crate) invited_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamAssignment {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_email: String,
    pub(crate) student_id: Option<String>,
    pub(crate) department_id: Option<String>,
    pub(crate) status: AssignmentStatus,
    pub(crate) assigned_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamSession {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) status: SessionStatus,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) total_score: f64,
    pub(crate) violations_count: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudentResponse {
    pub(crate) id: String,
    pub(crate) exam_session_id: String,
    pub(crate) student_id: String,
    pub(crate) answers: Json<HashMap<String, serde_json::Value>>,
    pub(crate) total_score: f64,
    pub(crate) grading_status: GradingStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
