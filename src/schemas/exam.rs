use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Exam, Question};
use crate::db::types::QuestionKind;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "departmentId")]
    pub(crate) department_id: Option<String>,
    /// RFC 3339 timestamp, interpreted in UTC.
    #[serde(alias = "startTime")]
    pub(crate) start_time: String,
    #[serde(default)]
    #[serde(alias = "endTime")]
    pub(crate) end_time: Option<String>,
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(default)]
    #[serde(alias = "shuffleQuestions")]
    pub(crate) shuffle_questions: bool,
    #[serde(default = "default_auto_grade")]
    #[serde(alias = "autoGrade")]
    pub(crate) auto_grade: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "departmentId")]
    pub(crate) department_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "startTime")]
    pub(crate) start_time: Option<String>,
    #[serde(default)]
    #[serde(alias = "endTime")]
    pub(crate) end_time: Option<String>,
    #[serde(default)]
    #[serde(alias = "durationMinutes")]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    #[serde(alias = "shuffleQuestions")]
    pub(crate) shuffle_questions: Option<bool>,
    #[serde(default)]
    #[serde(alias = "autoGrade")]
    pub(crate) auto_grade: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) department_id: Option<String>,
    pub(crate) start_time: String,
    pub(crate) end_time: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) unique_code: String,
    pub(crate) shuffle_questions: bool,
    pub(crate) auto_grade: bool,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            department_id: exam.department_id,
            start_time: format_primitive(exam.start_time),
            end_time: exam.end_time.map(format_primitive),
            duration_minutes: exam.duration_minutes,
            unique_code: exam.unique_code,
            shuffle_questions: exam.shuffle_questions,
            auto_grade: exam.auto_grade,
            created_by: exam.created_by,
            created_at: format_primitive(exam.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    pub(crate) kind: QuestionKind,
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub(crate) prompt: String,
    #[serde(default)]
    pub(crate) options: Vec<serde_json::Value>,
    #[serde(default)]
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: Option<String>,
    #[serde(default = "default_points")]
    pub(crate) points: f64,
    pub(crate) position: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) prompt: String,
    pub(crate) options: Vec<serde_json::Value>,
    pub(crate) points: f64,
    pub(crate) position: i32,
}

impl QuestionResponse {
    /// Student-facing view: `correct_answer` is never exposed here.
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            exam_id: question.exam_id,
            kind: question.kind,
            prompt: question.prompt,
            options: question.options.0,
            points: question.points,
            position: question.position,
        }
    }
}

fn default_auto_grade() -> bool {
    true
}

fn default_points() -> f64 {
    1.0
}
