use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{StudentInvitation, TeacherInvitation};
use crate::db::types::InvitationStatus;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentInvitationCreate {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    pub(crate) full_name: String,
    #[serde(alias = "departmentId")]
    pub(crate) department_id: String,
    #[serde(alias = "examId")]
    pub(crate) exam_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TeacherInvitationCreate {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    pub(crate) full_name: String,
    #[serde(alias = "departmentId")]
    pub(crate) department_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AcceptInvitation {
    pub(crate) token: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidateToken {
    pub(crate) token: String,
}

/// Returned on acceptance: the new account is logged in right away, and
/// the client is pointed at the exam the invitation was issued for.
#[derive(Debug, Serialize)]
pub(crate) struct AcceptInvitationResponse {
    pub(crate) exam_id: Option<String>,
    #[serde(flatten)]
    pub(crate) auth: crate::schemas::auth::TokenResponse,
}

/// What the registration page needs to prefill the form. The token
/// is validated but not consumed by this call.
#[derive(Debug, Serialize)]
pub(crate) struct InvitationPreview {
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) department_id: Option<String>,
    pub(crate) department_name: Option<String>,
    pub(crate) institution_name: Option<String>,
    pub(crate) expires_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentInvitationResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) department_id: Option<String>,
    pub(crate) exam_id: Option<String>,
    pub(crate) status: InvitationStatus,
    pub(crate) expires_at: String,
    pub(crate) created_at: String,
    /// Present only in the response to the create call; the server
    /// stores a hash and cannot reproduce the token later.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) token: Option<String>,
}

impl StudentInvitationResponse {
    pub(crate) fn from_db(invitation: StudentInvitation, token: Option<String>) -> Self {
        Self {
            id: invitation.id,
            email: invitation.email,
            full_name: invitation.full_name,
            department_id: invitation.department_id,
            exam_id: invitation.exam_id,
            status: invitation.status,
            expires_at: format_primitive(invitation.expires_at),
            created_at: format_primitive(invitation.created_at),
            token,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TeacherInvitationResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) department_id: Option<String>,
    pub(crate) status: InvitationStatus,
    pub(crate) expires_at: String,
    pub(crate) created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) token: Option<String>,
}

impl TeacherInvitationResponse {
    pub(crate) fn from_db(invitation: TeacherInvitation, token: Option<String>) -> Self {
        Self {
            id: invitation.id,
            email: invitation.email,
            full_name: invitation.full_name,
            department_id: invitation.department_id,
            status: invitation.status,
            expires_at: format_primitive(invitation.expires_at),
            created_at: format_primitive(invitation.created_at),
            token,
        }
    }
}
