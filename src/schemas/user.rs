use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::db::types::{AccountStatus, UserRole};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserSignup {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    pub(crate) full_name: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserLogin {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileUpdate {
    #[serde(default)]
    #[serde(alias = "fullName")]
    pub(crate) full_name: Option<String>,
    #[serde(default)]
    #[serde(alias = "institutionId")]
    pub(crate) institution_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "departmentId")]
    pub(crate) department_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminUserCreate {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    pub(crate) full_name: String,
    pub(crate) password: String,
    #[serde(default = "default_user_role")]
    pub(crate) role: UserRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdminUserUpdate {
    #[serde(default)]
    #[serde(alias = "fullName")]
    pub(crate) full_name: Option<String>,
    #[serde(default)]
    pub(crate) password: Option<String>,
    #[serde(default)]
    pub(crate) role: Option<UserRole>,
    #[serde(default)]
    #[serde(alias = "accountStatus")]
    pub(crate) account_status: Option<AccountStatus>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) account_status: AccountStatus,
    pub(crate) institution_id: Option<String>,
    pub(crate) department_id: Option<String>,
    pub(crate) profile_completed: bool,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            account_status: user.account_status,
            institution_id: user.institution_id,
            department_id: user.department_id,
            profile_completed: user.profile_completed,
            created_at: format_primitive(user.created_at),
        }
    }
}

fn default_user_role() -> UserRole {
    UserRole::Student
}
