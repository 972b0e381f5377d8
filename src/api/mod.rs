pub(crate) mod assignments;
pub(crate) mod auth;
pub(crate) mod departments;
pub(crate) mod errors;
pub(crate) mod exams;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod institutions;
pub(crate) mod invitations;
pub(crate) mod pagination;
pub(crate) mod router;
pub(crate) mod student;
pub(crate) mod teacher_invitations;
pub(crate) mod users;
pub(crate) mod validation;

#[cfg(test)]
mod tests;
