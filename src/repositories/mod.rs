pub(crate) mod assignments;
pub(crate) mod departments;
pub(crate) mod exams;
pub(crate) mod institutions;
pub(crate) mod invitations;
pub(crate) mod questions;
pub(crate) mod responses;
pub(crate) mod sessions;
pub(crate) mod teacher_invitations;
pub(crate) mod users;
