pub(crate) mod access;
pub(crate) mod directory;
pub(crate) mod exam_codes;
pub(crate) mod exam_status;
pub(crate) mod invitation_tokens;
