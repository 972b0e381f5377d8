use validator::Validate;

use crate::api::errors::ApiError;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn validate_password_len(password: &str) -> Result<(), ApiError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )))
    }
}

/// Run derive-based validation and flatten the first failure into a 400.
pub(crate) fn validate_payload(payload: &impl Validate) -> Result<(), ApiError> {
    payload.validate().map_err(|errors| {
        let detail = errors
            .field_errors()
            .into_iter()
            .flat_map(|(_, errs)| errs.iter())
            .filter_map(|err| err.message.as_ref().map(|msg| msg.to_string()))
            .next()
            .unwrap_or_else(|| "Invalid request payload".to_string());
        ApiError::BadRequest(detail)
    })
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_rejected() {
        assert!(validate_password_len("1234567").is_err());
        assert!(validate_password_len("12345678").is_ok());
    }

    #[test]
    fn email_normalization_lowercases_and_trims() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
