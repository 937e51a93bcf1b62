//! Common validation utilities.

use validator::ValidationError;

lazy_static::lazy_static! {
    /// Letters, digits and `@ . + - _`, the classic account-name alphabet.
    pub static ref USERNAME_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9@.+_-]+$").unwrap();
}

/// Validates that a username only uses the allowed characters.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        let mut err = ValidationError::new("username_format");
        err.message =
            Some("Username may only contain letters, digits and @/./+/-/_ characters".into());
        Err(err)
    }
}

/// Validates that a text field is not made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("This field cannot be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}
