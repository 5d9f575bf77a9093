//! Common validation utilities.

use validator::ValidationError;

/// Length of an emergency lock code.
pub const LOCK_CODE_LEN: usize = 6;

/// Maximum length of a device display name (after trimming).
pub const MAX_DISPLAY_NAME_LEN: usize = 100;

/// Validates that a lock code is exactly six ASCII digits.
pub fn validate_lock_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == LOCK_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("lock_code_format");
        err.message = Some("Lock code must be exactly 6 digits".into());
        Err(err)
    }
}

/// Validates that a display name is non-blank and within length limits.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if !trimmed.is_empty() && trimmed.len() <= MAX_DISPLAY_NAME_LEN {
        Ok(())
    } else {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some("Display name must be between 1 and 100 characters".into());
        Err(err)
    }
}
