//! Comment validation

use super::model::CommentPayload;
use crate::error::{Result, TreeError};

/// Maximum comment length (default)
pub const MAX_COMMENT_LENGTH: usize = 3000;

/// Minimum comment length
pub const MIN_COMMENT_LENGTH: usize = 1;

/// Validator for comment payloads
#[derive(Debug, Clone)]
pub struct CommentValidator {
    max_length: usize,
    min_length: usize,
}

impl CommentValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self {
            max_length: MAX_COMMENT_LENGTH,
            min_length: MIN_COMMENT_LENGTH,
        }
    }

    /// Create a new validator with custom max length
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            min_length: MIN_COMMENT_LENGTH,
        }
    }

    /// Validate comment content
    pub fn validate_content(&self, content: &str) -> Result<()> {
        let length = content.trim().chars().count();

        if length < self.min_length {
            return Err(TreeError::Validation(
                "Comment content cannot be empty".to_string(),
            ));
        }

        if length > self.max_length {
            return Err(TreeError::Validation(format!(
                "Comment content exceeds maximum length of {} characters",
                self.max_length
            )));
        }

        Ok(())
    }

    /// Validate a complete payload
    pub fn validate(&self, payload: &CommentPayload) -> Result<()> {
        self.validate_content(&payload.comment)?;

        if !payload.user_email.is_empty() && !payload.user_email.contains('@') {
            return Err(TreeError::Validation(format!(
                "Invalid email address: {}",
                payload.user_email
            )));
        }

        Ok(())
    }
}

impl Default for CommentValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::CommentBuilder;
    use chrono::Duration;

    #[test]
    fn test_validate_content_valid() {
        let validator = CommentValidator::new();
        assert!(validator.validate_content("Valid comment").is_ok());
    }

    #[test]
    fn test_validate_content_empty() {
        let validator = CommentValidator::new();
        assert!(validator.validate_content("").is_err());
        assert!(validator.validate_content("   ").is_err());
    }

    #[test]
    fn test_validate_content_too_long() {
        let validator = CommentValidator::with_max_length(10);
        assert!(validator.validate_content("Short").is_ok());
        assert!(validator.validate_content("This is too long").is_err());
    }

    #[test]
    fn test_validate_content_counts_characters() {
        let validator = CommentValidator::with_max_length(3);
        assert!(validator.validate_content("äöü").is_ok());
    }

    #[test]
    fn test_validate_accepts_updated_before_submitted() {
        let validator = CommentValidator::new();
        let mut payload = CommentBuilder::new().content("ok").build().unwrap();
        assert!(validator.validate(&payload).is_ok());

        // Imported comments keep their own timestamps
        payload.updated_on = payload.submit_date - Duration::days(5);
        assert!(validator.validate(&payload).is_ok());
    }

    #[test]
    fn test_validate_payload_email() {
        let validator = CommentValidator::new();
        let payload = CommentBuilder::new()
            .content("ok")
            .user_email("not-an-address")
            .build()
            .unwrap();
        assert!(validator.validate(&payload).is_err());
    }
}
