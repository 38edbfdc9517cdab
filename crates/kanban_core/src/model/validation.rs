//! Field validation shared by repository write paths.
//!
//! # Invariants
//! - Validation is pure and runs before any write.
//! - A failure maps to `Response::BadRequest` at the repository boundary.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const TAG_NAME_MAX_CHARS: usize = 50;
pub const USER_NAME_MAX_CHARS: usize = 100;
pub const USER_EMAIL_MAX_CHARS: usize = 100;
pub const WORK_ITEM_TITLE_MAX_CHARS: usize = 100;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Rejected field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text is empty after trimming.
    Blank { field: &'static str },
    /// Text exceeds the column's character budget.
    TooLong { field: &'static str, max_chars: usize },
    /// Email does not look like `local@domain.tld`.
    InvalidEmail,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank { field } => write!(f, "{field} must not be blank"),
            Self::TooLong { field, max_chars } => {
                write!(f, "{field} must be at most {max_chars} characters")
            }
            Self::InvalidEmail => write!(f, "email is not a valid address"),
        }
    }
}

impl ValidationError {
    /// Name of the rejected field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Blank { field } | Self::TooLong { field, .. } => *field,
            Self::InvalidEmail => "email",
        }
    }

    /// Stable code for `error_code=` log fields.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Blank { .. } => "blank_field",
            Self::TooLong { .. } => "field_too_long",
            Self::InvalidEmail => "invalid_email",
        }
    }
}

impl Error for ValidationError {}

pub fn validate_tag_name(name: &str) -> Result<(), ValidationError> {
    require_text("tag_name", name, TAG_NAME_MAX_CHARS)
}

pub fn validate_user(name: &str, email: &str) -> Result<(), ValidationError> {
    require_text("user_name", name, USER_NAME_MAX_CHARS)?;
    require_text("email", email, USER_EMAIL_MAX_CHARS)?;
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    require_text("title", title, WORK_ITEM_TITLE_MAX_CHARS)
}

fn require_text(field: &'static str, value: &str, max_chars: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    if value.chars().count() > max_chars {
        return Err(ValidationError::TooLong { field, max_chars });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_tag_name, validate_title, validate_user, ValidationError};

    #[test]
    fn blank_values_are_rejected() {
        assert_eq!(
            validate_tag_name("   "),
            Err(ValidationError::Blank { field: "tag_name" })
        );
        assert!(validate_title("").is_err());
    }

    #[test]
    fn length_is_counted_in_chars() {
        assert!(validate_tag_name(&"é".repeat(50)).is_ok());
        assert!(matches!(
            validate_tag_name(&"é".repeat(51)),
            Err(ValidationError::TooLong { max_chars: 50, .. })
        ));
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(validate_user("Bob", "bob@gmail.com").is_ok());
        assert_eq!(
            validate_user("Bob", "bob.gmail.com"),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_user("Bob", "bob @gmail.com"),
            Err(ValidationError::InvalidEmail)
        );
    }

    #[test]
    fn errors_name_the_rejected_field() {
        let blank = validate_user(" ", "bob@gmail.com").unwrap_err();
        assert_eq!((blank.field(), blank.error_code()), ("user_name", "blank_field"));

        let long = validate_title(&"x".repeat(101)).unwrap_err();
        assert_eq!((long.field(), long.error_code()), ("title", "field_too_long"));

        let email = validate_user("Bob", "bob").unwrap_err();
        assert_eq!((email.field(), email.error_code()), ("email", "invalid_email"));
    }
}
