//! Boundary checks applied before input reaches the lifecycle engine.

use crate::config::LimitsConfig;
use crate::error::ErrorCode;

/// Caller-supplied data that violates a boundary constraint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max} characters (got {len})")]
    TooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },

    #[error("invalid quarter Q{quarter} {year}: quarter must be 1-4")]
    InvalidQuarter { year: i32, quarter: u32 },

    #[error("position {position} is out of range for {len} siblings")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("reorder list must name every sibling exactly once")]
    IncompleteOrdering,

    #[error("{id} is not one of the siblings being ordered")]
    UnknownSibling { id: String },
}

impl ValidationError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidQuarter { .. } => ErrorCode::InvalidQuarter,
            _ => ErrorCode::ValidationFailure,
        }
    }
}

/// Which title limit applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleKind {
    Project,
    UserStory,
    Task,
}

/// Require a non-blank value; returns it trimmed.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] when `value` is blank.
pub fn require_text<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed)
}

/// Require a non-blank title within the configured length limit.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] or [`ValidationError::TooLong`].
pub fn require_title<'a>(
    kind: TitleKind,
    value: &'a str,
    limits: &LimitsConfig,
) -> Result<&'a str, ValidationError> {
    let trimmed = require_text("title", value)?;
    let max = match kind {
        TitleKind::Project => limits.project_title_max,
        TitleKind::UserStory => limits.story_title_max,
        TitleKind::Task => limits.task_title_max,
    };
    let len = trimmed.chars().count();
    if len > max {
        return Err(ValidationError::TooLong {
            field: "title",
            max,
            len,
        });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(
            require_text("blocked by", "   "),
            Err(ValidationError::Empty { field: "blocked by" })
        );
        assert_eq!(require_text("note", "  hi "), Ok("hi"));
    }

    #[test]
    fn titles_respect_per_kind_limits() {
        let limits = LimitsConfig::default();
        let long = "x".repeat(150);
        assert!(require_title(TitleKind::Task, &long, &limits).is_ok());
        assert_eq!(
            require_title(TitleKind::Project, &long, &limits),
            Err(ValidationError::TooLong {
                field: "title",
                max: 100,
                len: 150
            })
        );
    }

    #[test]
    fn quarter_errors_carry_their_own_code() {
        let err = ValidationError::InvalidQuarter {
            year: 2024,
            quarter: 7,
        };
        assert_eq!(err.code(), ErrorCode::InvalidQuarter);
        assert_eq!(
            ValidationError::Empty { field: "title" }.code(),
            ErrorCode::ValidationFailure
        );
    }
}
