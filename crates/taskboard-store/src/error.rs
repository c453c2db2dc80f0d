use taskboard_core::error::ErrorCode;
use taskboard_core::lifecycle::LifecycleError;
use taskboard_core::model::EntityKind;
use taskboard_core::validate::ValidationError;

/// Failure of a store operation. No operation leaves partial writes
/// behind when it returns one of these.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("invalid backup: {0}")]
    Backup(String),

    #[error("backup serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn not_found(entity: EntityKind, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Validation(err) => err.code(),
            Self::Storage(_) => ErrorCode::StorageFailure,
            Self::Backup(_) | Self::Serialization(_) => ErrorCode::BackupFormat,
        }
    }
}

impl From<LifecycleError> for StoreError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::EntryNotFound { entry_id, .. } => Self::NotFound {
                entity: EntityKind::ActivityEntry,
                id: entry_id,
            },
        }
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_map_to_codes() {
        assert_eq!(
            StoreError::not_found(EntityKind::Task, "t-1").code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            StoreError::from(ValidationError::Empty { field: "title" }).code(),
            ErrorCode::ValidationFailure
        );
        assert_eq!(
            StoreError::from(ValidationError::InvalidQuarter {
                year: 2024,
                quarter: 5
            })
            .code(),
            ErrorCode::InvalidQuarter
        );
        assert_eq!(
            StoreError::from(rusqlite::Error::QueryReturnedNoRows).code(),
            ErrorCode::StorageFailure
        );
        assert_eq!(StoreError::Backup("x".into()).code(), ErrorCode::BackupFormat);
    }

    #[test]
    fn missing_entry_reports_entity() {
        let err = StoreError::from(LifecycleError::EntryNotFound {
            task_id: "t-1".into(),
            entry_id: "a-9".into(),
        });
        assert_eq!(err.to_string(), "activity log entry a-9 not found");
    }
}
