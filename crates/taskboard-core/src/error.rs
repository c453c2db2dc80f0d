use std::fmt;

/// Machine-readable error codes shared by the engine and the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    NotFound,
    ValidationFailure,
    InvalidQuarter,
    StorageFailure,
    BackupFormat,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::NotFound => "E2001",
            Self::ValidationFailure => "E2002",
            Self::InvalidQuarter => "E2003",
            Self::StorageFailure => "E3001",
            Self::BackupFormat => "E4001",
        }
    }

    /// Short human-facing summary for logs and error dialogs.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::NotFound => "Record not found",
            Self::ValidationFailure => "Invalid input",
            Self::InvalidQuarter => "Invalid quarter",
            Self::StorageFailure => "Local storage failure",
            Self::BackupFormat => "Invalid backup file",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in taskboard/config.toml and retry."),
            Self::NotFound => Some("The record may have been deleted; refresh the view."),
            Self::ValidationFailure => None,
            Self::InvalidQuarter => Some("Quarters are numbered 1 through 4."),
            Self::StorageFailure => Some("Check disk space and write permissions."),
            Self::BackupFormat => {
                Some("Use a file produced by export: {version, exportedAt, data}.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
