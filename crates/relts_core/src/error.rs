use thiserror::Error;

use crate::DimensionKind;

#[derive(Debug, Error)]
pub enum TsError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: DimensionKind, name: String },
    #[error("storage error during {operation}: {message}")]
    Storage { operation: String, message: String },
    #[error("validation error: {message}")]
    Validation { message: String },
    #[error("unknown time series '{name}'")]
    UnknownSeries { name: String },
}

impl TsError {
    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn not_found(kind: DimensionKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unknown_series(name: impl Into<String>) -> Self {
        Self::UnknownSeries { name: name.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Re-labels a storage failure with the operation that surfaced it.
    pub fn during(self, operation: &str) -> Self {
        match self {
            Self::Storage { message, .. } => Self::Storage {
                operation: operation.to_string(),
                message,
            },
            other => other,
        }
    }
}

pub type TsResult<T> = Result<T, TsError>;

impl From<sea_orm::DbErr> for TsError {
    fn from(value: sea_orm::DbErr) -> Self {
        TsError::storage("database", value.to_string())
    }
}
