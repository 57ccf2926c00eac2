//! Error kinds surfaced by the BMI core.
//!
//! Every variant is recoverable: the interaction layer turns it into a
//! user-facing notice and keeps running.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which measurement a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Weight,
    Height,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::Weight => "weight",
            Field::Height => "height",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum BmiError {
    /// Missing or non-numeric required field
    #[error("Invalid input: {message}")]
    InvalidInput { field: Field, message: String },

    /// Weight or height outside the accepted bounds
    #[error("Weight must be 20-300kg, Height 80-250cm (got {field} = {value})")]
    OutOfPlausibleRange { field: Field, value: f64 },

    /// Record store could not be opened or written
    #[error("Record store unavailable at '{path}': {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: StorageCause,
    },

    /// History requested for a user without records
    #[error("No BMI records found for user '{user}'")]
    NoDataFound { user: String },
}

impl BmiError {
    pub fn invalid(field: Field, message: impl Into<String>) -> Self {
        BmiError::InvalidInput {
            field,
            message: message.into(),
        }
    }
}

/// Underlying failure behind `StorageUnavailable`.
#[derive(Debug, Error)]
pub enum StorageCause {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// The directory holding the database could not be created
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BmiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BmiError::invalid(Field::Username, "Please enter a username.");
        assert_eq!(err.to_string(), "Invalid input: Please enter a username.");

        let err = BmiError::OutOfPlausibleRange {
            field: Field::Weight,
            value: 310.0,
        };
        assert!(err.to_string().contains("weight = 310"));

        let err = BmiError::StorageUnavailable {
            path: PathBuf::from("/data/bmi.db"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into(),
        };
        assert_eq!(
            err.to_string(),
            "Record store unavailable at '/data/bmi.db': denied"
        );
    }
}
