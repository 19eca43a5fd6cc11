//! Error handling for worksheet calculations
//!
//! Only the network boundary can fail. Every failure is carried as a value in
//! the worksheet state so the UI can render a dismissible banner next to the
//! last good result.

use serde::Serialize;
use shared::worksheets::InputError;
use thiserror::Error;

/// Worksheet error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorksheetError {
    // Calculation endpoint errors
    #[error("Calculation request failed: {0}")]
    Network(String),

    #[error("Calculation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse calculation response: {0}")]
    Decode(String),

    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Worksheet is closed")]
    Closed,
}

/// Banner payload for the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBanner {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl WorksheetError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            WorksheetError::Network(_) => "NETWORK_ERROR",
            WorksheetError::Status { .. } => "CALCULATION_FAILED",
            WorksheetError::Decode(_) => "INVALID_RESPONSE",
            WorksheetError::InvalidInput(_) => "INVALID_INPUT",
            WorksheetError::Configuration(_) => "CONFIGURATION_ERROR",
            WorksheetError::Closed => "WORKSHEET_CLOSED",
        }
    }

    /// Message shown to the investor
    pub fn banner_message(&self) -> String {
        match self {
            WorksheetError::Network(_) => {
                "Could not reach the calculation service. Showing your last results.".to_string()
            }
            WorksheetError::Status { status, .. } if *status >= 500 => {
                "The calculation service is having trouble. Showing your last results.".to_string()
            }
            WorksheetError::Status { status, .. } => {
                format!("The calculation was rejected ({}). Check your inputs.", status)
            }
            WorksheetError::Decode(_) => {
                "The calculation service sent an unexpected response.".to_string()
            }
            WorksheetError::InvalidInput(InputError::UnknownField(field)) => {
                format!("{} is not part of this worksheet.", field)
            }
            WorksheetError::InvalidInput(InputError::InvalidValue { field, .. }) => {
                format!("{} has an invalid value.", field)
            }
            WorksheetError::InvalidInput(InputError::Malformed(_)) => {
                "Saved worksheet inputs could not be read.".to_string()
            }
            WorksheetError::Configuration(msg) => format!("Configuration error: {}", msg),
            WorksheetError::Closed => "This worksheet has been closed.".to_string(),
        }
    }

    pub fn banner(&self) -> ErrorBanner {
        let field = match self {
            WorksheetError::InvalidInput(InputError::UnknownField(field))
            | WorksheetError::InvalidInput(InputError::InvalidValue { field, .. }) => Some(field.clone()),
            _ => None,
        };
        ErrorBanner {
            code: self.code().to_string(),
            message: self.banner_message(),
            field,
        }
    }
}

impl From<config::ConfigError> for WorksheetError {
    fn from(err: config::ConfigError) -> Self {
        WorksheetError::Configuration(err.to_string())
    }
}

/// Result type alias for worksheet operations
pub type WorksheetResult<T> = Result<T, WorksheetError>;
