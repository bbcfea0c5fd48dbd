use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason carried by [`FinRiskError::Extraction`] when every extraction path
/// came up short.
pub const NO_TEXT_REASON: &str = "no-text";

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FinRiskError {
    #[error("Extraction error: {reason}")]
    Extraction { reason: String },

    #[error("Format error: {message}")]
    Format { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Processing cancelled during {stage}")]
    Cancelled { stage: String },
}

impl FinRiskError {
    pub fn extraction(reason: impl Into<String>) -> Self {
        Self::Extraction {
            reason: reason.into(),
        }
    }

    /// No extraction path recovered enough text.
    pub fn no_text() -> Self {
        Self::extraction(NO_TEXT_REASON)
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(stage: impl Into<String>) -> Self {
        Self::Cancelled {
            stage: stage.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Extraction { .. } => "EXTRACTION_ERROR",
            Self::Format { .. } => "FORMAT_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Cancelled { .. } => "PROCESSING_CANCELLED",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Extraction { .. } => 422,
            Self::Format { .. } => 415,
            Self::Configuration { .. } => 400,
            Self::Validation { .. } => 400,
            Self::Cancelled { .. } => 408,
        }
    }

    pub fn is_no_text(&self) -> bool {
        matches!(self, Self::Extraction { reason } if reason == NO_TEXT_REASON)
    }
}

pub type FinRiskResult<T> = Result<T, FinRiskError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<FinRiskError> for ErrorResponse {
    fn from(error: FinRiskError) -> Self {
        let details = match &error {
            FinRiskError::Validation { field, .. } => Some(serde_json::json!({ "field": field })),
            FinRiskError::Extraction { reason } => Some(serde_json::json!({ "reason": reason })),
            _ => None,
        };
        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}

impl From<serde_json::Error> for FinRiskError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}

impl From<config::ConfigError> for FinRiskError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}
