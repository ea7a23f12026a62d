use thiserror::Error;

use crate::models::CopyField;

pub const GENERATION_FALLBACK_MESSAGE: &str = "Failed to generate campaign";
pub const REFINEMENT_FALLBACK_MESSAGE: &str = "Refinement failed. Please try again.";

#[derive(Debug, Error)]
pub enum AdForgeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    /// The service answered with a structured failure carrying a detail message.
    #[error("Service error ({status}): {detail}")]
    ServiceError { status: u16, detail: String },
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Image error: {0}")]
    ImageError(String),
    #[error("AWS error: {0}")]
    AwsError(String),
    #[error("AWS service error: {0}")]
    AwsServiceError(String),
    #[error("Unknown copy field: {0}")]
    UnknownField(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AdForgeError {
    /// Text safe to show to a user: the service's own detail when it sent one,
    /// `fallback` for everything else.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AdForgeError::ServiceError { detail, .. } if !detail.trim().is_empty() => {
                detail.clone()
            }
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for AdForgeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AdForgeError::ResponseError(e.to_string())
        } else {
            AdForgeError::RequestError(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AdForgeError {
    fn from(e: serde_json::Error) -> Self {
        AdForgeError::SerializationError(e.to_string())
    }
}

/// Rejected transitions of the refinement workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("{0} is already open for refinement")]
    AlreadyOpen(CopyField),
    #[error("no field is open for refinement")]
    NotOpen,
    #[error("a refinement request is still in flight")]
    InFlight,
    #[error("there is no campaign to refine")]
    NoCampaign,
    #[error("the campaign changed while the field was open")]
    StaleCampaign,
}

pub type Result<T> = std::result::Result<T, AdForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_detail_is_surfaced() {
        let err = AdForgeError::ServiceError {
            status: 500,
            detail: "Image too large".into(),
        };
        assert_eq!(err.user_message(GENERATION_FALLBACK_MESSAGE), "Image too large");
    }

    #[test]
    fn transport_failures_use_fallback() {
        let err = AdForgeError::RequestError("connection refused".into());
        assert_eq!(
            err.user_message(GENERATION_FALLBACK_MESSAGE),
            GENERATION_FALLBACK_MESSAGE
        );

        let blank = AdForgeError::ServiceError {
            status: 502,
            detail: "  ".into(),
        };
        assert_eq!(
            blank.user_message(REFINEMENT_FALLBACK_MESSAGE),
            REFINEMENT_FALLBACK_MESSAGE
        );
    }
}
