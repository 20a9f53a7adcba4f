use thiserror::Error;

/// Client-side failure taxonomy. Every asynchronous operation in the
/// workspace resolves into one of these before it reaches a caller; the
/// rendered form is always the user-facing message string.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Doctor identity is missing")]
    MissingContext,
}

impl AppError {
    /// Message shown to the user, without the taxonomy prefix.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg)
            | AppError::Api(msg)
            | AppError::Network(msg) => msg.clone(),
            AppError::MissingContext => "Doctor ID is missing. Please try again.".to_string(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, AppError::Auth(_))
    }
}
