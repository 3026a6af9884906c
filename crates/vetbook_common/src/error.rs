use std::fmt;
use thiserror::Error;

/// The error type shared by every Vetbook crate.
///
/// Each variant carries a message that is meant to be shown to the user as-is.
/// None of them is fatal: callers report the message and keep running.
#[derive(Error, Debug)]
pub enum VetbookError {
    /// Input rejected before any network call (phone, message, slot choice).
    #[error("{0}")]
    ValidationError(String),

    /// No session credential available for an operation that needs one.
    #[error("Authentication required: {0}")]
    AuthError(String),

    /// The session's role may not perform the operation.
    #[error("Not permitted: {0}")]
    ForbiddenError(String),

    /// The request never got a response from the service.
    #[error("Could not reach the booking service: {0}")]
    HttpError(String),

    /// The service answered with a non-success status.
    #[error("{message}")]
    ServiceError { status: u16, message: String },

    /// The service answered with a payload we could not read.
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// A mutating call is already in flight.
    #[error("Please wait: {0}")]
    BusyError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Coarse error categories for callers that branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Authorization,
    Network,
    Service,
    Parse,
    Busy,
    Config,
}

impl VetbookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VetbookError::ValidationError(_) => ErrorKind::Validation,
            VetbookError::AuthError(_) => ErrorKind::Authentication,
            VetbookError::ForbiddenError(_) => ErrorKind::Authorization,
            VetbookError::HttpError(_) => ErrorKind::Network,
            VetbookError::ServiceError { .. } => ErrorKind::Service,
            VetbookError::ParseError(_) => ErrorKind::Parse,
            VetbookError::BusyError(_) => ErrorKind::Busy,
            VetbookError::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// True for failures detected locally, before a request was sent.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::Authentication | ErrorKind::Authorization | ErrorKind::Busy
        )
    }
}

impl From<reqwest::Error> for VetbookError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            VetbookError::ParseError(err.to_string())
        } else {
            VetbookError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for VetbookError {
    fn from(err: serde_json::Error) -> Self {
        VetbookError::ParseError(err.to_string())
    }
}

// Utility functions for error handling
pub fn validation_error<T: fmt::Display>(message: T) -> VetbookError {
    VetbookError::ValidationError(message.to_string())
}

pub fn auth_error<T: fmt::Display>(message: T) -> VetbookError {
    VetbookError::AuthError(message.to_string())
}

pub fn forbidden<T: fmt::Display>(message: T) -> VetbookError {
    VetbookError::ForbiddenError(message.to_string())
}

pub fn service_error<T: fmt::Display>(status: u16, message: T) -> VetbookError {
    VetbookError::ServiceError {
        status,
        message: message.to_string(),
    }
}

pub fn busy<T: fmt::Display>(message: T) -> VetbookError {
    VetbookError::BusyError(message.to_string())
}

pub fn config_error<T: fmt::Display>(message: T) -> VetbookError {
    VetbookError::ConfigError(message.to_string())
}
