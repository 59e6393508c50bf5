use console_models::{ApiError, ErrorDocument, SchemaValidationError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid console API URL: '{0}'")]
    Url(String),
    #[error("failed to reach the console API")]
    Network(#[source] reqwest::Error),
    #[error("console API responded with {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
        errors: Vec<ApiError>,
    },
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
}

/// ErrorKind is the coarse classification of an Error,
/// which determines how a failed request is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The console API endpoint is misconfigured.
    Configuration,
    /// The request could not be completed (connection, timeout).
    Network,
    /// The backend completed the request with an error status.
    Backend,
    /// The backend responded with a malformed document.
    SchemaValidation,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Url(_) => ErrorKind::Configuration,
            Error::Network(_) => ErrorKind::Network,
            Error::Status { .. } => ErrorKind::Backend,
            Error::Schema(_) => ErrorKind::SchemaValidation,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Status { status, .. } if *status == reqwest::StatusCode::NOT_FOUND)
    }

    pub(crate) fn from_status(status: reqwest::StatusCode, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorDocument>(body) {
            Ok(ErrorDocument { errors }) if !errors.is_empty() => {
                let message = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                Error::Status {
                    status,
                    message,
                    errors,
                }
            }
            _ => Error::Status {
                status,
                message: String::from_utf8_lossy(body).trim().to_string(),
                errors: Vec::new(),
            },
        }
    }
}
