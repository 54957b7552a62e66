use std::fmt;

use kube_protocol::{ErrorBody, NotFoundBody};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Resource name used when a not-found body cannot be decoded.
pub const UNKNOWN_RESOURCE: &str = "Resource";

/// Failures raised before or while exchanging bytes with the service.
///
/// These are passed through untouched; no status code was interpreted.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request cancelled")]
    Cancelled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Generic failure reported by the service.
///
/// Only built from a response; see [`ClientError::from_response`].
///
/// ```compile_fail
/// let err = kube_client::ApiError { status: 500, message: String::new(), code: 0 };
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
#[error("api error (status {status}, code {code}): {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub code: i64,
}

impl ApiError {
    /// Decodes `message` and `code`; a malformed body keeps only the status.
    pub fn from_body(status: StatusCode, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(decoded) => Self::from_error_body(status, decoded),
            Err(err) => {
                warn!(status = status.as_u16(), "undecodable error body: {err}");
                Self::status_only(status)
            }
        }
    }

    fn status_only(status: StatusCode) -> Self {
        Self {
            status: status.as_u16(),
            message: String::new(),
            code: 0,
        }
    }

    fn from_error_body(status: StatusCode, body: ErrorBody) -> Self {
        Self {
            status: status.as_u16(),
            message: body.message,
            code: body.code,
        }
    }
}

/// The service rejected the submitted resource.
///
/// ```compile_fail
/// use kube_client::{ClientError, ValidationError};
///
/// let api = ClientError::from_response(kube_client::StatusCode::CONFLICT, b"")
///     .as_api()
///     .cloned()
///     .unwrap();
/// let err = ValidationError { error: api, failed_fields: vec![] };
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ValidationError {
    pub error: ApiError,
    /// Offending fields in the order the service reported them.
    pub failed_fields: Vec<String>,
}

impl ValidationError {
    /// Decodes a 400 body. A malformed body yields an error with no fields.
    pub fn from_body(status: StatusCode, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(decoded) => {
                let failed_fields = decoded.failed_fields().to_vec();
                Self {
                    error: ApiError::from_error_body(status, decoded),
                    failed_fields,
                }
            }
            Err(err) => {
                warn!(status = status.as_u16(), "undecodable validation body: {err}");
                Self {
                    error: ApiError::status_only(status),
                    failed_fields: Vec::new(),
                }
            }
        }
    }

    pub fn status(&self) -> u16 {
        self.error.status
    }

    pub fn message(&self) -> &str {
        &self.error.message
    }

    pub fn code(&self) -> i64 {
        self.error.code
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation failed (status {}, code {}): {}; failed fields: [{}]",
            self.error.status,
            self.error.code,
            self.error.message,
            self.failed_fields.join(", ")
        )
    }
}

impl std::error::Error for ValidationError {}

/// The addressed resource does not exist.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{resource} with ID={id} not found")]
pub struct NotFoundError {
    pub id: Uuid,
    pub resource: String,
}

impl NotFoundError {
    pub fn new(id: Uuid, resource: impl Into<String>) -> Self {
        Self {
            id,
            resource: resource.into(),
        }
    }

    /// Decodes a 404 body, falling back to a nil id and a generic resource name.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<NotFoundBody>(body) {
            Ok(decoded) => Self::new(decoded.id, decoded.resource),
            Err(err) => {
                warn!("undecodable not-found body: {err}");
                Self::new(Uuid::nil(), UNKNOWN_RESOURCE)
            }
        }
    }
}

/// Every way an operation against the service can fail.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("unsupported url: {0}")]
    UnsupportedUrl(String),
}

/// Discriminant of [`ClientError`] for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    Transport,
    Api,
    Validation,
    NotFound,
    Encode,
    Decode,
    Config,
}

impl ClientError {
    /// Maps a failed response onto exactly one taxonomy variant.
    ///
    /// Never fails: undecodable bodies degrade to best-effort values.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        match status {
            StatusCode::BAD_REQUEST => ValidationError::from_body(status, body).into(),
            StatusCode::NOT_FOUND => NotFoundError::from_body(body).into(),
            _ => ApiError::from_body(status, body).into(),
        }
    }

    pub fn kind(&self) -> ClientErrorKind {
        match self {
            ClientError::Transport(_) => ClientErrorKind::Transport,
            ClientError::Api(_) => ClientErrorKind::Api,
            ClientError::Validation(_) => ClientErrorKind::Validation,
            ClientError::NotFound(_) => ClientErrorKind::NotFound,
            ClientError::Encode(_) => ClientErrorKind::Encode,
            ClientError::Decode(_) => ClientErrorKind::Decode,
            ClientError::UnsupportedUrl(_) => ClientErrorKind::Config,
        }
    }

    /// HTTP status of a taxonomy error; `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(err) => Some(err.status),
            ClientError::Validation(err) => Some(err.status()),
            ClientError::NotFound(_) => Some(StatusCode::NOT_FOUND.as_u16()),
            _ => None,
        }
    }

    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            ClientError::Validation(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_not_found(&self) -> Option<&NotFoundError> {
        match self {
            ClientError::NotFound(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            ClientError::Transport(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Transport(TransportError::Cancelled))
    }

    /// True for an expired [`Context`](crate::Context) and for a client timeout.
    pub fn is_deadline_exceeded(&self) -> bool {
        match self {
            ClientError::Transport(TransportError::DeadlineExceeded) => true,
            ClientError::Transport(TransportError::Http(err)) => err.is_timeout(),
            _ => false,
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Transport(err.into())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.into())
    }
}
