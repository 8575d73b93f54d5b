//! Error classification for backend calls

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

const GENERIC_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Failure of a backend call, classified by HTTP status
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response at all; transport errors never carry a status
    #[error("unable to reach the server: {0}")]
    Connectivity(String),

    #[error("session expired, please log in again")]
    SessionExpired,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status; carries the server message when present
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The local session store could not be read or written
    #[error("local session storage failed: {0}")]
    Storage(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Pull a human message out of an error body (`message` wins over `error`)
fn server_message(body: &str) -> Option<String> {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty()),
        Err(_) => {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() < 300).then(|| trimmed.to_string())
        }
    }
}

impl ApiError {
    /// Classify a non-success response
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = server_message(body);
        match status.as_u16() {
            401 => ApiError::SessionExpired,
            403 => ApiError::PermissionDenied(
                message.unwrap_or_else(|| "you are not allowed to do this".to_string()),
            ),
            404 => ApiError::NotFound(message.unwrap_or_else(|| "resource not found".to_string())),
            code if code >= 500 => ApiError::Server {
                status: code,
                message: message.unwrap_or_else(|| GENERIC_MESSAGE.to_string()),
            },
            code => ApiError::Rejected {
                status: code,
                message: message.unwrap_or_else(|| GENERIC_MESSAGE.to_string()),
            },
        }
    }

    /// Text suitable for a toast or a CLI error line
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Connectivity(_) => {
                "Unable to connect to the server. Check your network connection.".to_string()
            }
            ApiError::SessionExpired => "Your session has expired. Please log in again.".to_string(),
            ApiError::PermissionDenied(_) => {
                "You do not have permission to perform this action.".to_string()
            }
            ApiError::NotFound(_) => "The requested resource was not found.".to_string(),
            ApiError::Server { .. } => "Server error. Please try again later.".to_string(),
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Decode(_) | ApiError::InvalidRequest(_) => GENERIC_MESSAGE.to_string(),
            ApiError::Storage(_) => "Unable to access the local session store.".to_string(),
        }
    }

    /// 401 and 403 send the user back to the login flow
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::SessionExpired | ApiError::PermissionDenied(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Status code as the browser would have reported it
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Connectivity(_) => 0,
            ApiError::SessionExpired => 401,
            ApiError::PermissionDenied(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Server { status, .. } | ApiError::Rejected { status, .. } => *status,
            ApiError::Decode(_) | ApiError::InvalidRequest(_) | ApiError::Storage(_) => 0,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if err.is_builder() {
            ApiError::InvalidRequest(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::from_status(status, "")
        } else {
            ApiError::Connectivity(err.to_string())
        }
    }
}

impl ApiError {
    /// Wrap a failure of the local store, keeping its context chain
    pub fn storage(err: anyhow::Error) -> Self {
        ApiError::Storage(format!("{:#}", err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
