use thiserror::Error;

/// Failure talking to the stats API.
///
/// `status` is the HTTP status, or 0 when no usable response arrived
/// (connect failure, timeout, undecodable body).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub status: u16,
    pub message: String,
    pub endpoint: String,
}

impl TransportError {
    pub fn from_status(status: u16, endpoint: impl Into<String>) -> Self {
        Self {
            status,
            message: status_message(status),
            endpoint: endpoint.into(),
        }
    }

    pub fn unreachable(endpoint: impl Into<String>) -> Self {
        Self {
            status: 0,
            message: "Unable to connect to the server. Please check your internet connection."
                .to_string(),
            endpoint: endpoint.into(),
        }
    }

    pub fn undecodable(endpoint: impl Into<String>) -> Self {
        Self {
            status: 0,
            message: "The server returned data that could not be read.".to_string(),
            endpoint: endpoint.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// User-facing text for an HTTP error status
pub fn status_message(status: u16) -> String {
    match status {
        400 => "Invalid request. Please try again.".to_string(),
        401 => "You are not authorized to access this resource.".to_string(),
        403 => "Access denied.".to_string(),
        404 => "The requested data was not found.".to_string(),
        408 => "Request timed out. Please try again.".to_string(),
        429 => "Too many requests. Please wait a moment and try again.".to_string(),
        500 => "Server error. Please try again later.".to_string(),
        502..=504 => "Service temporarily unavailable. Please try again later.".to_string(),
        other => format!("An error occurred ({}). Please try again.", other),
    }
}
