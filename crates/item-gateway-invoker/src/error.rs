//! Transport errors.

use std::fmt;
use thiserror::Error;

/// Category of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The resource does not exist (404).
    NotFound,
    /// The request was rejected (4xx other than 404).
    ClientError,
    /// The service failed (5xx or any other unexpected status).
    ServerError,
    /// The request never produced a response.
    Connection,
    /// A successful response whose body could not be decoded.
    Decode,
}

impl TransportErrorKind {
    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::NotFound => "not_found",
            TransportErrorKind::ClientError => "client_error",
            TransportErrorKind::ServerError => "server_error",
            TransportErrorKind::Connection => "connection",
            TransportErrorKind::Decode => "decode",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote call that did not yield a usable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
pub struct TransportError {
    /// Category.
    pub kind: TransportErrorKind,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Human-readable detail.
    pub message: String,
}

impl TransportError {
    /// Creates an error of `kind` without a status.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            404 => TransportErrorKind::NotFound,
            400..=499 => TransportErrorKind::ClientError,
            _ => TransportErrorKind::ServerError,
        };
        Self {
            kind,
            status: Some(status),
            message: message.into(),
        }
    }

    /// Connection-level failure.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connection, message)
    }

    /// Undecodable success body.
    pub fn decode(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Decode,
            status: Some(status),
            message: message.into(),
        }
    }

    /// Returns true for 404.
    pub fn is_not_found(&self) -> bool {
        self.kind == TransportErrorKind::NotFound
    }

    /// Returns true if no response was received.
    pub fn is_connection(&self) -> bool {
        self.kind == TransportErrorKind::Connection
    }

    /// Returns true for 5xx and unexpected statuses.
    pub fn is_server_error(&self) -> bool {
        self.kind == TransportErrorKind::ServerError
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => TransportError::from_status(status.as_u16(), err.to_string()),
            None if err.is_decode() => TransportError::new(TransportErrorKind::Decode, err.to_string()),
            None => TransportError::connection(err.to_string()),
        }
    }
}
