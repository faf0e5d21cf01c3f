//! Error types for the client and the messages shown for them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error, status {0}")]
    Server(u16),

    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("rejected by backend: {0}")]
    Rejected(String),

    #[error("invalid backend address {0}")]
    InvalidUrl(String),

    #[error("response without payload from {0}")]
    MissingPayload(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, path: &str, message: String) -> ApiError {
        match status {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(path.to_owned()),
            500..=599 => ApiError::Server(status),
            _ => ApiError::Status { status, message },
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Unauthorized: please log in again".to_owned(),
            ApiError::NotFound(_) => "Not found".to_owned(),
            ApiError::Server(_) => "Server error, try again later".to_owned(),
            ApiError::Status { status, message } if message.is_empty() => {
                format!("Request failed with status {}", status)
            }
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Rejected(message) => message.clone(),
            ApiError::MissingPayload(_) | ApiError::Decode(_) => {
                "Unexpected response from server".to_owned()
            }
            ApiError::Transport(_) => "Could not connect to the server".to_owned(),
            ApiError::InvalidUrl(_) => "Invalid backend address in configuration".to_owned(),
            ApiError::Storage(err) => err.to_string(),
        }
    }
}

/// Anything that can end a CLI command.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ClientError {
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api(err) => err.user_message(),
            ClientError::Feed(_) => "Currency feed is unavailable".to_owned(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

#[derive(Error, Debug)]
#[error("Storage error, reason: {reason}")]
pub struct StorageError {
    pub reason: String,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError {
            reason: format!("corrupt state file: {}", err),
        }
    }
}

/// Field-level form errors, reported together.
#[derive(Error, Debug, Default, Clone, PartialEq)]
#[error("{}", join_fields(.fields))]
pub struct ValidationError {
    pub fields: Vec<(&'static str, String)>,
}

impl ValidationError {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.push((field, message.into()));
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, message)| message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn join_fields(fields: &[(&'static str, String)]) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}
