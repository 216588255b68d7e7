use std::time::Duration;
use thiserror::Error;

use crate::domain::model::{PhotoId, PinId};

#[derive(Error, Debug)]
pub enum AlbumError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Remote photo source error: {message}")]
    RemoteError { message: String },

    #[error("Photo search timed out after {0:?}")]
    Timeout(Duration),

    #[error("Photo store error: {message}")]
    StoreError { message: String },

    #[error("Pin not found: {0}")]
    PinNotFound(PinId),

    #[error("Photo not found: {0}")]
    PhotoNotFound(PhotoId),

    #[error("Photo {0} has no image URL and no cached image")]
    MissingImageUrl(PhotoId),

    #[error("Invalid coordinate ({latitude}, {longitude}): {reason}")]
    InvalidCoordinate {
        latitude: f64,
        longitude: f64,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Remote,
    Timeout,
    Store,
    Config,
}

impl AlbumError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AlbumError::ApiError(_) | AlbumError::RemoteError { .. } => ErrorCategory::Remote,
            AlbumError::Timeout(_) => ErrorCategory::Timeout,
            AlbumError::IoError(_)
            | AlbumError::SerializationError(_)
            | AlbumError::StoreError { .. }
            | AlbumError::PinNotFound(_)
            | AlbumError::PhotoNotFound(_)
            | AlbumError::MissingImageUrl(_) => ErrorCategory::Store,
            AlbumError::InvalidCoordinate { .. }
            | AlbumError::ConfigError { .. }
            | AlbumError::InvalidConfigValueError { .. } => ErrorCategory::Config,
        }
    }

    /// 是否可由使用者重試 (例如再按一次 New Collection)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Remote | ErrorCategory::Timeout
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Remote => "Something went wrong, please try again".to_string(),
            ErrorCategory::Timeout => "The photo service took too long to answer".to_string(),
            ErrorCategory::Store => format!("Could not access saved photos: {}", self),
            ErrorCategory::Config => format!("Invalid configuration: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Remote => "Check your network connection and API key, then retry",
            ErrorCategory::Timeout => "Retry, or raise source.timeout_seconds in the config",
            ErrorCategory::Store => "Check that the store file is readable and writable",
            ErrorCategory::Config => "Fix the configuration file and run again",
        }
    }

    pub(crate) fn store(message: impl Into<String>) -> Self {
        AlbumError::StoreError {
            message: message.into(),
        }
    }

    pub(crate) fn remote(message: impl Into<String>) -> Self {
        AlbumError::RemoteError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AlbumError>;
