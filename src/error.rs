use ntex::http::StatusCode;
use spdlog::{error, warn};
use thiserror::Error;

use crate::media::MediaError;
use crate::storage::StorageError;

pub const GENERIC_FAILURE: &str = "Something went wrong.";

#[derive(Error, Debug)]
pub enum ApiError {
    /// The id in the path is not a valid ObjectId. Carries the reply message.
    #[error("{0}")]
    MalformedId(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Malformed request body: {0}")]
    BadBody(String),

    #[error("Request body is larger than {0} bytes.")]
    TooLarge(usize),

    #[error("Missing required fields: {}", .0.join(", "))]
    Invalid(Vec<&'static str>),

    #[error("Authentication required.")]
    Unauthenticated,

    #[error("You are not the author of this post.")]
    Forbidden,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedId(_) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadBody(_) | ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            // The caller sent something that is not an uploadable image
            ApiError::Media(MediaError::InvalidImage(_) | MediaError::Decode(_)) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Storage(_) | ApiError::Media(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Falls back to a generic text when the
    /// underlying error has none.
    pub fn reply_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        }
    }
}

/// Shared hook every operation sends its failures through.
pub fn catch_error(operation: &str, err: &ApiError) {
    if err.status_code().is_server_error() {
        error!("{} failed: {}", operation, err);
    } else {
        warn!("{} rejected: {}", operation, err);
    }
}
