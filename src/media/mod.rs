use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub mod cloudinary;
pub mod data_url;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Media host request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Media host rejected the upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Media host is not configured: {0} is missing")]
    NotConfigured(&'static str),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid image encoding: {0}")]
    Decode(#[from] base64::DecodeError),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub url: String,
    #[serde(default)]
    pub secure_url: String,
    #[serde(default)]
    pub public_id: String,
}

/// External service turning an uploadable image into a durable URL.
///
/// `image` is whatever the client sent as `mainPhoto`, usually a
/// `data:<mime>;base64,<payload>` string.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, image: &str) -> Result<UploadedImage, MediaError>;
}
