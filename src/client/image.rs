use std::io;
use std::path::Path;

use thiserror::Error;

use crate::media::data_url::encode_data_url;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Could not read image {0}: {1}")]
    Io(String, io::Error),

    #[error("{0} is not an image")]
    NotAnImage(String),

    #[error("{0} is empty")]
    Empty(String),
}

/// Reads an image file into a `data:` URL the API accepts as `mainPhoto`.
/// The MIME type comes from the file extension.
pub async fn image_to_data_url(path: &Path) -> Result<String, ImageError> {
    let name = path.display().to_string();

    let mime_type = match mime_guess::from_path(path).first() {
        Some(mime) if mime.type_() == mime_guess::mime::IMAGE => mime,
        _ => return Err(ImageError::NotAnImage(name)),
    };

    let data = tokio::fs::read(path).await.map_err(|e| ImageError::Io(name.clone(), e))?;
    if data.is_empty() {
        return Err(ImageError::Empty(name));
    }

    Ok(encode_data_url(mime_type.essence_str(), &data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        std::fs::write(&path, b"png!").unwrap();

        let data_url = image_to_data_url(&path).await.unwrap();
        assert_eq!(data_url, "data:image/png;base64,cG5nIQ==");
    }

    #[tokio::test]
    async fn test_rejects_non_images_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"hello").unwrap();
        assert!(matches!(image_to_data_url(&text).await, Err(ImageError::NotAnImage(_))));

        let missing = dir.path().join("missing.jpg");
        assert!(matches!(image_to_data_url(&missing).await, Err(ImageError::Io(_, _))));

        let empty = dir.path().join("empty.gif");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(image_to_data_url(&empty).await, Err(ImageError::Empty(_))));
    }
}
