use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lazy_static::lazy_static;
use regex::Regex;

use crate::media::MediaError;

#[derive(Debug, PartialEq)]
pub struct DataUrl {
    pub mime_type: String,
    pub data: Vec<u8>,
}

fn split_header(buf: &str) -> Option<(&str, &str)> {
    lazy_static! {
        static ref HEADER_REGEX: Regex = Regex::new(
            r"^data:(?P<mime>[\w.+-]+/[\w.+-]+)(?:;[^;,]*)*;base64$"
        ).unwrap();
    }

    let (header, payload) = buf.split_once(',')?;
    let caps = HEADER_REGEX.captures(header)?;
    let mime = caps.name("mime")?.as_str();
    Some((mime, payload))
}

pub fn is_data_url(buf: &str) -> bool {
    split_header(buf).is_some()
}

pub fn parse_data_url(buf: &str) -> Result<DataUrl, MediaError> {
    let Some((mime_type, payload)) = split_header(buf) else {
        return Err(MediaError::InvalidImage("expected a base64 data URL".to_string()));
    };

    Ok(DataUrl {
        mime_type: mime_type.to_string(),
        data: STANDARD.decode(payload.trim())?,
    })
}

/// Parses `buf` and requires an `image/*` type.
pub fn parse_image_data_url(buf: &str) -> Result<DataUrl, MediaError> {
    let decoded = parse_data_url(buf)?;
    if !decoded.mime_type.starts_with("image/") {
        return Err(MediaError::InvalidImage(format!("{} is not an image", decoded.mime_type)));
    }
    Ok(decoded)
}

pub fn encode_data_url(mime_type: &str, data: &[u8]) -> String {
    let mut data_url = String::from("data:");
    data_url.push_str(mime_type);
    data_url.push_str(";base64,");
    data_url.push_str(&STANDARD.encode(data));
    data_url
}
