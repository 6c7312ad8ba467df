use serde::{Deserialize, Serialize};

/// Uniform reply body: `{success, message?, data?}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(message: &str, data: Option<T>) -> Self {
        Envelope {
            success: true,
            message: Some(message.to_string()),
            data,
        }
    }

    pub fn failure(message: String) -> Self {
        Envelope {
            success: false,
            message: Some(message),
            data: None,
        }
    }
}
