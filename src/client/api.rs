use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::envelope::Envelope;
use crate::post::{NewPost, PostChanges, PostResponse};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected reply: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{message} (status {status})")]
    Api { status: u16, message: String },
}

/// Calls the post editor makes.
#[async_trait]
pub trait PostApi: Send + Sync {
    async fn create(&self, post: &NewPost) -> Result<PostResponse, ClientError>;

    /// `None` when the server answered without a post.
    async fn get(&self, id: &str) -> Result<Option<PostResponse>, ClientError>;

    async fn update(&self, id: &str, changes: &PostChanges) -> Result<PostResponse, ClientError>;
}

/// Post API over HTTP. The user id is sent in the header the server's
/// authentication layer fills.
#[derive(Clone)]
pub struct HttpPostApi {
    client: Client,
    base_url: String,
    user_header: String,
    user_id: Option<String>,
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;
    decode_envelope(status, &body)
}

/// Failed requests whose body is not an envelope (a proxy page, a limit
/// rejected by the framework) report the body text or the status reason.
fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<Envelope<T>, ClientError> {
    let envelope: Envelope<T> = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                text
            };
            return Err(ClientError::Api { status: status.as_u16(), message });
        }
        Err(e) => return Err(ClientError::Decode(e)),
    };

    if !status.is_success() || !envelope.success {
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: envelope.message.unwrap_or_else(|| status.to_string()),
        });
    }
    Ok(envelope)
}

fn require_data<T>(envelope: Envelope<T>) -> Result<T, ClientError> {
    envelope.data.ok_or_else(|| ClientError::Api {
        status: 200,
        message: "Reply carried no post".to_string(),
    })
}

impl HttpPostApi {
    pub fn new(base_url: &str, user_header: &str, user_id: Option<String>) -> Self {
        HttpPostApi {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_header: user_header.to_string(),
            user_id,
        }
    }

    fn posts_url(&self) -> String {
        format!("{}/posts", self.base_url)
    }

    fn post_url(&self, id: &str) -> String {
        format!("{}/posts/{}", self.base_url, id)
    }

    fn with_user(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.user_id {
            Some(ref user_id) => builder.header(self.user_header.as_str(), user_id.as_str()),
            None => builder,
        }
    }

    pub async fn list(&self, user_id: Option<&str>) -> Result<Vec<PostResponse>, ClientError> {
        let mut builder = self.client.get(self.posts_url());
        if let Some(user_id) = user_id {
            builder = builder.query(&[("userId", user_id)]);
        }

        let envelope = read_envelope::<Vec<PostResponse>>(builder.send().await?).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Returns the server's confirmation message.
    pub async fn delete(&self, id: &str) -> Result<String, ClientError> {
        let builder = self.with_user(self.client.delete(self.post_url(id)));
        let envelope = read_envelope::<serde_json::Value>(builder.send().await?).await?;
        Ok(envelope.message.unwrap_or_default())
    }
}

#[async_trait]
impl PostApi for HttpPostApi {
    async fn create(&self, post: &NewPost) -> Result<PostResponse, ClientError> {
        let builder = self.with_user(self.client.post(self.posts_url()).json(post));
        require_data(read_envelope(builder.send().await?).await?)
    }

    async fn get(&self, id: &str) -> Result<Option<PostResponse>, ClientError> {
        let builder = self.client.get(self.post_url(id));
        Ok(read_envelope(builder.send().await?).await?.data)
    }

    async fn update(&self, id: &str, changes: &PostChanges) -> Result<PostResponse, ClientError> {
        let builder = self.with_user(self.client.put(self.post_url(id)).json(changes));
        require_data(read_envelope(builder.send().await?).await?)
    }
}
