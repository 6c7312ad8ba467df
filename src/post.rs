use std::fmt;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::text_utils::{deserialize_opt_tags, deserialize_tags};

/// Post as stored in the `posts` collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub short_description: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub main_photo: String,
    pub user_id: ObjectId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "id={}, author={}, title={}, tags=[{}]",
               self.id,
               self.user_id,
               self.title,
               self.tags.join(",")
        )
    }
}

/// User document owned by the authentication system. Only what a post listing shows.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// A post with its author looked up, as returned by listings.
#[derive(Debug, Clone, PartialEq)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Option<Author>,
}

/// Body of a create request. `main_photo` carries the image to upload.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub main_photo: String,
}

impl NewPost {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = vec![];
        if self.title.trim().is_empty() { missing.push("title"); }
        if self.short_description.trim().is_empty() { missing.push("shortDescription"); }
        if self.content.trim().is_empty() { missing.push("content"); }
        if self.tags.is_empty() { missing.push("tags"); }
        if self.main_photo.trim().is_empty() { missing.push("mainPhoto"); }
        missing
    }

    pub fn into_post(self, main_photo: String, user_id: ObjectId) -> Post {
        let now = Utc::now();
        Post {
            id: ObjectId::new(),
            title: self.title,
            short_description: self.short_description,
            content: self.content,
            tags: self.tags,
            main_photo,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of an update request. Absent fields keep their stored value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostChanges {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_tags", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_photo: Option<String>,
}

impl PostChanges {
    /// Forces the document id to the one addressed by the request.
    pub fn rekey(&mut self, id: &ObjectId) {
        self.id = Some(id.to_hex());
    }

    pub fn apply_to(&self, post: &mut Post, now: DateTime<Utc>) -> Result<(), mongodb::bson::oid::Error> {
        if let Some(ref id) = self.id {
            post.id = ObjectId::parse_str(id)?;
        }
        if let Some(ref title) = self.title { post.title = title.clone(); }
        if let Some(ref short_description) = self.short_description { post.short_description = short_description.clone(); }
        if let Some(ref content) = self.content { post.content = content.clone(); }
        if let Some(ref tags) = self.tags { post.tags = tags.clone(); }
        if let Some(ref main_photo) = self.main_photo { post.main_photo = main_photo.clone(); }
        post.updated_at = now;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthorView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

/// `userId` is the bare id, or the author document when it was looked up.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AuthorRef {
    Id(String),
    Populated(AuthorView),
}

impl AuthorRef {
    pub fn id(&self) -> &str {
        match self {
            AuthorRef::Id(id) => id,
            AuthorRef::Populated(author) => &author.id,
        }
    }
}

/// JSON shape of a post in API replies.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub short_description: String,
    pub content: String,
    pub tags: Vec<String>,
    pub main_photo: String,
    pub user_id: AuthorRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        PostResponse {
            id: post.id.to_hex(),
            title: post.title,
            short_description: post.short_description,
            content: post.content,
            tags: post.tags,
            main_photo: post.main_photo,
            user_id: AuthorRef::Id(post.user_id.to_hex()),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<PostWithAuthor> for PostResponse {
    fn from(item: PostWithAuthor) -> Self {
        let author = item.author;
        let mut response = PostResponse::from(item.post);
        if let Some(author) = author {
            response.user_id = AuthorRef::Populated(AuthorView {
                id: author.id.to_hex(),
                name: author.name,
                email: author.email,
            });
        }
        response
    }
}
