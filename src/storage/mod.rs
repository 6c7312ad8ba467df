use async_trait::async_trait;
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::post::{Post, PostChanges, PostWithAuthor};

pub mod memory;
pub mod mongo;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Encoding: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("Decoding: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("Invalid id: {0}")]
    InvalidId(#[from] bson::oid::Error),

    #[error("Post store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub author: Option<ObjectId>,
}

impl PostFilter {
    pub fn all() -> Self {
        PostFilter { author: None }
    }

    pub fn by_author(author: ObjectId) -> Self {
        PostFilter { author: Some(author) }
    }

    pub fn matches(&self, post: &Post) -> bool {
        match self.author {
            None => true,
            Some(ref author) => &post.user_id == author,
        }
    }
}

/// Document store holding posts.
///
/// `find` returns posts in natural storage order with their author looked up.
/// `update` applies the changes as given and returns the document after the update.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: &Post) -> Result<(), StorageError>;

    async fn find(&self, filter: &PostFilter) -> Result<Vec<PostWithAuthor>, StorageError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, StorageError>;

    async fn update(&self, id: &ObjectId, changes: &PostChanges) -> Result<Option<Post>, StorageError>;

    /// Returns whether a document was removed.
    async fn delete(&self, id: &ObjectId) -> Result<bool, StorageError>;
}
