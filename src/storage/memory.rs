use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::post::{Author, Post, PostChanges, PostWithAuthor};
use crate::storage::{PostFilter, PostStore, StorageError};

/// In-process store. Keeps insertion order, which stands in for the natural
/// order of a document collection.
#[derive(Default)]
pub struct MemoryPostStore {
    posts: RwLock<Vec<Post>>,
    authors: RwLock<HashMap<ObjectId, Author>>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_author(&self, author: Author) -> Result<(), StorageError> {
        let mut authors = self.authors.write().map_err(|_| StorageError::Poisoned)?;
        authors.insert(author.id, author);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.posts.read().map(|posts| posts.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn insert(&self, post: &Post) -> Result<(), StorageError> {
        let mut posts = self.posts.write().map_err(|_| StorageError::Poisoned)?;
        posts.push(post.clone());
        Ok(())
    }

    async fn find(&self, filter: &PostFilter) -> Result<Vec<PostWithAuthor>, StorageError> {
        let posts = self.posts.read().map_err(|_| StorageError::Poisoned)?;
        let authors = self.authors.read().map_err(|_| StorageError::Poisoned)?;

        let found = posts.iter()
            .filter(|post| filter.matches(post))
            .map(|post| PostWithAuthor {
                post: post.clone(),
                author: authors.get(&post.user_id).cloned(),
            })
            .collect();

        Ok(found)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, StorageError> {
        let posts = self.posts.read().map_err(|_| StorageError::Poisoned)?;
        Ok(posts.iter().find(|post| &post.id == id).cloned())
    }

    async fn update(&self, id: &ObjectId, changes: &PostChanges) -> Result<Option<Post>, StorageError> {
        let mut posts = self.posts.write().map_err(|_| StorageError::Poisoned)?;
        let Some(post) = posts.iter_mut().find(|post| &post.id == id) else {
            return Ok(None);
        };

        changes.apply_to(post, Utc::now())?;
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, StorageError> {
        let mut posts = self.posts.write().map_err(|_| StorageError::Poisoned)?;
        let before = posts.len();
        posts.retain(|post| &post.id != id);
        Ok(posts.len() != before)
    }
}
