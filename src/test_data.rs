use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};

use crate::media::data_url::parse_image_data_url;
use crate::media::{MediaError, MediaHost, UploadedImage};
use crate::post::{Post, PostChanges, PostWithAuthor};
use crate::storage::memory::MemoryPostStore;
use crate::storage::{PostFilter, PostStore, StorageError};

/// 1x1 transparent png
pub const IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub fn new_post_json(title: &str) -> Value {
    json!({
        "title": title,
        "shortDescription": format!("About {}", title),
        "content": format!("All there is to say about {}", title),
        "tags": ["rust", "web"],
        "mainPhoto": IMAGE,
    })
}

/// Media host handing out `https://img.example/<n>.png` URLs. Like the real
/// host it only takes image data URLs.
#[derive(Default)]
pub struct FakeMediaHost {
    uploads: Mutex<Vec<String>>,
    failing: bool,
}

impl FakeMediaHost {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn failing() -> Self {
        FakeMediaHost {
            uploads: Default::default(),
            failing: true,
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaHost for FakeMediaHost {
    async fn upload(&self, image: &str) -> Result<UploadedImage, MediaError> {
        if self.failing {
            return Err(MediaError::Rejected { status: 502, message: "upstream down".to_string() });
        }
        parse_image_data_url(image)?;

        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(image.to_string());
        let url = format!("https://img.example/{}.png", uploads.len());
        Ok(UploadedImage {
            url: url.clone(),
            secure_url: url,
            public_id: format!("posts/{}", uploads.len()),
        })
    }
}

/// Memory store that records how often the mutating calls were made.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryPostStore,
    deletes: AtomicUsize,
    updates: AtomicUsize,
}

impl CountingStore {
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostStore for CountingStore {
    async fn insert(&self, post: &Post) -> Result<(), StorageError> {
        self.inner.insert(post).await
    }

    async fn find(&self, filter: &PostFilter) -> Result<Vec<PostWithAuthor>, StorageError> {
        self.inner.find(filter).await
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, StorageError> {
        self.inner.find_by_id(id).await
    }

    async fn update(&self, id: &ObjectId, changes: &PostChanges) -> Result<Option<Post>, StorageError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id).await
    }
}
