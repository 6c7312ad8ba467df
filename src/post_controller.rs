use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use spdlog::{debug, info};

use crate::error::ApiError;
use crate::media::data_url::is_data_url;
use crate::media::MediaHost;
use crate::paginator::Paginator;
use crate::post::{NewPost, PostChanges, PostResponse};
use crate::query_string::{AuthorParam, ListQuery};
use crate::storage::{PostFilter, PostStore};

pub mod messages {
    pub const POST_CREATED: &str = "Post created successfully.";
    pub const POSTS_GET: &str = "Posts fetched successfully.";
    pub const POST_GET: &str = "Post fetched successfully.";
    pub const POST_NOT_GET: &str = "Post not found.";
    pub const POST_DELETE: &str = "Post deleted successfully.";
    pub const POST_NOT_DELETE: &str = "Post not deleted. Invalid post id.";
    pub const POST_UPDATE: &str = "Post updated successfully.";
    pub const POST_NOT_UPDATE: &str = "Post not updated. Invalid post id.";
}

pub struct PostController {
    store: Arc<dyn PostStore>,
    media: Arc<dyn MediaHost>,
    page_size: u32,
    enforce_ownership: bool,
}

fn parse_id(id: &str, message: &'static str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id.trim()).map_err(|_| ApiError::MalformedId(message))
}

impl PostController {
    pub fn new(store: Arc<dyn PostStore>, media: Arc<dyn MediaHost>) -> Self {
        PostController {
            store,
            media,
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            enforce_ownership: false,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_ownership(mut self, enforce_ownership: bool) -> Self {
        self.enforce_ownership = enforce_ownership;
        self
    }

    /// Uploads the image, then stores the post authored by `user`.
    /// A failing insert leaves the uploaded image behind.
    pub async fn create(&self, user: Option<ObjectId>, new_post: NewPost) -> Result<PostResponse, ApiError> {
        let user = user.ok_or(ApiError::Unauthenticated)?;

        let missing = new_post.missing_fields();
        if !missing.is_empty() {
            return Err(ApiError::Invalid(missing));
        }

        let uploaded = self.media.upload(&new_post.main_photo).await?;
        debug!("Image uploaded as {}", uploaded.url);

        let post = new_post.into_post(uploaded.url, user);
        self.store.insert(&post).await?;
        info!("Post created: {}", post);

        Ok(post.into())
    }

    /// Posts matching the query, most recently inserted first.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<PostResponse>, ApiError> {
        let filter = match query.author() {
            AuthorParam::Absent => PostFilter::all(),
            AuthorParam::Author(author) => PostFilter::by_author(author),
            AuthorParam::Unknown => return Ok(vec![]),
        };

        let mut posts = self.store.find(&filter).await?;
        posts.reverse();

        let Some(page) = query.page() else {
            return Ok(posts.into_iter().map(PostResponse::from).collect());
        };

        let paginator = Paginator::from(&posts, self.page_size);
        if paginator.page_count() == 0 {
            return Ok(vec![]);
        }
        let page = paginator.get_page(paginator.sanitize(page))
            .map_err(ApiError::Internal)?;

        Ok(page.iter().cloned().map(PostResponse::from).collect())
    }

    pub async fn get(&self, id: &str) -> Result<PostResponse, ApiError> {
        let id = parse_id(id, messages::POST_NOT_GET)?;
        match self.store.find_by_id(&id).await? {
            Some(post) => Ok(post.into()),
            None => Err(ApiError::NotFound(messages::POST_NOT_GET)),
        }
    }

    /// Removing an id that matches nothing still succeeds.
    pub async fn delete(&self, id: &str, user: Option<ObjectId>) -> Result<(), ApiError> {
        let id = parse_id(id, messages::POST_NOT_DELETE)?;
        if self.enforce_ownership {
            self.check_owner(&id, user, false).await?;
        }

        let removed = self.store.delete(&id).await?;
        info!("Post delete {}: removed={}", id, removed);
        Ok(())
    }

    /// Applies the changes with the id forced to the addressed post and
    /// returns the post as stored afterwards.
    pub async fn update(&self, id: &str, user: Option<ObjectId>, mut changes: PostChanges) -> Result<PostResponse, ApiError> {
        let id = parse_id(id, messages::POST_NOT_UPDATE)?;
        if self.enforce_ownership {
            self.check_owner(&id, user, true).await?;
        }

        if let Some(main_photo) = changes.main_photo.take() {
            let main_photo = if is_data_url(&main_photo) {
                // Nothing gets uploaded for a post that is not there
                if !self.enforce_ownership && self.store.find_by_id(&id).await?.is_none() {
                    return Err(ApiError::NotFound(messages::POST_NOT_GET));
                }
                self.media.upload(&main_photo).await?.url
            } else {
                main_photo
            };
            changes.main_photo = Some(main_photo);
        }

        changes.rekey(&id);
        match self.store.update(&id, &changes).await? {
            Some(post) => {
                info!("Post updated: {}", post);
                Ok(post.into())
            }
            None => Err(ApiError::NotFound(messages::POST_NOT_GET)),
        }
    }

    async fn check_owner(&self, id: &ObjectId, user: Option<ObjectId>, must_exist: bool) -> Result<(), ApiError> {
        let user = user.ok_or(ApiError::Unauthenticated)?;
        match self.store.find_by_id(id).await? {
            Some(post) if post.user_id != user => Err(ApiError::Forbidden),
            Some(_) => Ok(()),
            None if must_exist => Err(ApiError::NotFound(messages::POST_NOT_GET)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::{new_post_json, CountingStore, FakeMediaHost, IMAGE};

    fn controller(store: Arc<CountingStore>, media: Arc<FakeMediaHost>) -> PostController {
        PostController::new(store, media).with_page_size(10)
    }

    fn new_post(title: &str) -> NewPost {
        serde_json::from_value(new_post_json(title)).unwrap()
    }

    #[ntex::test]
    async fn test_create_then_get() {
        let store = Arc::new(CountingStore::default());
        let media = Arc::new(FakeMediaHost::new());
        let posts = controller(store.clone(), media.clone());
        let user = ObjectId::new();

        let created = posts.create(Some(user), new_post("Traits")).await.unwrap();
        assert_eq!(created.main_photo, "https://img.example/1.png");
        assert_eq!(created.user_id.id(), user.to_hex());

        let fetched = posts.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[ntex::test]
    async fn test_create_without_image_never_uploads() {
        let store = Arc::new(CountingStore::default());
        let media = Arc::new(FakeMediaHost::new());
        let posts = controller(store.clone(), media.clone());

        let mut body = new_post("No picture");
        body.main_photo = String::new();
        let err = posts.create(Some(ObjectId::new()), body).await.unwrap_err();
        assert!(matches!(err, ApiError::Invalid(ref fields) if fields == &["mainPhoto"]));
        assert_eq!(media.upload_count(), 0);
    }

    #[ntex::test]
    async fn test_update_keeps_plain_url() {
        let store = Arc::new(CountingStore::default());
        let media = Arc::new(FakeMediaHost::new());
        let posts = controller(store.clone(), media.clone());
        let created = posts.create(Some(ObjectId::new()), new_post("Macros")).await.unwrap();

        let changes = PostChanges {
            main_photo: Some("https://elsewhere.example/cover.jpg".to_string()),
            ..Default::default()
        };
        let updated = posts.update(&created.id, None, changes).await.unwrap();
        assert_eq!(updated.main_photo, "https://elsewhere.example/cover.jpg");

        let changes = PostChanges { main_photo: Some(IMAGE.to_string()), ..Default::default() };
        let updated = posts.update(&created.id, None, changes).await.unwrap();
        assert_eq!(updated.main_photo, "https://img.example/2.png");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[ntex::test]
    async fn test_update_missing_post_never_uploads() {
        let store = Arc::new(CountingStore::default());
        let media = Arc::new(FakeMediaHost::new());
        let posts = controller(store.clone(), media.clone());

        let changes = PostChanges { main_photo: Some(IMAGE.to_string()), ..Default::default() };
        let err = posts.update(&ObjectId::new().to_hex(), None, changes).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(messages::POST_NOT_GET)));
        assert_eq!(media.upload_count(), 0);
        assert_eq!(store.updates(), 0);
    }

    #[ntex::test]
    async fn test_create_with_plain_url_is_rejected() {
        let posts = controller(Arc::new(CountingStore::default()), Arc::new(FakeMediaHost::new()));

        let mut body = new_post("Hotlinked");
        body.main_photo = "https://elsewhere.example/cover.jpg".to_string();
        let err = posts.create(Some(ObjectId::new()), body).await.unwrap_err();
        assert_eq!(err.status_code(), ntex::http::StatusCode::BAD_REQUEST);
    }

    #[ntex::test]
    async fn test_delete_missing_post_with_ownership() {
        let store = Arc::new(CountingStore::default());
        let posts = controller(store.clone(), Arc::new(FakeMediaHost::new())).with_ownership(true);

        let id = ObjectId::new().to_hex();
        posts.delete(&id, Some(ObjectId::new())).await.unwrap();
        assert_eq!(store.deletes(), 1);

        let err = posts.delete(&id, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }
}
