use std::path::Path;

use spdlog::{debug, warn};

use crate::client::api::PostApi;
use crate::client::draft::{Draft, DraftField};
use crate::client::image::image_to_data_url;
use crate::client::notice::Notifier;
use crate::post::PostResponse;

pub const INCOMPLETE_FORM: &str = "Please fill all the fields correctly.";

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    /// Editing the post whose id came with the page query (`?id=...`)
    Edit { post_id: String },
}

#[derive(Debug, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed, nothing was sent
    Incomplete,
    Created(PostResponse),
    Updated(PostResponse),
    Failed,
}

/// Create/edit form of one editing session.
pub struct PostForm<A: PostApi> {
    api: A,
    mode: FormMode,
    draft: Draft,
    image: Option<String>,
    notifier: Notifier,
}

impl<A: PostApi> PostForm<A> {
    pub fn new(api: A, mode: FormMode, notifier: Notifier) -> Self {
        PostForm {
            api,
            mode,
            draft: Draft::default(),
            image: None,
            notifier,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn change(&mut self, field: DraftField, value: &str) {
        self.draft.change(field, value);
    }

    /// Converts the chosen file and makes it the post image. On failure the
    /// previous image stays and an error notice is queued.
    pub async fn select_image(&mut self, path: &Path) -> bool {
        match image_to_data_url(path).await {
            Ok(data_url) => {
                debug!("Selected image {} ({} bytes encoded)", path.display(), data_url.len());
                self.image = Some(data_url);
                true
            }
            Err(e) => {
                warn!("Image conversion failed: {}", e);
                self.notifier.error(e.to_string());
                false
            }
        }
    }

    /// Seeds the form from the stored post when editing. Returns whether
    /// the form was seeded.
    pub async fn load(&mut self) -> bool {
        let FormMode::Edit { ref post_id } = self.mode else {
            return false;
        };

        match self.api.get(post_id).await {
            Ok(Some(post)) => {
                self.notifier.info(format!("Editing \"{}\".", post.title));
                self.draft = Draft::from_post(&post);
                self.image = Some(post.main_photo);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Could not load post {}: {}", post_id, e);
                false
            }
        }
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let image = match self.image {
            Some(ref image) if self.draft.is_complete() && !image.is_empty() => image.clone(),
            _ => {
                self.notifier.error(INCOMPLETE_FORM);
                return SubmitOutcome::Incomplete;
            }
        };

        match self.mode {
            FormMode::Create => match self.api.create(&self.draft.to_new_post(&image)).await {
                Ok(post) => {
                    self.draft = Draft::default();
                    self.image = None;
                    self.notifier.success(format!("Post \"{}\" created.", post.title));
                    SubmitOutcome::Created(post)
                }
                Err(e) => {
                    self.notifier.error(e.to_string());
                    SubmitOutcome::Failed
                }
            },
            FormMode::Edit { ref post_id } => match self.api.update(post_id, &self.draft.to_changes(&image)).await {
                Ok(post) => {
                    self.notifier.success(format!("Post \"{}\" updated.", post.title));
                    SubmitOutcome::Updated(post)
                }
                Err(e) => {
                    self.notifier.error(e.to_string());
                    SubmitOutcome::Failed
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::client::api::ClientError;
    use crate::client::notice::{notice_channel, Notice, NoticeLevel};
    use crate::post::{AuthorRef, NewPost, PostChanges};

    #[derive(Debug, PartialEq)]
    enum Call {
        Create(NewPost),
        Get(String),
        Update(String, PostChanges),
    }

    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<Call>>,
        stored: Option<PostResponse>,
        failing: bool,
    }

    fn response(title: &str, main_photo: &str) -> PostResponse {
        PostResponse {
            id: "65f0c0ffee0000000000abcd".to_string(),
            title: title.to_string(),
            short_description: "Short".to_string(),
            content: "Body".to_string(),
            tags: vec!["rust".to_string(), "web".to_string()],
            main_photo: main_photo.to_string(),
            user_id: AuthorRef::Id("65f0c0ffee0000000000beef".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[async_trait]
    impl PostApi for FakeApi {
        async fn create(&self, post: &NewPost) -> Result<PostResponse, ClientError> {
            self.calls.lock().unwrap().push(Call::Create(post.clone()));
            if self.failing {
                return Err(ClientError::Api { status: 500, message: "Something went wrong.".to_string() });
            }
            Ok(response(&post.title, "https://img.example/1.png"))
        }

        async fn get(&self, id: &str) -> Result<Option<PostResponse>, ClientError> {
            self.calls.lock().unwrap().push(Call::Get(id.to_string()));
            if self.failing {
                return Err(ClientError::Api { status: 404, message: "Post not found.".to_string() });
            }
            Ok(self.stored.clone())
        }

        async fn update(&self, id: &str, changes: &PostChanges) -> Result<PostResponse, ClientError> {
            self.calls.lock().unwrap().push(Call::Update(id.to_string(), changes.clone()));
            Ok(response(changes.title.as_deref().unwrap_or_default(), "https://img.example/1.png"))
        }
    }

    fn create_form(api: FakeApi) -> (PostForm<FakeApi>, UnboundedReceiver<Notice>) {
        let (notifier, rx) = notice_channel();
        (PostForm::new(api, FormMode::Create, notifier), rx)
    }

    fn edit_form(api: FakeApi) -> (PostForm<FakeApi>, UnboundedReceiver<Notice>) {
        let (notifier, rx) = notice_channel();
        let mode = FormMode::Edit { post_id: "65f0c0ffee0000000000abcd".to_string() };
        (PostForm::new(api, mode, notifier), rx)
    }

    fn fill(form: &mut PostForm<FakeApi>) {
        form.change(DraftField::Title, "Title");
        form.change(DraftField::ShortDescription, "Short");
        form.change(DraftField::Content, "Body");
        form.change(DraftField::Tags, "rust, web");
    }

    #[tokio::test]
    async fn test_incomplete_form_never_dispatches() {
        let fields = [DraftField::Title, DraftField::ShortDescription, DraftField::Content, DraftField::Tags];
        for missing in fields {
            let (mut form, mut rx) = create_form(FakeApi::default());
            fill(&mut form);
            form.image = Some("data:image/png;base64,AAAA".to_string());
            form.change(missing, "");

            assert_eq!(form.submit().await, SubmitOutcome::Incomplete);
            assert!(form.api.calls.lock().unwrap().is_empty());
            assert_eq!(rx.try_recv().unwrap(), Notice { level: NoticeLevel::Error, message: INCOMPLETE_FORM.to_string() });
        }
    }

    #[tokio::test]
    async fn test_missing_image_never_dispatches() {
        let (mut form, _rx) = create_form(FakeApi::default());
        fill(&mut form);

        assert_eq!(form.submit().await, SubmitOutcome::Incomplete);
        assert!(form.api.calls.lock().unwrap().is_empty());
        assert_eq!(form.draft().title, "Title");
    }

    #[tokio::test]
    async fn test_create_resets_on_success() {
        let (mut form, mut rx) = create_form(FakeApi::default());
        fill(&mut form);
        form.image = Some("data:image/png;base64,AAAA".to_string());

        let outcome = form.submit().await;
        assert!(matches!(outcome, SubmitOutcome::Created(ref post) if post.title == "Title"));

        let calls = form.api.calls.lock().unwrap();
        match &calls[0] {
            Call::Create(post) => {
                assert_eq!(post.tags, ["rust", "web"]);
                assert_eq!(post.main_photo, "data:image/png;base64,AAAA");
            }
            other => panic!("unexpected call {:?}", other),
        }
        drop(calls);

        assert_eq!(form.draft(), &Draft::default());
        assert_eq!(form.image(), None);
        assert_eq!(rx.try_recv().unwrap().level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn test_create_failure_keeps_draft() {
        let (mut form, mut rx) = create_form(FakeApi { failing: true, ..Default::default() });
        fill(&mut form);
        form.image = Some("data:image/png;base64,AAAA".to_string());

        assert_eq!(form.submit().await, SubmitOutcome::Failed);
        assert_eq!(form.draft().title, "Title");
        assert!(form.image().is_some());
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Something went wrong. (status 500)");
    }

    #[tokio::test]
    async fn test_edit_loads_and_updates_without_reset() {
        let stored = response("Stored title", "https://img.example/stored.png");
        let (mut form, mut rx) = edit_form(FakeApi { stored: Some(stored), ..Default::default() });

        assert!(form.load().await);
        assert_eq!(rx.try_recv().unwrap(), Notice { level: NoticeLevel::Info, message: "Editing \"Stored title\".".to_string() });
        assert_eq!(form.draft().title, "Stored title");
        assert_eq!(form.draft().tags, ["rust", "web"]);
        assert_eq!(form.image(), Some("https://img.example/stored.png"));

        form.change(DraftField::Title, "New title");
        let outcome = form.submit().await;
        assert!(matches!(outcome, SubmitOutcome::Updated(_)));

        let calls = form.api.calls.lock().unwrap();
        assert_eq!(calls[0], Call::Get("65f0c0ffee0000000000abcd".to_string()));
        match &calls[1] {
            Call::Update(id, changes) => {
                assert_eq!(id, "65f0c0ffee0000000000abcd");
                assert_eq!(changes.title.as_deref(), Some("New title"));
                assert_eq!(changes.main_photo.as_deref(), Some("https://img.example/stored.png"));
            }
            other => panic!("unexpected call {:?}", other),
        }
        drop(calls);

        assert_eq!(form.draft().title, "New title");
    }

    #[tokio::test]
    async fn test_edit_load_failure_leaves_form_empty() {
        let (mut form, _rx) = edit_form(FakeApi { failing: true, ..Default::default() });
        assert!(!form.load().await);
        assert_eq!(form.draft(), &Draft::default());
        assert_eq!(form.image(), None);

        let (mut form, _rx) = edit_form(FakeApi::default());
        assert!(!form.load().await);
        assert_eq!(form.image(), None);
    }

    #[tokio::test]
    async fn test_create_mode_does_not_load() {
        let (mut form, _rx) = create_form(FakeApi::default());
        assert!(!form.load().await);
        assert!(form.api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_select_image() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("cover.png");
        std::fs::write(&png, b"png!").unwrap();

        let (mut form, mut rx) = create_form(FakeApi::default());
        assert!(form.select_image(&png).await);
        assert_eq!(form.image(), Some("data:image/png;base64,cG5nIQ=="));

        assert!(!form.select_image(&dir.path().join("nope.png")).await);
        assert_eq!(form.image(), Some("data:image/png;base64,cG5nIQ=="));
        assert_eq!(rx.try_recv().unwrap().level, NoticeLevel::Error);
    }
}
