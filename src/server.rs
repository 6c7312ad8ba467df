use std::io;
use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use ntex::http::header::CONTENT_LENGTH;
use ntex::http::StatusCode;
use ntex::util::{stream_recv, BytesMut};
use ntex::web;
use ntex::web::{HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use spdlog::{debug, info};

use crate::config::{Config, StorageBackend};
use crate::envelope::Envelope;
use crate::error::{catch_error, ApiError};
use crate::media::cloudinary::Cloudinary;
use crate::media::MediaHost;
use crate::post::{NewPost, PostChanges};
use crate::post_controller::{messages, PostController};
use crate::query_string::ListQuery;
use crate::storage::memory::MemoryPostStore;
use crate::storage::mongo::MongoPostStore;
use crate::storage::PostStore;

const DEFAULT_DATABASE: &str = "postdeck";

pub struct AppState {
    pub posts: PostController,
    /// Header the authentication layer fills with the caller's user id
    pub user_header: String,
    pub max_body_bytes: usize,
}

type AppData = web::types::State<Arc<AppState>>;

fn current_user(req: &HttpRequest, header: &str) -> Option<ObjectId> {
    let value = req.headers().get(header)?.to_str().ok()?;
    ObjectId::parse_str(value.trim()).ok()
}

/// Collects the request body, refusing anything over `limit` bytes.
async fn read_body(req: &HttpRequest, mut payload: web::types::Payload, limit: usize) -> Result<BytesMut, ApiError> {
    let declared = req.headers().get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(ApiError::TooLarge(limit));
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = stream_recv(&mut payload).await {
        let chunk = chunk.map_err(|e| ApiError::BadBody(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(ApiError::TooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

async fn parse_body<T: DeserializeOwned>(req: &HttpRequest, payload: web::types::Payload, limit: usize) -> Result<T, ApiError> {
    let body = read_body(req, payload, limit).await?;
    serde_json::from_slice(&body).map_err(|e| ApiError::BadBody(e.to_string()))
}

fn reply<T: Serialize>(status: StatusCode, message: &str, data: Option<T>) -> HttpResponse {
    HttpResponse::build(status).json(&Envelope::ok(message, data))
}

fn failure(operation: &str, err: ApiError) -> HttpResponse {
    catch_error(operation, &err);
    HttpResponse::build(err.status_code())
        .json(&Envelope::<()>::failure(err.reply_message()))
}

#[web::get("/healthz")]
async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(&json!({ "status": "ok" }))
}

#[web::post("/posts")]
async fn create_post(req: HttpRequest, payload: web::types::Payload, state: AppData) -> HttpResponse {
    let user = current_user(&req, &state.user_header);
    let new_post = match parse_body::<NewPost>(&req, payload, state.max_body_bytes).await {
        Ok(new_post) => new_post,
        Err(e) => return failure("Create post", e),
    };

    match state.posts.create(user, new_post).await {
        Ok(post) => reply(StatusCode::CREATED, messages::POST_CREATED, Some(post)),
        Err(e) => failure("Create post", e),
    }
}

#[web::get("/posts")]
async fn list_posts(req: HttpRequest, state: AppData) -> HttpResponse {
    let query = ListQuery::from(req.uri().query().unwrap_or(""));

    match state.posts.list(&query).await {
        Ok(posts) => {
            debug!("Listing {} posts", posts.len());
            reply(StatusCode::OK, messages::POSTS_GET, Some(posts))
        }
        Err(e) => failure("List posts", e),
    }
}

#[web::get("/posts/{id}")]
async fn get_post(id: web::types::Path<String>, state: AppData) -> HttpResponse {
    match state.posts.get(&id).await {
        Ok(post) => {
            debug!("Fetched post {}", post.id);
            reply(StatusCode::OK, messages::POST_GET, Some(post))
        }
        Err(e) => failure("Get post", e),
    }
}

#[web::delete("/posts/{id}")]
async fn delete_post(req: HttpRequest, id: web::types::Path<String>, state: AppData) -> HttpResponse {
    let user = current_user(&req, &state.user_header);

    match state.posts.delete(&id, user).await {
        Ok(()) => reply::<()>(StatusCode::OK, messages::POST_DELETE, None),
        Err(e) => failure("Delete post", e),
    }
}

async fn update_post(req: HttpRequest, id: String, payload: web::types::Payload, state: AppData) -> HttpResponse {
    let user = current_user(&req, &state.user_header);
    let changes = match parse_body::<PostChanges>(&req, payload, state.max_body_bytes).await {
        Ok(changes) => changes,
        Err(e) => return failure("Update post", e),
    };

    match state.posts.update(&id, user, changes).await {
        Ok(post) => reply(StatusCode::OK, messages::POST_UPDATE, Some(post)),
        Err(e) => failure("Update post", e),
    }
}

#[web::put("/posts/{id}")]
async fn put_post(req: HttpRequest, id: web::types::Path<String>, payload: web::types::Payload, state: AppData) -> HttpResponse {
    update_post(req, id.into_inner(), payload, state).await
}

#[web::patch("/posts/{id}")]
async fn patch_post(req: HttpRequest, id: web::types::Path<String>, payload: web::types::Payload, state: AppData) -> HttpResponse {
    update_post(req, id.into_inner(), payload, state).await
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz)
        .service(create_post)
        .service(list_posts)
        .service(get_post)
        .service(delete_post)
        .service(put_post)
        .service(patch_post);
}

async fn open_store(config: &Config) -> io::Result<Arc<dyn PostStore>> {
    let store: Arc<dyn PostStore> = match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using the in-memory post store. Posts are lost on restart");
            Arc::new(MemoryPostStore::new())
        }
        StorageBackend::Mongo => {
            let uri = config.storage.uri.as_deref()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "storage.uri is missing"))?;
            let database = config.storage.database.as_deref().unwrap_or(DEFAULT_DATABASE);
            let store = MongoPostStore::connect(uri, database).await
                .map_err(io::Error::other)?;
            Arc::new(store)
        }
    };
    Ok(store)
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let store = open_store(&config).await?;
    let media: Arc<dyn MediaHost> = Arc::new(Cloudinary::from_config(&config.media).map_err(io::Error::other)?);

    let posts = PostController::new(store, media)
        .with_page_size(config.posts.page_size)
        .with_ownership(config.posts.enforce_ownership);

    let app_state = Arc::new(AppState {
        posts,
        user_header: config.auth.user_header.clone(),
        max_body_bytes: config.server.max_body_bytes,
    });

    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .configure(routes)
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await
}
