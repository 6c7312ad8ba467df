use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database};
use spdlog::{debug, info};

use crate::post::{Author, Post, PostChanges, PostWithAuthor};
use crate::storage::{PostFilter, PostStore, StorageError};

pub const POSTS_COLLECTION: &str = "posts";
pub const USERS_COLLECTION: &str = "users";

pub struct MongoPostStore {
    posts: Collection<Post>,
}

impl MongoPostStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StorageError> {
        let client = Client::with_uri_str(uri).await?;
        info!("Connected to MongoDB, database {}", database);
        Ok(Self::new(&client.database(database)))
    }

    pub fn new(db: &Database) -> Self {
        Self {
            posts: db.collection(POSTS_COLLECTION),
        }
    }
}

fn match_stage(filter: &PostFilter) -> Document {
    match filter.author {
        Some(author) => doc! { "$match": { "userId": author } },
        None => doc! { "$match": {} },
    }
}

// No $sort stage: results stay in natural order
fn listing_pipeline(filter: &PostFilter) -> Vec<Document> {
    vec![
        match_stage(filter),
        doc! {
            "$lookup": {
                "from": USERS_COLLECTION,
                "localField": "userId",
                "foreignField": "_id",
                "as": "author",
            }
        },
        doc! {
            "$unwind": {
                "path": "$author",
                "preserveNullAndEmptyArrays": true,
            }
        },
    ]
}

fn split_author(mut document: Document) -> Result<PostWithAuthor, StorageError> {
    let author = match document.remove("author") {
        Some(Bson::Document(author)) => Some(bson::from_document::<Author>(author)?),
        _ => None,
    };
    let post: Post = bson::from_document(document)?;
    Ok(PostWithAuthor { post, author })
}

fn set_document(changes: &PostChanges) -> Result<Document, StorageError> {
    let mut set = doc! { "updatedAt": bson::to_bson(&Utc::now())? };

    if let Some(ref id) = changes.id {
        set.insert("_id", ObjectId::parse_str(id)?);
    }
    if let Some(ref title) = changes.title {
        set.insert("title", title.as_str());
    }
    if let Some(ref short_description) = changes.short_description {
        set.insert("shortDescription", short_description.as_str());
    }
    if let Some(ref content) = changes.content {
        set.insert("content", content.as_str());
    }
    if let Some(ref tags) = changes.tags {
        set.insert("tags", tags.clone());
    }
    if let Some(ref main_photo) = changes.main_photo {
        set.insert("mainPhoto", main_photo.as_str());
    }

    Ok(set)
}

#[async_trait]
impl PostStore for MongoPostStore {
    async fn insert(&self, post: &Post) -> Result<(), StorageError> {
        self.posts.insert_one(post).await?;
        debug!("Inserted post {}", post.id);
        Ok(())
    }

    async fn find(&self, filter: &PostFilter) -> Result<Vec<PostWithAuthor>, StorageError> {
        let mut cursor = self.posts.aggregate(listing_pipeline(filter)).await?;

        let mut posts = Vec::new();
        while cursor.advance().await? {
            let document = cursor.deserialize_current()?;
            posts.push(split_author(document)?);
        }

        Ok(posts)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, StorageError> {
        Ok(self.posts.find_one(doc! { "_id": *id }).await?)
    }

    async fn update(&self, id: &ObjectId, changes: &PostChanges) -> Result<Option<Post>, StorageError> {
        let update = doc! { "$set": set_document(changes)? };
        let post = self.posts
            .find_one_and_update(doc! { "_id": *id }, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(post)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, StorageError> {
        let result = self.posts.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_pipeline_filters_by_author() {
        let author = ObjectId::new();
        let pipeline = listing_pipeline(&PostFilter::by_author(author));
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline[0], doc! { "$match": { "userId": author } });
        assert_eq!(listing_pipeline(&PostFilter::all())[0], doc! { "$match": {} });
    }

    #[test]
    fn test_set_document_only_has_given_fields() {
        let id = ObjectId::new();
        let mut changes = PostChanges { title: Some("new".to_string()), ..Default::default() };
        changes.rekey(&id);

        let set = set_document(&changes).unwrap();
        assert_eq!(set.get_object_id("_id").unwrap(), id);
        assert_eq!(set.get_str("title").unwrap(), "new");
        assert!(set.contains_key("updatedAt"));
        assert!(!set.contains_key("content"));
        assert!(!set.contains_key("mainPhoto"));
    }

    #[test]
    fn test_split_author() {
        let post = crate::post::NewPost {
            title: "t".to_string(),
            short_description: "s".to_string(),
            content: "c".to_string(),
            tags: vec!["a".to_string()],
            main_photo: String::new(),
        }.into_post("https://img.example/t.png".to_string(), ObjectId::new());

        let mut document = bson::to_document(&post).unwrap();
        document.insert("author", doc! { "_id": post.user_id, "name": "Ana", "email": "ana@example.com", "password": "x" });

        let item = split_author(document).unwrap();
        assert_eq!(item.post, post);
        assert_eq!(item.author.unwrap().name, "Ana");
    }
}
