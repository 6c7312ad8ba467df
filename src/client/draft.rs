use std::str::FromStr;

use crate::post::{NewPost, PostChanges, PostResponse};
use crate::text_utils::split_tags;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DraftField {
    Title,
    ShortDescription,
    Content,
    Tags,
}

impl FromStr for DraftField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(DraftField::Title),
            "shortDescription" | "short_description" | "short-description" => Ok(DraftField::ShortDescription),
            "content" => Ok(DraftField::Content),
            "tags" => Ok(DraftField::Tags),
            _ => Err(format!("Unknown post field {}", s)),
        }
    }
}

/// Unsaved post values being edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub title: String,
    pub short_description: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl Draft {
    /// Tags are kept split, never as the raw input.
    pub fn change(&mut self, field: DraftField, value: &str) {
        match field {
            DraftField::Title => self.title = value.to_string(),
            DraftField::ShortDescription => self.short_description = value.to_string(),
            DraftField::Content => self.content = value.to_string(),
            DraftField::Tags => self.tags = split_tags(value),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.short_description.trim().is_empty()
            && !self.content.trim().is_empty()
            && !self.tags.is_empty()
    }

    pub fn from_post(post: &PostResponse) -> Self {
        Draft {
            title: post.title.clone(),
            short_description: post.short_description.clone(),
            content: post.content.clone(),
            tags: post.tags.clone(),
        }
    }

    pub fn to_new_post(&self, image: &str) -> NewPost {
        NewPost {
            title: self.title.clone(),
            short_description: self.short_description.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
            main_photo: image.to_string(),
        }
    }

    pub fn to_changes(&self, image: &str) -> PostChanges {
        PostChanges {
            id: None,
            title: Some(self.title.clone()),
            short_description: Some(self.short_description.clone()),
            content: Some(self.content.clone()),
            tags: Some(self.tags.clone()),
            main_photo: Some(image.to_string()),
        }
    }
}
