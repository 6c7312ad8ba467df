use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;

/// Query of `GET /posts`.
#[derive(PartialEq, Debug, Default)]
pub struct ListQuery {
    items: HashMap<String, String>,
}

/// What the `userId` parameter asked for.
#[derive(PartialEq, Debug)]
pub enum AuthorParam {
    Absent,
    Author(ObjectId),
    /// Present but not an ObjectId, nothing can match it
    Unknown,
}

impl ListQuery {
    pub fn from(buf: &str) -> Self {
        let vs: Vec<(String, String)> = serde_urlencoded::from_str(buf).unwrap_or_else(|_| vec![]);
        let items: HashMap<String, String> = vs.into_iter().collect();

        ListQuery {
            items,
        }
    }

    pub fn author(&self) -> AuthorParam {
        match self.items.get("userId").map(|v| v.trim()) {
            None | Some("") => AuthorParam::Absent,
            Some(id) => match ObjectId::parse_str(id) {
                Ok(id) => AuthorParam::Author(id),
                Err(_) => AuthorParam::Unknown,
            },
        }
    }

    /// Requested page, if any. Paging is off when absent.
    pub fn page(&self) -> Option<u32> {
        let val = self.items.get("page")?;
        Some(val.trim().parse().unwrap_or(1))
    }
}
