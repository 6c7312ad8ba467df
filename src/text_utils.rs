use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::Deserializer;

/// Splits a comma separated tag input into trimmed tags.
/// Empty segments are dropped.
pub fn split_tags(tags_str: &str) -> Vec<String> {
    tags_str.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

struct TagsVisitor;

impl<'de> Visitor<'de> for TagsVisitor {
    type Value = Vec<String>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a list of tags or a comma separated string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(split_tags(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut tags = vec![];
        while let Some(tag) = seq.next_element::<String>()? {
            let tag = tag.trim();
            if !tag.is_empty() {
                tags.push(tag.to_string());
            }
        }
        Ok(tags)
    }
}

/// Accepts `["a", "b"]` as well as `"a, b"`.
pub fn deserialize_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    deserializer.deserialize_any(TagsVisitor)
}

struct OptTagsVisitor;

impl<'de> Visitor<'de> for OptTagsVisitor {
    type Value = Option<Vec<String>>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("null, a list of tags or a comma separated string")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserialize_tags(deserializer).map(Some)
    }
}

/// Like `deserialize_tags`, with `null` meaning "leave the tags alone".
pub fn deserialize_opt_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    deserializer.deserialize_option(OptTagsVisitor)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Tagged {
        #[serde(deserialize_with = "deserialize_tags")]
        tags: Vec<String>,
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags("a, b ,c"), ["a", "b", "c"]);
        assert_eq!(split_tags("rust"), ["rust"]);
        assert_eq!(split_tags("rust,,web, "), ["rust", "web"]);
        assert!(split_tags("").is_empty());
        assert!(split_tags(" , ").is_empty());
    }

    #[test]
    fn test_join_tags() {
        let tags = split_tags("a, b ,c");
        assert_eq!(join_tags(&tags), "a, b, c");
    }

    #[test]
    fn test_tags_from_string_or_list() {
        let t: Tagged = serde_json::from_str(r#"{"tags": "rust, web"}"#).unwrap();
        assert_eq!(t.tags, ["rust", "web"]);

        let t: Tagged = serde_json::from_str(r#"{"tags": [" rust", "", "web "]}"#).unwrap();
        assert_eq!(t.tags, ["rust", "web"]);

        assert!(serde_json::from_str::<Tagged>(r#"{"tags": 12}"#).is_err());
    }

    #[derive(Deserialize)]
    struct MaybeTagged {
        #[serde(default, deserialize_with = "deserialize_opt_tags")]
        tags: Option<Vec<String>>,
    }

    #[test]
    fn test_optional_tags() {
        let t: MaybeTagged = serde_json::from_str(r#"{"tags": null}"#).unwrap();
        assert_eq!(t.tags, None);

        let t: MaybeTagged = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(t.tags, None);

        let t: MaybeTagged = serde_json::from_str(r#"{"tags": "rust, web"}"#).unwrap();
        assert_eq!(t.tags, Some(vec!["rust".to_string(), "web".to_string()]));

        let t: MaybeTagged = serde_json::from_str(r#"{"tags": ["rust"]}"#).unwrap();
        assert_eq!(t.tags, Some(vec!["rust".to_string()]));

        assert!(serde_json::from_str::<MaybeTagged>(r#"{"tags": 12}"#).is_err());
    }
}
