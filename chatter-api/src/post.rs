use std::collections::{BTreeMap, BTreeSet};

use chrono::{TimeZone, Utc};
use serde::Deserialize;

use crate::{Error, Time};

/// Users having reacted, per reaction kind
pub type Reactions = BTreeMap<String, BTreeSet<String>>;

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct Post {
    pub path: String,
    pub doc: PostDoc,
    pub meta: PostMeta,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PostDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Reactions>,

    /// Fields added by other clients, kept around but otherwise ignored
    #[serde(flatten)]
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PostMeta {
    pub created_by: String,
    #[serde(deserialize_with = "deserialize_time")]
    pub created_at: Time,
    pub last_modified_by: String,
    #[serde(deserialize_with = "deserialize_time")]
    pub last_modified_at: Time,
}

// The server sends plain JSON numbers, which may come with a fractional part
fn deserialize_time<'de, D>(d: D) -> Result<Time, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let n = serde_json::Number::deserialize(d)?;
    n.as_i64()
        .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as Time))
        .ok_or_else(|| serde::de::Error::custom(format!("timestamp {n} is out of range")))
}

impl Post {
    pub fn stub(path: &str, parent: Option<&str>, created_at: Time) -> Post {
        Post {
            path: String::from(path),
            doc: PostDoc {
                msg: Some(format!("message {path}")),
                parent: parent.map(String::from),
                reactions: None,
                extensions: serde_json::Map::new(),
            },
            meta: PostMeta {
                created_by: String::from("stub"),
                created_at,
                last_modified_by: String::from("stub"),
                last_modified_at: created_at,
            },
        }
    }

    /// Parses one payload of the live feed
    pub fn parse(payload: &str) -> Result<Post, Error> {
        let post: Post =
            serde_json::from_str(payload).map_err(|e| Error::InvalidPayload(e.to_string()))?;
        post.validate()?;
        Ok(post)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.path.is_empty() {
            return Err(Error::InvalidPayload(String::from("post has an empty path")));
        }
        crate::validate_string(&self.path)?;
        crate::validate_string(&self.meta.created_by)?;
        if let Some(msg) = &self.doc.msg {
            crate::validate_string(msg)?;
        }
        if let Some(parent) = &self.doc.parent {
            crate::validate_string(parent)?;
        }
        Ok(())
    }

    /// Path of the post this one replies to, `None` for a top-level post
    pub fn parent_path(&self) -> Option<&str> {
        self.doc.parent.as_deref().filter(|p| !p.is_empty())
    }

    pub fn created_at(&self) -> Time {
        self.meta.created_at
    }

    pub fn created_by(&self) -> &str {
        &self.meta.created_by
    }

    pub fn text(&self) -> &str {
        self.doc.msg.as_deref().unwrap_or("")
    }

    pub fn created_at_utc(&self) -> Option<chrono::DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.meta.created_at).single()
    }

    pub fn reaction_count(&self, kind: &str) -> usize {
        self.doc
            .reactions
            .as_ref()
            .and_then(|r| r.get(kind))
            .map(|users| users.len())
            .unwrap_or(0)
    }

    pub fn has_reacted(&self, kind: &str, user: &str) -> bool {
        self.doc
            .reactions
            .as_ref()
            .and_then(|r| r.get(kind))
            .map(|users| users.contains(user))
            .unwrap_or(false)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewPost {
    pub msg: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.msg)?;
        if let Some(parent) = &self.parent {
            crate::validate_string(parent)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct Uri {
    pub uri: String,
}
