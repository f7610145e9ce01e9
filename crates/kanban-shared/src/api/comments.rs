use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::fields::timestamp;
use super::{FieldReader, FromJson};
use crate::models::Comment;
use crate::validation::ValidationErrors;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FromJson for CreateCommentRequest {
    fn from_json(body: Value) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(body)?;
        let req = Self {
            content: fields.optional("content"),
        };
        fields.finish(req)
    }
}

/// A comment as clients see it. `author` is the author's full name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub author: String,
    pub content: String,
}

impl CommentView {
    pub fn new(comment: &Comment, author: impl Into<String>) -> Self {
        Self {
            id: comment.id,
            created_at: comment.created_at,
            author: author.into(),
            content: comment.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn created_at_is_second_precision_utc() {
        let created_at = Utc
            .with_ymd_and_hms(2025, 3, 1, 9, 30, 15)
            .single()
            .unwrap()
            + chrono::Duration::milliseconds(789);
        let view = CommentView {
            id: Uuid::nil(),
            created_at,
            author: "Ada Lovelace".to_string(),
            content: "Ship it".to_string(),
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["created_at"], "2025-03-01T09:30:15Z");
        assert_eq!(json["author"], "Ada Lovelace");
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["author", "content", "created_at", "id"]);
    }
}
