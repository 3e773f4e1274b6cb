//! Post Entity
//!
//! CMS 게시글 문서입니다. `post` 컬렉션에 저장되며 생성/수정 시각이 자동으로 기록됩니다.

use mongodb::bson::{doc, oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::db::IndexSpec;
use crate::models::discovery::SchemaUnit;
use crate::models::schema::{Schema, SchemaDescriptor};

/// 게시글 문서
///
/// 모든 필드가 선택적이므로 일부 필드만 채운 값을 생성 요청으로 그대로 사용할 수 있습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// 목록 화면용 요약
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// 소프트 삭제 여부
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl PostDoc {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

impl Schema for PostDoc {
    const NAME: &'static str = "PostDoc";
    const COLLECTION: &'static str = "post";
    const TIMESTAMPS: bool = true;

    fn indexes() -> Vec<IndexSpec> {
        vec![IndexSpec::new("created_at_desc", doc! { "createdAt": -1 })]
    }
}

fn post_schemas() -> Vec<SchemaDescriptor> {
    vec![SchemaDescriptor::of::<PostDoc>()]
}

inventory::submit! {
    SchemaUnit { source: "domain::entities::posts", schemas: post_schemas }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    #[test]
    fn test_partial_post_serializes_only_set_fields() {
        let document = bson::to_document(&PostDoc::with_title("draft")).unwrap();

        assert_eq!(document, doc! { "title": "draft" });
    }

    #[test]
    fn test_stored_document_deserializes() {
        let id = ObjectId::new();
        let now = DateTime::now();

        let post: PostDoc = bson::from_document(doc! {
            "_id": id,
            "title": "hello",
            "removed": false,
            "createdAt": now,
            "updatedAt": now,
        })
        .unwrap();

        assert_eq!(post.id, Some(id));
        assert_eq!(post.removed, Some(false));
        assert_eq!(post.created_at, Some(now));
    }
}
