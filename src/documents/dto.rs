use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Document;

/// Public document view returned by every endpoint. Storage keeps the
/// original text under `original_text`; here it is exposed as `content`,
/// and `enhanced` is derived from the presence of enhanced text.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    pub enhanced: bool,
    pub enhanced_content: Option<String>,
    pub improvements: Vec<String>,
}

impl From<Document> for DocumentView {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            content: doc.original_text,
            uploaded_at: doc.created_at,
            enhanced: doc.enhanced_text.is_some(),
            enhanced_content: doc.enhanced_text,
            improvements: doc.improvements.unwrap_or_default(),
        }
    }
}

/// Both fields default to empty so an absent field fails the handler's
/// "Name and content are required" check instead of deserialization.
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    pub name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document: DocumentView,
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentView>,
}

/// Upload and enhance responses carry a status message next to the document.
#[derive(Debug, Serialize)]
pub struct DocumentMessageResponse {
    pub document: DocumentView,
    pub message: String,
}
