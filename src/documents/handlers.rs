use std::time::Duration;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts, Multipart, Path, State},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    documents::{
        dto::{
            CreateDocumentRequest, DocumentListResponse, DocumentMessageResponse,
            DocumentResponse, DocumentView, UpdateDocumentRequest,
        },
        enhancer::EnhanceTrigger,
        repo::{DocumentPatch, NewDocument},
    },
    error::ApiError,
    extract::Json,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/documents", get(list_documents).post(create_document))
        .route("/documents/upload", post(upload_document))
        .route(
            "/documents/:id",
            get(get_document).put(update_document).delete(delete_document),
        )
        .route("/documents/:id/enhance", post(enhance_document))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB
}

const ALLOWED_MIME_TYPES: [&str; 5] = [
    "text/plain",
    "text/markdown",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Path segment of `/documents/:id`. An id that is not a UUID cannot match
/// any stored document, so it reports the same way as an unknown one.
#[derive(Debug)]
pub struct DocumentId(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for DocumentId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound("Document not found"))?;
        Ok(Self(id))
    }
}

#[instrument(skip(state))]
pub async fn list_documents(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let docs = state
        .documents
        .list_by_owner(user.id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch documents", e))?;
    Ok(Json(DocumentListResponse {
        documents: docs.into_iter().map(DocumentView::from).collect(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_document(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    if payload.name.is_empty() || payload.content.is_empty() {
        return Err(ApiError::Validation("Name and content are required".into()));
    }

    // Documents are pre-enhanced at creation time.
    let enhancement = state
        .enhancer
        .enhance(&payload.content, EnhanceTrigger::Created)
        .await
        .map_err(|e| ApiError::internal("Failed to create document", e))?;

    let doc = state
        .documents
        .create(NewDocument {
            user_id: user.id,
            name: payload.name,
            original_text: payload.content,
            enhancement: Some(enhancement),
        })
        .await
        .map_err(|e| ApiError::internal("Failed to create document", e))?;

    info!(user_id = %user.id, document_id = %doc.id, "document created");
    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse {
            document: DocumentView::from(doc),
        }),
    ))
}

#[instrument(skip(state, multipart))]
pub async fn upload_document(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentMessageResponse>), ApiError> {
    let mut upload: Option<(String, String, bytes::Bytes)> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::internal("Failed to upload file", e.into()))?;
        upload = Some((file_name, content_type, data));
        break;
    }

    let Some((file_name, content_type, data)) = upload else {
        return Err(ApiError::Validation("No file provided".into()));
    };

    if !ALLOWED_MIME_TYPES.contains(&content_type.as_str()) {
        warn!(%content_type, "rejected upload mime type");
        return Err(ApiError::Validation(
            "Unsupported file type. Please upload PDF, DOC, DOCX, TXT, or MD files.".into(),
        ));
    }

    // Text formats are read verbatim; everything else gets a placeholder
    // instead of real extraction.
    let content = match content_type.as_str() {
        "text/plain" | "text/markdown" => String::from_utf8_lossy(&data).into_owned(),
        "application/pdf" => format!(
            "PDF Content from {file_name}\n\nThis is a placeholder for PDF content \
             extraction. In production, this would contain the actual extracted text \
             from the PDF file."
        ),
        _ => format!(
            "Document Content from {file_name}\n\nThis is a placeholder for document \
             content extraction. In production, this would contain the actual \
             extracted text from the document."
        ),
    };

    let enhancement = state
        .enhancer
        .enhance(&content, EnhanceTrigger::Uploaded { file_name: &file_name })
        .await
        .map_err(|e| ApiError::internal("Failed to upload file", e))?;

    let doc = state
        .documents
        .create(NewDocument {
            user_id: user.id,
            name: file_name,
            original_text: content,
            enhancement: Some(enhancement),
        })
        .await
        .map_err(|e| ApiError::internal("Failed to upload file", e))?;

    info!(user_id = %user.id, document_id = %doc.id, "document uploaded");
    Ok((
        StatusCode::CREATED,
        Json(DocumentMessageResponse {
            document: DocumentView::from(doc),
            message: "File uploaded and enhanced successfully".into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_document(
    State(state): State<AppState>,
    user: AuthUser,
    DocumentId(id): DocumentId,
) -> Result<Json<DocumentResponse>, ApiError> {
    let doc = state
        .documents
        .get(user.id, id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch document", e))?
        .ok_or(ApiError::NotFound("Document not found"))?;
    Ok(Json(DocumentResponse {
        document: DocumentView::from(doc),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_document(
    State(state): State<AppState>,
    user: AuthUser,
    DocumentId(id): DocumentId,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let doc = state
        .documents
        .update(
            user.id,
            id,
            DocumentPatch {
                name: payload.name,
                content: payload.content,
            },
        )
        .await
        .map_err(|e| ApiError::internal("Failed to update document", e))?
        .ok_or(ApiError::NotFound("Document not found"))?;
    Ok(Json(DocumentResponse {
        document: DocumentView::from(doc),
    }))
}

#[instrument(skip(state))]
pub async fn delete_document(
    State(state): State<AppState>,
    user: AuthUser,
    DocumentId(id): DocumentId,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state
        .documents
        .delete(user.id, id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete document", e))?;
    if !deleted {
        return Err(ApiError::NotFound("Document not found"));
    }
    info!(user_id = %user.id, document_id = %id, "document deleted");
    Ok(Json(
        serde_json::json!({ "message": "Document deleted successfully" }),
    ))
}

#[instrument(skip(state))]
pub async fn enhance_document(
    State(state): State<AppState>,
    user: AuthUser,
    DocumentId(id): DocumentId,
) -> Result<Json<DocumentMessageResponse>, ApiError> {
    let doc = state
        .documents
        .get(user.id, id)
        .await
        .map_err(|e| ApiError::internal("Failed to enhance document", e))?
        .ok_or(ApiError::NotFound("Document not found"))?;

    // Simulated processing time; only this request waits.
    tokio::time::sleep(Duration::from_millis(state.config.enhance_delay_ms)).await;

    let enhancement = state
        .enhancer
        .enhance(&doc.original_text, EnhanceTrigger::Requested)
        .await
        .map_err(|e| ApiError::internal("Failed to enhance document", e))?;

    // The document can vanish while we sleep; a concurrent delete wins.
    let doc = state
        .documents
        .set_enhancement(user.id, id, enhancement)
        .await
        .map_err(|e| ApiError::internal("Failed to enhance document", e))?
        .ok_or(ApiError::NotFound("Document not found"))?;

    info!(user_id = %user.id, document_id = %id, "document enhanced");
    Ok(Json(DocumentMessageResponse {
        document: DocumentView::from(doc),
        message: "Document enhanced successfully".into(),
    }))
}
