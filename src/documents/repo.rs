use axum::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::enhancer::Enhancement;

/// Document row as stored. The original text lives in `original_text`; the
/// public API renames it to `content` on every read path.
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub original_text: String,
    pub enhanced_text: Option<String>,
    pub improvements: Option<Vec<String>>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: Uuid,
    pub name: String,
    pub original_text: String,
    pub enhancement: Option<Enhancement>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    pub name: Option<String>,
    pub content: Option<String>,
}

/// Persistence boundary for documents. Every operation is scoped to the
/// owning user so a foreign document behaves as absent.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// All documents owned by the user, newest first.
    async fn list_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<Document>>;
    async fn get(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Document>>;
    async fn create(&self, new: NewDocument) -> anyhow::Result<Document>;
    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: DocumentPatch,
    ) -> anyhow::Result<Option<Document>>;
    /// Writes enhanced text and improvements as one atomic update.
    async fn set_enhancement(
        &self,
        user_id: Uuid,
        id: Uuid,
        enhancement: Enhancement,
    ) -> anyhow::Result<Option<Document>>;
    /// Returns false when no row matched.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgDocumentRepository {
    db: PgPool,
}

impl PgDocumentRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn list_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, user_id, name, original_text, enhanced_text, improvements, created_at
            FROM documents
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, user_id, name, original_text, enhanced_text, improvements, created_at
            FROM documents
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create(&self, new: NewDocument) -> anyhow::Result<Document> {
        let (enhanced_text, improvements) = match new.enhancement {
            Some(e) => (Some(e.enhanced_text), Some(e.improvements)),
            None => (None, None),
        };
        let row = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (user_id, name, original_text, enhanced_text, improvements)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, original_text, enhanced_text, improvements, created_at
            "#,
        )
        .bind(new.user_id)
        .bind(&new.name)
        .bind(&new.original_text)
        .bind(enhanced_text)
        .bind(improvements)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: DocumentPatch,
    ) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET name = COALESCE($3, name),
                original_text = COALESCE($4, original_text)
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, original_text, enhanced_text, improvements, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(patch.name)
        .bind(patch.content)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn set_enhancement(
        &self,
        user_id: Uuid,
        id: Uuid,
        enhancement: Enhancement,
    ) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET enhanced_text = $3, improvements = $4
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, original_text, enhanced_text, improvements, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(enhancement.enhanced_text)
        .bind(enhancement.improvements)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-memory repository used by `AppState::fake` and handler tests.
#[derive(Default)]
pub struct MemoryDocumentRepository {
    docs: std::sync::Mutex<Vec<Document>>,
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn list_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<Document>> {
        let docs = self.docs.lock().expect("documents lock");
        let mut rows: Vec<Document> = docs
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        // Newest first; ties keep the most recently inserted ahead.
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Document>> {
        let docs = self.docs.lock().expect("documents lock");
        Ok(docs
            .iter()
            .find(|d| d.id == id && d.user_id == user_id)
            .cloned())
    }

    async fn create(&self, new: NewDocument) -> anyhow::Result<Document> {
        let (enhanced_text, improvements) = match new.enhancement {
            Some(e) => (Some(e.enhanced_text), Some(e.improvements)),
            None => (None, None),
        };
        let doc = Document {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            name: new.name,
            original_text: new.original_text,
            enhanced_text,
            improvements,
            created_at: OffsetDateTime::now_utc(),
        };
        self.docs.lock().expect("documents lock").push(doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: DocumentPatch,
    ) -> anyhow::Result<Option<Document>> {
        let mut docs = self.docs.lock().expect("documents lock");
        let Some(doc) = docs.iter_mut().find(|d| d.id == id && d.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            doc.name = name;
        }
        if let Some(content) = patch.content {
            doc.original_text = content;
        }
        Ok(Some(doc.clone()))
    }

    async fn set_enhancement(
        &self,
        user_id: Uuid,
        id: Uuid,
        enhancement: Enhancement,
    ) -> anyhow::Result<Option<Document>> {
        let mut docs = self.docs.lock().expect("documents lock");
        let Some(doc) = docs.iter_mut().find(|d| d.id == id && d.user_id == user_id) else {
            return Ok(None);
        };
        doc.enhanced_text = Some(enhancement.enhanced_text);
        doc.improvements = Some(enhancement.improvements);
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut docs = self.docs.lock().expect("documents lock");
        let before = docs.len();
        docs.retain(|d| !(d.id == id && d.user_id == user_id));
        Ok(docs.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_doc(user_id: Uuid, name: &str) -> NewDocument {
        NewDocument {
            user_id,
            name: name.into(),
            original_text: format!("{name} body"),
            enhancement: None,
        }
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner_and_newest_first() {
        let repo = MemoryDocumentRepository::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        repo.create(new_doc(alice, "first")).await.unwrap();
        repo.create(new_doc(alice, "second")).await.unwrap();
        repo.create(new_doc(bob, "other")).await.unwrap();

        let rows = repo.list_by_owner(alice).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "second");
        assert_eq!(rows[1].name, "first");
    }

    #[tokio::test]
    async fn foreign_document_behaves_as_absent() {
        let repo = MemoryDocumentRepository::default();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let doc = repo.create(new_doc(owner, "secret")).await.unwrap();

        assert!(repo.get(intruder, doc.id).await.unwrap().is_none());
        assert!(repo
            .update(intruder, doc.id, DocumentPatch::default())
            .await
            .unwrap()
            .is_none());
        assert!(!repo.delete(intruder, doc.id).await.unwrap());
        // Still there for the owner.
        assert!(repo.get(owner, doc.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn partial_update_leaves_other_field_untouched() {
        let repo = MemoryDocumentRepository::default();
        let owner = Uuid::new_v4();
        let doc = repo.create(new_doc(owner, "draft")).await.unwrap();

        let renamed = repo
            .update(
                owner,
                doc.id,
                DocumentPatch {
                    name: Some("renamed".into()),
                    content: None,
                },
            )
            .await
            .unwrap()
            .expect("document exists");
        assert_eq!(renamed.name, "renamed");
        assert_eq!(renamed.original_text, "draft body");

        let rewritten = repo
            .update(
                owner,
                doc.id,
                DocumentPatch {
                    name: None,
                    content: Some("new body".into()),
                },
            )
            .await
            .unwrap()
            .expect("document exists");
        assert_eq!(rewritten.name, "renamed");
        assert_eq!(rewritten.original_text, "new body");
    }

    #[tokio::test]
    async fn set_enhancement_writes_both_fields() {
        let repo = MemoryDocumentRepository::default();
        let owner = Uuid::new_v4();
        let doc = repo.create(new_doc(owner, "draft")).await.unwrap();
        assert!(doc.enhanced_text.is_none());
        assert!(doc.improvements.is_none());

        let updated = repo
            .set_enhancement(
                owner,
                doc.id,
                Enhancement {
                    enhanced_text: "better".into(),
                    improvements: vec!["clearer".into()],
                },
            )
            .await
            .unwrap()
            .expect("document exists");
        assert_eq!(updated.enhanced_text.as_deref(), Some("better"));
        assert_eq!(updated.improvements, Some(vec!["clearer".to_string()]));
    }

    #[tokio::test]
    async fn delete_then_get_is_absent() {
        let repo = MemoryDocumentRepository::default();
        let owner = Uuid::new_v4();
        let doc = repo.create(new_doc(owner, "gone")).await.unwrap();
        assert!(repo.delete(owner, doc.id).await.unwrap());
        assert!(repo.get(owner, doc.id).await.unwrap().is_none());
        assert!(!repo.delete(owner, doc.id).await.unwrap());
    }
}
