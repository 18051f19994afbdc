//! Repository for mindmap documents
//!
//! The whole document (branches, history, remote) is one JSON column; title
//! is duplicated into its own column for listing.

use chrono::Utc;
use mindsync_core::MindMap;
use sqlx::SqlitePool;
use tracing::debug;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct MindmapsRepo {
    pool: SqlitePool,
}

impl MindmapsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new document with the next free id in `domain`
    pub async fn create(&self, domain: &str, title: &str) -> Result<MindMap> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) =
            sqlx::query_as("SELECT COALESCE(MAX(id), 0) + 1 FROM mindmaps WHERE domain = ?")
                .bind(domain)
                .fetch_one(&mut *tx)
                .await?;

        let mindmap = MindMap::new(id, title);
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO mindmaps (domain, id, title, document_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(domain)
        .bind(id)
        .bind(&mindmap.title)
        .bind(serde_json::to_string(&mindmap)?)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(domain, id, "Created mindmap");
        Ok(mindmap)
    }

    /// Load and normalize a document
    pub async fn find(&self, domain: &str, id: i64) -> Result<Option<MindMap>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT document_json FROM mindmaps WHERE domain = ? AND id = ?")
                .bind(domain)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(json,)| -> Result<MindMap> {
            let mut mindmap: MindMap = serde_json::from_str(&json)?;
            mindmap.id = id;
            mindmap.normalize();
            Ok(mindmap)
        })
        .transpose()
    }

    pub async fn get(&self, domain: &str, id: i64) -> Result<MindMap> {
        self.find(domain, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("mindmap {} in domain '{}'", id, domain)))
    }

    /// Insert or overwrite the document row
    pub async fn save(&self, domain: &str, mindmap: &MindMap) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO mindmaps (domain, id, title, document_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(domain, id) DO UPDATE SET
                title = excluded.title,
                document_json = excluded.document_json,
                updated_at = excluded.updated_at",
        )
        .bind(domain)
        .bind(mindmap.id)
        .bind(&mindmap.title)
        .bind(serde_json::to_string(mindmap)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// `(id, title)` pairs ordered by id
    pub async fn list(&self, domain: &str) -> Result<Vec<(i64, String)>> {
        let rows = sqlx::query_as("SELECT id, title FROM mindmaps WHERE domain = ? ORDER BY id")
            .bind(domain)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use mindsync_core::model::Node;
    use tempfile::TempDir;

    async fn repo() -> (TempDir, MindmapsRepo) {
        let temp = TempDir::new().unwrap();
        let db = Database::open(temp.path().join("test.db")).await.unwrap();
        (temp, db.mindmaps())
    }

    #[tokio::test]
    async fn test_ids_are_per_domain() {
        let (_temp, repo) = repo().await;
        assert_eq!(repo.create("acme", "One").await.unwrap().id, 1);
        assert_eq!(repo.create("acme", "Two").await.unwrap().id, 2);
        assert_eq!(repo.create("other", "Three").await.unwrap().id, 1);

        assert_eq!(
            repo.list("acme").await.unwrap(),
            vec![(1, "One".to_string()), (2, "Two".to_string())]
        );
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let (_temp, repo) = repo().await;
        let mut mindmap = repo.create("acme", "Plan").await.unwrap();
        let root = mindmap.nodes[0].id.clone();

        mindmap.title = "Renamed".to_string();
        mindmap.content = "# Notes".to_string();
        mindmap.remote = Some("https://github.com/acme/plan.git".to_string());
        mindmap
            .add_node("main", Node::new("t1", "Topic"), Some(root.as_str()))
            .unwrap();
        repo.save("acme", &mindmap).await.unwrap();

        let loaded = repo.get("acme", mindmap.id).await.unwrap();
        assert_eq!(loaded, mindmap);
        assert_eq!(repo.list("acme").await.unwrap()[0].1, "Renamed");
    }

    #[tokio::test]
    async fn test_missing_document() {
        let (_temp, repo) = repo().await;
        assert!(repo.find("acme", 7).await.unwrap().is_none());
        assert!(matches!(repo.get("acme", 7).await, Err(Error::NotFound(_))));
    }
}
