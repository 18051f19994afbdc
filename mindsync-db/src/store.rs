//! [`DocumentStore`] backed by SQLite

use std::path::Path;

use async_trait::async_trait;
use mindsync_core::model::{Card, CardUpdate, MindMap, NewCard};
use mindsync_core::store::DocumentStore;

use crate::{CardsRepo, Database, MindmapsRepo};

/// Persistent store used by the CLI
#[derive(Debug, Clone)]
pub struct SqliteStore {
    mindmaps: MindmapsRepo,
    cards: CardsRepo,
}

impl SqliteStore {
    pub fn new(db: &Database) -> Self {
        Self {
            mindmaps: db.mindmaps(),
            cards: db.cards(),
        }
    }

    /// Open (creating and migrating if needed) the database at `path`
    pub async fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let db = Database::open(path).await?;
        Ok(Self::new(&db))
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn create_mindmap(&self, domain: &str, title: &str) -> mindsync_core::Result<MindMap> {
        Ok(self.mindmaps.create(domain, title).await?)
    }

    async fn load_mindmap(&self, domain: &str, mmid: i64) -> mindsync_core::Result<MindMap> {
        Ok(self.mindmaps.get(domain, mmid).await?)
    }

    async fn save_mindmap(&self, domain: &str, mindmap: &MindMap) -> mindsync_core::Result<()> {
        Ok(self.mindmaps.save(domain, mindmap).await?)
    }

    async fn list_mindmaps(&self, domain: &str) -> mindsync_core::Result<Vec<(i64, String)>> {
        Ok(self.mindmaps.list(domain).await?)
    }

    async fn list_cards(&self, domain: &str, mmid: i64) -> mindsync_core::Result<Vec<Card>> {
        Ok(self.cards.list(domain, mmid).await?)
    }

    async fn create_card(&self, domain: &str, card: NewCard) -> mindsync_core::Result<Card> {
        Ok(self.cards.create(domain, card).await?)
    }

    async fn update_card(
        &self,
        domain: &str,
        id: &str,
        update: &CardUpdate,
    ) -> mindsync_core::Result<Card> {
        Ok(self.cards.update(domain, id, update).await?)
    }

    async fn delete_card(&self, domain: &str, id: &str) -> mindsync_core::Result<()> {
        Ok(self.cards.delete(domain, id).await?)
    }

    async fn replace_cards_for_mindmap(
        &self,
        domain: &str,
        mmid: i64,
        cards: Vec<NewCard>,
    ) -> mindsync_core::Result<usize> {
        Ok(self.cards.replace_for_mindmap(domain, mmid, cards).await?)
    }
}
