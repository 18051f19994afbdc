//! Versioned-document store seam
//!
//! The orchestrator only needs to load and save whole mindmap documents and
//! to manage the cards attached to them. [`MemoryStore`] backs tests and dry
//! runs; `mindsync-db` provides the SQLite implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::model::{Card, CardUpdate, MindMap, NewCard};
use crate::{Error, Result};

/// Persistence for mindmaps and cards, partitioned by domain
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create an empty mindmap with a fresh id
    async fn create_mindmap(&self, domain: &str, title: &str) -> Result<MindMap>;

    /// Load a mindmap, repairing legacy documents
    async fn load_mindmap(&self, domain: &str, mmid: i64) -> Result<MindMap>;

    /// Overwrite a stored mindmap
    async fn save_mindmap(&self, domain: &str, mindmap: &MindMap) -> Result<()>;

    /// `(id, title)` of every mindmap in a domain
    async fn list_mindmaps(&self, domain: &str) -> Result<Vec<(i64, String)>>;

    /// Cards of one mindmap, ordered by (node, order, cid)
    async fn list_cards(&self, domain: &str, mmid: i64) -> Result<Vec<Card>>;

    /// Store a card, assigning its id and the next cid for its node
    async fn create_card(&self, domain: &str, card: NewCard) -> Result<Card>;

    async fn update_card(&self, domain: &str, id: &str, update: &CardUpdate) -> Result<Card>;

    async fn delete_card(&self, domain: &str, id: &str) -> Result<()>;

    /// Swap every card of a mindmap for `cards`, all or nothing
    ///
    /// Returns how many cards were removed.
    async fn replace_cards_for_mindmap(
        &self,
        domain: &str,
        mmid: i64,
        cards: Vec<NewCard>,
    ) -> Result<usize>;
}

/// Next cid for a node: one past the highest in use
pub fn next_cid<'a>(existing: impl IntoIterator<Item = &'a Card>, mmid: i64, node_id: &str) -> u32 {
    existing
        .into_iter()
        .filter(|c| c.mindmap_id == mmid && c.node_id == node_id)
        .map(|c| c.cid)
        .max()
        .map_or(1, |max| max + 1)
}

/// Sort cards the way [`DocumentStore::list_cards`] returns them
pub fn sort_cards(cards: &mut [Card]) {
    cards.sort_by(|a, b| {
        (a.node_id.as_str(), a.order, a.cid).cmp(&(b.node_id.as_str(), b.order, b.cid))
    });
}

#[derive(Debug, Default)]
struct MemoryState {
    mindmaps: BTreeMap<(String, i64), MindMap>,
    cards: BTreeMap<(String, String), Card>,
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_mindmap(&self, domain: &str, title: &str) -> Result<MindMap> {
        let mut state = self.state.lock().await;
        let id = state
            .mindmaps
            .keys()
            .filter(|(d, _)| d == domain)
            .map(|(_, id)| *id)
            .max()
            .unwrap_or(0)
            + 1;
        let mindmap = MindMap::new(id, title);
        state
            .mindmaps
            .insert((domain.to_string(), id), mindmap.clone());
        Ok(mindmap)
    }

    async fn load_mindmap(&self, domain: &str, mmid: i64) -> Result<MindMap> {
        let state = self.state.lock().await;
        let mut mindmap = state
            .mindmaps
            .get(&(domain.to_string(), mmid))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("mindmap {} in domain '{}'", mmid, domain)))?;
        mindmap.normalize();
        Ok(mindmap)
    }

    async fn save_mindmap(&self, domain: &str, mindmap: &MindMap) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .mindmaps
            .insert((domain.to_string(), mindmap.id), mindmap.clone());
        Ok(())
    }

    async fn list_mindmaps(&self, domain: &str) -> Result<Vec<(i64, String)>> {
        let state = self.state.lock().await;
        Ok(state
            .mindmaps
            .iter()
            .filter(|((d, _), _)| d == domain)
            .map(|((_, id), m)| (*id, m.title.clone()))
            .collect())
    }

    async fn list_cards(&self, domain: &str, mmid: i64) -> Result<Vec<Card>> {
        let state = self.state.lock().await;
        let mut cards: Vec<Card> = state
            .cards
            .iter()
            .filter(|((d, _), c)| d == domain && c.mindmap_id == mmid)
            .map(|(_, c)| c.clone())
            .collect();
        sort_cards(&mut cards);
        Ok(cards)
    }

    async fn create_card(&self, domain: &str, card: NewCard) -> Result<Card> {
        let mut state = self.state.lock().await;
        let cid = next_cid(
            state
                .cards
                .iter()
                .filter(|((d, _), _)| d == domain)
                .map(|(_, c)| c),
            card.mindmap_id,
            &card.node_id,
        );
        let card = card.into_card(uuid::Uuid::new_v4().to_string(), cid);
        state
            .cards
            .insert((domain.to_string(), card.id.clone()), card.clone());
        Ok(card)
    }

    async fn update_card(&self, domain: &str, id: &str, update: &CardUpdate) -> Result<Card> {
        let mut state = self.state.lock().await;
        let card = state
            .cards
            .get_mut(&(domain.to_string(), id.to_string()))
            .ok_or_else(|| Error::NotFound(format!("card '{}'", id)))?;
        update.apply(card);
        Ok(card.clone())
    }

    async fn delete_card(&self, domain: &str, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .cards
            .remove(&(domain.to_string(), id.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("card '{}'", id)))
    }

    async fn replace_cards_for_mindmap(
        &self,
        domain: &str,
        mmid: i64,
        cards: Vec<NewCard>,
    ) -> Result<usize> {
        if let Some(stray) = cards.iter().find(|c| c.mindmap_id != mmid) {
            return Err(Error::Validation(format!(
                "card '{}' belongs to mindmap {}, not {}",
                stray.title, stray.mindmap_id, mmid
            )));
        }

        let mut state = self.state.lock().await;
        let before = state.cards.len();
        state
            .cards
            .retain(|(d, _), c| !(d == domain && c.mindmap_id == mmid));
        let removed = before - state.cards.len();

        let mut fresh: Vec<Card> = Vec::with_capacity(cards.len());
        for card in cards {
            let cid = next_cid(&fresh, mmid, &card.node_id);
            fresh.push(card.into_card(uuid::Uuid::new_v4().to_string(), cid));
        }
        for card in fresh {
            state.cards.insert((domain.to_string(), card.id.clone()), card);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cid_sequence_per_node() {
        let store = MemoryStore::new();
        let a1 = store.create_card("d", NewCard::new(1, "a", "one", "")).await.unwrap();
        let a2 = store.create_card("d", NewCard::new(1, "a", "two", "")).await.unwrap();
        let b1 = store.create_card("d", NewCard::new(1, "b", "three", "")).await.unwrap();
        let other = store.create_card("d", NewCard::new(2, "a", "four", "")).await.unwrap();

        assert_eq!((a1.cid, a2.cid, b1.cid, other.cid), (1, 2, 1, 1));

        store.delete_card("d", &a1.id).await.unwrap();
        let a3 = store.create_card("d", NewCard::new(1, "a", "five", "")).await.unwrap();
        assert_eq!(a3.cid, 3);
    }

    #[tokio::test]
    async fn test_domains_are_isolated() {
        let store = MemoryStore::new();
        let first = store.create_mindmap("one", "A").await.unwrap();
        let second = store.create_mindmap("two", "B").await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 1);

        store.create_card("one", NewCard::new(1, "n", "t", "")).await.unwrap();
        assert_eq!(store.list_cards("one", 1).await.unwrap().len(), 1);
        assert!(store.list_cards("two", 1).await.unwrap().is_empty());
        assert_eq!(store.load_mindmap("two", 1).await.unwrap().title, "B");
    }

    #[tokio::test]
    async fn test_update_and_wipe() {
        let store = MemoryStore::new();
        let card = store.create_card("d", NewCard::new(5, "n", "old", "x")).await.unwrap();
        store.create_card("d", NewCard::new(5, "m", "keep?", "")).await.unwrap();
        store.create_card("d", NewCard::new(6, "n", "other map", "")).await.unwrap();

        let update = CardUpdate {
            title: Some("new".to_string()),
            ..Default::default()
        };
        let updated = store.update_card("d", &card.id, &update).await.unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.content, "x");

        let stray = vec![NewCard::new(5, "r", "ok", ""), NewCard::new(7, "r", "stray", "")];
        let err = store.replace_cards_for_mindmap("d", 5, stray).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.list_cards("d", 5).await.unwrap().len(), 2);

        let imported = vec![NewCard::new(5, "r", "A", ""), NewCard::new(5, "r", "B", "")];
        assert_eq!(store.replace_cards_for_mindmap("d", 5, imported).await.unwrap(), 2);
        let cids: Vec<_> = store
            .list_cards("d", 5)
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.title, c.cid))
            .collect();
        assert_eq!(cids, vec![("A".to_string(), 1), ("B".to_string(), 2)]);
        assert_eq!(store.list_cards("d", 6).await.unwrap().len(), 1);

        let err = store.update_card("d", &card.id, &update).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_mindmap() {
        let store = MemoryStore::new();
        let err = store.load_mindmap("d", 42).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
