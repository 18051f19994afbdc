//! Markdown cards attached to nodes

use serde::{Deserialize, Serialize};

/// A markdown document attached to exactly one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub node_id: String,
    pub mindmap_id: i64,
    /// Sequence number scoped to (mindmap, node)
    pub cid: u32,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub order: i64,
}

/// Fields for a card that has not been stored yet
///
/// The store assigns `id` and `cid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    pub node_id: String,
    pub mindmap_id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub order: i64,
}

impl NewCard {
    pub fn new(
        mindmap_id: i64,
        node_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            mindmap_id,
            title: title.into(),
            content: content.into(),
            order: 0,
        }
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    /// Materialize into a stored card
    pub fn into_card(self, id: impl Into<String>, cid: u32) -> Card {
        Card {
            id: id.into(),
            node_id: self.node_id,
            mindmap_id: self.mindmap_id,
            cid,
            title: self.title,
            content: self.content,
            order: self.order,
        }
    }
}

/// Targeted update of a card's editable fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub order: Option<i64>,
}

impl CardUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.order.is_none()
    }

    pub fn apply(&self, card: &mut Card) {
        if let Some(ref title) = self.title {
            card.title = title.clone();
        }
        if let Some(ref content) = self.content {
            card.content = content.clone();
        }
        if let Some(order) = self.order {
            card.order = order;
        }
    }
}
