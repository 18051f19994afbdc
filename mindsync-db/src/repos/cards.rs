//! Repository for cards

use chrono::Utc;
use mindsync_core::model::{Card, CardUpdate, NewCard};
use mindsync_core::store::sort_cards;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{Error, Result};

#[derive(Debug, sqlx::FromRow)]
struct CardRow {
    id: String,
    mindmap_id: i64,
    node_id: String,
    cid: i64,
    title: String,
    content: String,
    sort_order: i64,
}

impl CardRow {
    fn into_card(self) -> Result<Card> {
        let cid = u32::try_from(self.cid)
            .map_err(|_| Error::InvalidData(format!("card '{}' has cid {}", self.id, self.cid)))?;
        Ok(Card {
            id: self.id,
            node_id: self.node_id,
            mindmap_id: self.mindmap_id,
            cid,
            title: self.title,
            content: self.content,
            order: self.sort_order,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CardsRepo {
    pool: SqlitePool,
}

impl CardsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Cards of one mindmap, ordered by node, order, cid
    pub async fn list(&self, domain: &str, mindmap_id: i64) -> Result<Vec<Card>> {
        let rows: Vec<CardRow> = sqlx::query_as(
            "SELECT id, mindmap_id, node_id, cid, title, content, sort_order
             FROM cards WHERE domain = ? AND mindmap_id = ?",
        )
        .bind(domain)
        .bind(mindmap_id)
        .fetch_all(&self.pool)
        .await?;

        let mut cards = rows
            .into_iter()
            .map(CardRow::into_card)
            .collect::<Result<Vec<_>>>()?;
        sort_cards(&mut cards);
        Ok(cards)
    }

    pub async fn get(&self, domain: &str, id: &str) -> Result<Card> {
        let row: Option<CardRow> = sqlx::query_as(
            "SELECT id, mindmap_id, node_id, cid, title, content, sort_order
             FROM cards WHERE domain = ? AND id = ?",
        )
        .bind(domain)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| Error::NotFound(format!("card '{}'", id)))?
            .into_card()
    }

    /// Insert with a fresh id and the next cid for its node
    pub async fn create(&self, domain: &str, card: NewCard) -> Result<Card> {
        let mut tx = self.pool.begin().await?;
        let card = insert_next(&mut *tx, domain, card).await?;
        tx.commit().await?;
        Ok(card)
    }

    /// Swap every card of a mindmap for `cards` in one transaction
    ///
    /// Returns how many cards were removed. On any failure the previous cards
    /// stay in place.
    pub async fn replace_for_mindmap(
        &self,
        domain: &str,
        mindmap_id: i64,
        cards: Vec<NewCard>,
    ) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM cards WHERE domain = ? AND mindmap_id = ?")
            .bind(domain)
            .bind(mindmap_id)
            .execute(&mut *tx)
            .await?
            .rows_affected() as usize;

        for card in cards {
            if card.mindmap_id != mindmap_id {
                return Err(Error::InvalidData(format!(
                    "card '{}' belongs to mindmap {}, not {}",
                    card.title, card.mindmap_id, mindmap_id
                )));
            }
            insert_next(&mut *tx, domain, card).await?;
        }

        tx.commit().await?;
        Ok(removed)
    }

    pub async fn update(&self, domain: &str, id: &str, update: &CardUpdate) -> Result<Card> {
        let mut card = self.get(domain, id).await?;
        update.apply(&mut card);

        sqlx::query(
            "UPDATE cards SET title = ?, content = ?, sort_order = ?, updated_at = ?
             WHERE domain = ? AND id = ?",
        )
        .bind(&card.title)
        .bind(&card.content)
        .bind(card.order)
        .bind(Utc::now())
        .bind(domain)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(card)
    }

    pub async fn delete(&self, domain: &str, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM cards WHERE domain = ? AND id = ?")
            .bind(domain)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("card '{}'", id)));
        }
        Ok(())
    }

}

async fn insert_next(conn: &mut SqliteConnection, domain: &str, card: NewCard) -> Result<Card> {
    let (next,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(MAX(cid), 0) + 1 FROM cards
         WHERE domain = ? AND mindmap_id = ? AND node_id = ?",
    )
    .bind(domain)
    .bind(card.mindmap_id)
    .bind(&card.node_id)
    .fetch_one(&mut *conn)
    .await?;
    let cid =
        u32::try_from(next).map_err(|_| Error::InvalidData(format!("cid {} out of range", next)))?;

    let card = card.into_card(uuid::Uuid::new_v4().to_string(), cid);
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO cards (domain, id, mindmap_id, node_id, cid, title, content, sort_order, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(domain)
    .bind(&card.id)
    .bind(card.mindmap_id)
    .bind(&card.node_id)
    .bind(i64::from(card.cid))
    .bind(&card.title)
    .bind(&card.content)
    .bind(card.order)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(card)
}
