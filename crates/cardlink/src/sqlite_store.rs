//! SQLite-backed [`CardStore`] implementation.
//!
//! Maps each collaborator operation the synchronizer needs onto the
//! cards/tags/card_tags schema created by [`crate::migrate`].

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use cardlink_core::models::{CardId, CardSummary, NewTag, ProjectId, TagId, TagRecord};
use cardlink_core::store::CardStore;

/// SQLite implementation of the [`CardStore`] trait.
pub struct SqliteCardStore {
    pool: SqlitePool,
}

impl SqliteCardStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CardStore for SqliteCardStore {
    async fn list_cards_by_project(&self, project_id: ProjectId) -> Result<Vec<CardSummary>> {
        let rows = sqlx::query("SELECT id, title, summary FROM cards WHERE project_id = ?")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| CardSummary {
                id: row.get("id"),
                title: row.get("title"),
                summary: row.get("summary"),
            })
            .collect())
    }

    async fn list_card_tags(&self, card_id: CardId) -> Result<Vec<TagRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.namespace, t.annotation_json
            FROM tags t
            JOIN card_tags ct ON ct.tag_id = t.id
            WHERE ct.card_id = ?
            ORDER BY t.id ASC
            "#,
        )
        .bind(card_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let annotation_json: String = row.get("annotation_json");
                TagRecord {
                    id: row.get("id"),
                    name: row.get("name"),
                    namespace: row.get("namespace"),
                    annotation: serde_json::from_str(&annotation_json)
                        .unwrap_or(serde_json::json!({})),
                }
            })
            .collect())
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<TagId> {
        let annotation_json = serde_json::to_string(&tag.annotation)?;
        let result = sqlx::query(
            "INSERT INTO tags (project_id, name, namespace, annotation_json) VALUES (?, ?, ?, ?)",
        )
        .bind(tag.project_id)
        .bind(&tag.name)
        .bind(&tag.namespace)
        .bind(&annotation_json)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update_tag_name(&self, tag_id: TagId, name: &str) -> Result<()> {
        sqlx::query("UPDATE tags SET name = ? WHERE id = ?")
            .bind(name)
            .bind(tag_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_tag_annotation(
        &self,
        tag_id: TagId,
        annotation: &serde_json::Value,
    ) -> Result<()> {
        let annotation_json = serde_json::to_string(annotation)?;
        sqlx::query("UPDATE tags SET annotation_json = ? WHERE id = ?")
            .bind(&annotation_json)
            .bind(tag_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_tag(&self, tag_id: TagId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM card_tags WHERE tag_id = ?")
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn associate_tag_with_card(&self, card_id: CardId, tag_id: TagId) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO card_tags (card_id, tag_id) VALUES (?, ?)")
            .bind(card_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
