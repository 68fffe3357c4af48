//! Card and project CRUD helpers used by the CLI.
//!
//! These are deliberately thin repository-backed operations; everything
//! interesting happens in `cardlink-core`. [`save_card`] is the seam
//! between the two: it runs the reference synchronizer on the new text
//! and persists the normalized result as the card's content.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use cardlink_core::models::{CardId, ProjectId};
use cardlink_core::parse::ParseOutcome;
use cardlink_core::sync::sync_references;

use crate::sqlite_store::SqliteCardStore;

/// A full card row.
#[derive(Debug, Clone)]
pub struct Card {
    pub id: CardId,
    pub project_id: ProjectId,
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
}

pub async fn create_card(
    pool: &SqlitePool,
    project_id: ProjectId,
    title: &str,
    summary: Option<&str>,
) -> Result<CardId> {
    let title = title.trim();
    if title.is_empty() {
        bail!("card title must not be empty");
    }
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query(
        "INSERT INTO cards (project_id, title, summary, content, created_at, updated_at) \
         VALUES (?, ?, ?, '', ?, ?)",
    )
    .bind(project_id)
    .bind(title)
    .bind(summary)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_card(pool: &SqlitePool, card_id: CardId) -> Result<Option<Card>> {
    let row = sqlx::query(
        "SELECT id, project_id, title, summary, content FROM cards WHERE id = ?",
    )
    .bind(card_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Card {
        id: r.get("id"),
        project_id: r.get("project_id"),
        title: r.get("title"),
        summary: r.get("summary"),
        content: r.get("content"),
    }))
}

pub async fn list_cards(pool: &SqlitePool, project_id: ProjectId) -> Result<Vec<Card>> {
    let rows = sqlx::query(
        "SELECT id, project_id, title, summary, content FROM cards \
         WHERE project_id = ? ORDER BY id ASC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|r| Card {
            id: r.get("id"),
            project_id: r.get("project_id"),
            title: r.get("title"),
            summary: r.get("summary"),
            content: r.get("content"),
        })
        .collect())
}

async fn set_card_content(pool: &SqlitePool, card_id: CardId, content: &str) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query("UPDATE cards SET content = ?, updated_at = ? WHERE id = ?")
        .bind(content)
        .bind(now)
        .bind(card_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Save new text onto a card: synchronize its references, then persist
/// the normalized text as the card's content.
pub async fn save_card(
    store: &SqliteCardStore,
    card_id: CardId,
    text: &str,
) -> Result<ParseOutcome> {
    let card = match get_card(store.pool(), card_id).await? {
        Some(card) => card,
        None => bail!("no such card: {card_id}"),
    };
    let outcome = sync_references(store, card.project_id, card.id, text).await?;
    debug!(card = card.id, tokens = outcome.tokens.len(), "persisting normalized content");
    set_card_content(store.pool(), card.id, &outcome.text).await?;
    Ok(outcome)
}
