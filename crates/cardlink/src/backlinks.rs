//! Backlink queries: which cards reference a given card.
//!
//! Backlinks are read straight out of the reserved-namespace tags the
//! synchronizer maintains; there is no separate backlink table.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use cardlink_core::models::{BacklinkAnnotation, CardId, REF_TAG_NAMESPACE};

/// One incoming reference to a card.
#[derive(Debug, Clone)]
pub struct Backlink {
    pub source_card_id: CardId,
    pub source_title: String,
    pub ref_id: String,
    pub placeholder: String,
}

/// All cards whose content references `target_card_id`.
///
/// Source titles come from a single join against the annotation payload;
/// a backlink whose source card no longer exists keeps an empty title
/// rather than being dropped.
pub async fn backlinks_for_card(pool: &SqlitePool, target_card_id: CardId) -> Result<Vec<Backlink>> {
    let rows = sqlx::query(
        r#"
        SELECT t.annotation_json,
               COALESCE(c.title, '') AS source_title
        FROM tags t
        LEFT JOIN cards c ON c.id = json_extract(t.annotation_json, '$.sourceCardId')
        WHERE t.namespace = ?
        "#,
    )
    .bind(REF_TAG_NAMESPACE)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let annotation_json: String = row.get("annotation_json");
            let value = serde_json::from_str(&annotation_json).ok()?;
            let annotation = BacklinkAnnotation::from_tag_value(&value)?;
            if annotation.target_card_id != target_card_id {
                return None;
            }
            Some(Backlink {
                source_card_id: annotation.source_card_id,
                source_title: row.get("source_title"),
                ref_id: annotation.ref_id,
                placeholder: annotation.placeholder,
            })
        })
        .collect())
}
