//! Reference synchronizer.
//!
//! Given a card's raw text, normalizes it through the parser, resolves
//! every reference against the project's live title index, and reconciles
//! the result with the card's persisted backlink tags through a
//! [`CardStore`].
//!
//! Synchronization is best-effort by design: the editor must never block
//! on it. If either read (card listing or tag listing) fails, the call
//! degrades to parse-only and still returns the normalized text. Failed
//! writes are logged and absorbed; sibling operations proceed.
//!
//! Ordering: both reads complete before any mutation is issued, so the
//! reconciliation diffs against a consistent snapshot. Mutations are then
//! dispatched as three unordered batches: updates, creates (each create
//! chains its card association), deletes. Concurrent syncs of the same
//! card are not serialized; the last writer wins.

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::models::{CardId, NewTag, ProjectId, TagRecord, REF_TAG_NAMESPACE};
use crate::parse::{parse_references, ParseOutcome};
use crate::plan::{plan_sync, SyncPlan};
use crate::resolve::TitleIndex;
use crate::store::CardStore;

/// Normalize `text` and reconcile the card's backlink tags with it.
///
/// Returns the parser's normalized text and token list. The caller is
/// responsible for persisting the normalized text as the card's new
/// content. Collaborator failures never surface as errors.
pub async fn sync_references(
    store: &dyn CardStore,
    project_id: ProjectId,
    source_card_id: CardId,
    text: &str,
) -> Result<ParseOutcome> {
    let outcome = parse_references(text, true)?;

    // Two independent reads; no mutation until both snapshots are in.
    let (cards, tags) = futures::join!(
        store.list_cards_by_project(project_id),
        store.list_card_tags(source_card_id),
    );
    let cards = match cards {
        Ok(cards) => cards,
        Err(err) => {
            warn!(card = source_card_id, %err, "card listing unavailable, skipping backlink sync");
            return Ok(outcome);
        }
    };
    let tags = match tags {
        Ok(tags) => tags,
        Err(err) => {
            warn!(card = source_card_id, %err, "tag listing unavailable, skipping backlink sync");
            return Ok(outcome);
        }
    };

    let existing: Vec<TagRecord> = tags
        .into_iter()
        .filter(|t| t.namespace == REF_TAG_NAMESPACE)
        .collect();
    let index = TitleIndex::build(&cards, source_card_id);
    let plan = plan_sync(source_card_id, &outcome.tokens, &index, &existing);
    if plan.is_empty() {
        debug!(card = source_card_id, "backlinks already converged");
        return Ok(outcome);
    }
    debug!(
        card = source_card_id,
        creates = plan.creates.len(),
        updates = plan.updates.len(),
        deletes = plan.deletes.len(),
        "applying backlink reconciliation"
    );
    apply_plan(store, project_id, source_card_id, plan).await;
    Ok(outcome)
}

/// Execute a plan. Every operation is independent: a failure is logged
/// and the rest of the batch still runs.
async fn apply_plan(
    store: &dyn CardStore,
    project_id: ProjectId,
    source_card_id: CardId,
    plan: SyncPlan,
) {
    join_all(plan.updates.into_iter().map(|update| async move {
        if let Some(name) = &update.rename {
            if let Err(err) = store.update_tag_name(update.tag_id, name).await {
                warn!(tag = update.tag_id, %err, "backlink rename failed");
            }
        }
        if let Some(annotation) = &update.annotation {
            if let Err(err) = store
                .update_tag_annotation(update.tag_id, &annotation.to_tag_value())
                .await
            {
                warn!(tag = update.tag_id, %err, "backlink refresh failed");
            }
        }
    }))
    .await;

    join_all(plan.creates.into_iter().map(|create| async move {
        let tag = NewTag {
            project_id,
            name: create.name,
            namespace: REF_TAG_NAMESPACE.to_string(),
            annotation: create.annotation.to_tag_value(),
        };
        match store.create_tag(&tag).await {
            // Only a successful create gets associated with the card.
            Ok(tag_id) => {
                if let Err(err) = store.associate_tag_with_card(source_card_id, tag_id).await {
                    warn!(tag = tag_id, %err, "backlink association failed");
                }
            }
            Err(err) => {
                warn!(card = source_card_id, %err, "backlink create failed");
            }
        }
    }))
    .await;

    join_all(plan.deletes.into_iter().map(|tag_id| async move {
        if let Err(err) = store.delete_tag(tag_id).await {
            warn!(tag = tag_id, %err, "backlink delete failed");
        }
    }))
    .await;
}
