//! In-memory [`CardStore`] implementation for tests and embedders.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! Ids are handed out from a single atomic counter, so card and tag ids
//! never collide within one store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CardId, CardSummary, NewTag, ProjectId, TagId, TagRecord};

use super::CardStore;

struct StoredCard {
    project_id: ProjectId,
    card: CardSummary,
}

struct StoredTag {
    #[allow(dead_code)]
    project_id: ProjectId,
    name: String,
    namespace: String,
    annotation: serde_json::Value,
}

/// In-memory store for tests and host applications without a database.
pub struct InMemoryCardStore {
    cards: RwLock<Vec<StoredCard>>,
    tags: RwLock<HashMap<TagId, StoredTag>>,
    links: RwLock<Vec<(CardId, TagId)>>,
    next_id: AtomicI64,
}

impl InMemoryCardStore {
    pub fn new() -> Self {
        Self {
            cards: RwLock::new(Vec::new()),
            tags: RwLock::new(HashMap::new()),
            links: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Add a card with a caller-chosen id.
    pub fn add_card(&self, project_id: ProjectId, id: CardId, title: &str) {
        self.cards.write().unwrap().push(StoredCard {
            project_id,
            card: CardSummary {
                id,
                title: title.to_string(),
                summary: None,
            },
        });
    }

    /// Insert a pre-existing tag and associate it with a card, returning
    /// the new tag id. Used to seed persisted backlink state.
    pub fn seed_tag(
        &self,
        project_id: ProjectId,
        card_id: CardId,
        name: &str,
        namespace: &str,
        annotation: serde_json::Value,
    ) -> TagId {
        let tag_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.tags.write().unwrap().insert(
            tag_id,
            StoredTag {
                project_id,
                name: name.to_string(),
                namespace: namespace.to_string(),
                annotation,
            },
        );
        self.links.write().unwrap().push((card_id, tag_id));
        tag_id
    }

    /// Snapshot of a card's tags, outside the trait for synchronous
    /// assertions in tests.
    pub fn tags_for_card(&self, card_id: CardId) -> Vec<TagRecord> {
        let links = self.links.read().unwrap();
        let tags = self.tags.read().unwrap();
        let mut records: Vec<TagRecord> = links
            .iter()
            .filter(|(c, _)| *c == card_id)
            .filter_map(|(_, t)| {
                tags.get(t).map(|stored| TagRecord {
                    id: *t,
                    name: stored.name.clone(),
                    namespace: stored.namespace.clone(),
                    annotation: stored.annotation.clone(),
                })
            })
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }
}

impl Default for InMemoryCardStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CardStore for InMemoryCardStore {
    async fn list_cards_by_project(&self, project_id: ProjectId) -> Result<Vec<CardSummary>> {
        let cards = self.cards.read().unwrap();
        Ok(cards
            .iter()
            .filter(|c| c.project_id == project_id)
            .map(|c| c.card.clone())
            .collect())
    }

    async fn list_card_tags(&self, card_id: CardId) -> Result<Vec<TagRecord>> {
        Ok(self.tags_for_card(card_id))
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<TagId> {
        let tag_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.tags.write().unwrap().insert(
            tag_id,
            StoredTag {
                project_id: tag.project_id,
                name: tag.name.clone(),
                namespace: tag.namespace.clone(),
                annotation: tag.annotation.clone(),
            },
        );
        Ok(tag_id)
    }

    async fn update_tag_name(&self, tag_id: TagId, name: &str) -> Result<()> {
        let mut tags = self.tags.write().unwrap();
        let stored = tags
            .get_mut(&tag_id)
            .ok_or_else(|| anyhow::anyhow!("no such tag: {tag_id}"))?;
        stored.name = name.to_string();
        Ok(())
    }

    async fn update_tag_annotation(
        &self,
        tag_id: TagId,
        annotation: &serde_json::Value,
    ) -> Result<()> {
        let mut tags = self.tags.write().unwrap();
        let stored = tags
            .get_mut(&tag_id)
            .ok_or_else(|| anyhow::anyhow!("no such tag: {tag_id}"))?;
        stored.annotation = annotation.clone();
        Ok(())
    }

    async fn delete_tag(&self, tag_id: TagId) -> Result<()> {
        self.tags.write().unwrap().remove(&tag_id);
        self.links.write().unwrap().retain(|(_, t)| *t != tag_id);
        Ok(())
    }

    async fn associate_tag_with_card(&self, card_id: CardId, tag_id: TagId) -> Result<()> {
        let mut links = self.links.write().unwrap();
        if !links.contains(&(card_id, tag_id)) {
            links.push((card_id, tag_id));
        }
        Ok(())
    }
}
