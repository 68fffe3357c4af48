//! Storage abstraction for Cardlink.
//!
//! The [`CardStore`] trait defines every collaborator operation the
//! synchronizer needs, enabling pluggable backends (SQLite, in-memory,
//! an application's own repository layer).
//!
//! Implementations must be `Send + Sync` to work with async runtimes. The
//! synchronizer never caches anything returned from a store across calls;
//! tags are owned by the store and only read and mutated through this
//! interface.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CardId, CardSummary, NewTag, ProjectId, TagId, TagRecord};

/// Abstract card/tag backend consumed by the reference synchronizer.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_cards_by_project`](CardStore::list_cards_by_project) | Card listing for the title index |
/// | [`list_card_tags`](CardStore::list_card_tags) | All tags associated with a card |
/// | [`create_tag`](CardStore::create_tag) | Create a tag, returning its id |
/// | [`update_tag_name`](CardStore::update_tag_name) | Rename a tag |
/// | [`update_tag_annotation`](CardStore::update_tag_annotation) | Replace a tag's annotation blob |
/// | [`delete_tag`](CardStore::delete_tag) | Delete a tag and its associations |
/// | [`associate_tag_with_card`](CardStore::associate_tag_with_card) | Attach a tag to a card |
#[async_trait]
pub trait CardStore: Send + Sync {
    /// List every card in a project (id, title, optional summary).
    async fn list_cards_by_project(&self, project_id: ProjectId) -> Result<Vec<CardSummary>>;

    /// List every tag associated with a card, all namespaces included.
    async fn list_card_tags(&self, card_id: CardId) -> Result<Vec<TagRecord>>;

    /// Create a tag and return its store-assigned id.
    async fn create_tag(&self, tag: &NewTag) -> Result<TagId>;

    /// Rename an existing tag.
    async fn update_tag_name(&self, tag_id: TagId, name: &str) -> Result<()>;

    /// Replace an existing tag's annotation blob.
    async fn update_tag_annotation(
        &self,
        tag_id: TagId,
        annotation: &serde_json::Value,
    ) -> Result<()>;

    /// Delete a tag together with its card associations.
    async fn delete_tag(&self, tag_id: TagId) -> Result<()>;

    /// Associate a tag with a card. Idempotent.
    async fn associate_tag_with_card(&self, card_id: CardId, tag_id: TagId) -> Result<()>;
}
