//! Core data models used throughout Cardlink.
//!
//! These types represent the cards, tags, and reference tokens that flow
//! through the parsing and synchronization pipeline. Backlink payloads are
//! carried as a tagged enum ([`TagAnnotation`]) so that backlink records
//! are distinguished from other structured tag payloads by type, not by
//! inspecting loose JSON at every call site.

use serde::{Deserialize, Serialize};

/// Store-assigned project identifier.
pub type ProjectId = i64;
/// Store-assigned card identifier.
pub type CardId = i64;
/// Store-assigned tag identifier.
pub type TagId = i64;

/// Tag namespace reserved for materialized backlink annotations.
///
/// Tags in this namespace are never shown alongside user-facing tags; they
/// exist so backlinks are addressable and cleaned up through the same
/// storage mechanism as ordinary tags.
pub const REF_TAG_NAMESPACE: &str = "sys:ref";

/// Display name of last resort for a backlink tag whose reference has both
/// an empty placeholder and an empty title.
pub const DEFAULT_REF_NAME: &str = "reference";

/// One entry of a project's card listing: enough to build a title index.
#[derive(Debug, Clone)]
pub struct CardSummary {
    pub id: CardId,
    pub title: String,
    pub summary: Option<String>,
}

/// A persisted tag as returned by the store, annotation payload opaque.
#[derive(Debug, Clone)]
pub struct TagRecord {
    pub id: TagId,
    pub name: String,
    pub namespace: String,
    pub annotation: serde_json::Value,
}

/// A tag creation request.
#[derive(Debug, Clone)]
pub struct NewTag {
    pub project_id: ProjectId,
    pub name: String,
    pub namespace: String,
    pub annotation: serde_json::Value,
}

/// One occurrence of a reference in card text.
///
/// Tokens are transient: they are owned by the parse call that produced
/// them and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefToken {
    /// Trimmed display name of the target, as written by the user.
    pub title: String,
    /// Untrimmed user-visible label. May be empty; consumers fall back to
    /// `title`.
    pub placeholder: String,
    /// Stable identifier, generated once and round-tripped verbatim on
    /// every subsequent parse. Never empty.
    pub ref_id: String,
    /// Byte offset of the token's start in the normalized text.
    pub index: usize,
    /// Fully-normalized literal text of the token, used to rewrite the
    /// document.
    pub raw: String,
}

/// Structured payload stored inside a tag's annotation blob.
///
/// Internally tagged on `"type"` so that backlink records can share tag
/// storage with other structured payloads without string sniffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TagAnnotation {
    #[serde(rename = "backlink")]
    Backlink(BacklinkAnnotation),
}

/// One materialized reference from a source card to a target card.
///
/// Wire field names are fixed for compatibility with persisted documents:
/// `refId`, `sourceCardId`, `targetCardId`, `titleSnapshot`, `placeholder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklinkAnnotation {
    pub ref_id: String,
    pub source_card_id: CardId,
    pub target_card_id: CardId,
    pub title_snapshot: String,
    pub placeholder: String,
}

impl BacklinkAnnotation {
    /// Read a backlink out of a stored annotation blob.
    ///
    /// Returns `None` for anything that is not a well-formed backlink with
    /// a non-empty `refId` — such records are corrupt and get deleted on
    /// the next sync.
    pub fn from_tag_value(value: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value::<TagAnnotation>(value.clone()) {
            Ok(TagAnnotation::Backlink(backlink)) if !backlink.ref_id.is_empty() => Some(backlink),
            _ => None,
        }
    }

    /// Serialize into the annotation blob stored on the tag.
    pub fn to_tag_value(&self) -> serde_json::Value {
        serde_json::to_value(TagAnnotation::Backlink(self.clone())).unwrap_or_default()
    }
}
