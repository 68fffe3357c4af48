//! Backlink reconciliation planner.
//!
//! Pure diff between the tokens parsed out of a card's text and the
//! backlink tags already persisted for that card. The resulting
//! [`SyncPlan`] is the minimal operation set that makes the persisted
//! state match the text:
//!
//! - a resolved token with no existing annotation becomes a **create**;
//! - a resolved token whose existing annotation drifted (name or payload)
//!   becomes an **update**; an unchanged one produces nothing, which is
//!   what makes back-to-back syncs converge to zero operations;
//! - an unresolved token (unknown or ambiguous title) produces nothing and
//!   retains nothing, so its stale annotation falls into the delete set;
//! - corrupt records (annotation without a readable ref id) are always
//!   deleted.

use std::collections::{HashMap, HashSet};

use crate::models::{
    BacklinkAnnotation, CardId, RefToken, TagId, TagRecord, DEFAULT_REF_NAME,
};
use crate::resolve::{TitleIndex, TitleResolution};

/// Create one backlink tag and associate it with the source card.
#[derive(Debug, Clone, PartialEq)]
pub struct TagCreate {
    pub name: String,
    pub annotation: BacklinkAnnotation,
}

/// Touch an existing backlink tag. At least one field is `Some`.
#[derive(Debug, Clone, PartialEq)]
pub struct TagUpdate {
    pub tag_id: TagId,
    pub rename: Option<String>,
    pub annotation: Option<BacklinkAnnotation>,
}

/// The full operation set produced by one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub creates: Vec<TagCreate>,
    pub updates: Vec<TagUpdate>,
    pub deletes: Vec<TagId>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Display name for a backlink tag: placeholder, else title, else a fixed
/// default. The placeholder is used verbatim, whitespace included.
pub fn derive_ref_name(placeholder: &str, title: &str) -> String {
    if !placeholder.is_empty() {
        placeholder.to_string()
    } else if !title.is_empty() {
        title.to_string()
    } else {
        DEFAULT_REF_NAME.to_string()
    }
}

/// Diff parsed tokens against the card's persisted backlink tags.
///
/// `existing` must already be filtered to the reserved namespace. The plan
/// preserves the invariant of at most one annotation per ref id per source
/// card: duplicate ref ids among `existing` keep only the last record, and
/// duplicate ref ids among `tokens` (a copy-pasted comment) keep only the
/// first occurrence.
pub fn plan_sync(
    source_card_id: CardId,
    tokens: &[RefToken],
    index: &TitleIndex,
    existing: &[TagRecord],
) -> SyncPlan {
    let mut plan = SyncPlan::default();

    // Partition persisted records: readable backlinks keyed by ref id,
    // everything else scheduled for deletion (self-healing).
    let mut by_ref: HashMap<String, (TagId, String, BacklinkAnnotation)> = HashMap::new();
    for tag in existing {
        match BacklinkAnnotation::from_tag_value(&tag.annotation) {
            Some(backlink) => {
                let key = backlink.ref_id.clone();
                if let Some((shadowed, _, _)) =
                    by_ref.insert(key, (tag.id, tag.name.clone(), backlink))
                {
                    plan.deletes.push(shadowed);
                }
            }
            None => plan.deletes.push(tag.id),
        }
    }

    let mut retained: HashSet<&str> = HashSet::new();
    for token in tokens {
        if retained.contains(token.ref_id.as_str()) {
            continue;
        }
        let target_card_id = match index.resolve(&token.title) {
            TitleResolution::Unique(id) => id,
            // Ambiguous or unknown titles stay unmaterialized; any stale
            // annotation under this ref id gets swept below.
            TitleResolution::Ambiguous | TitleResolution::NotFound => continue,
        };
        retained.insert(&token.ref_id);

        let annotation = BacklinkAnnotation {
            ref_id: token.ref_id.clone(),
            source_card_id,
            target_card_id,
            title_snapshot: token.title.clone(),
            placeholder: token.placeholder.clone(),
        };
        let name = derive_ref_name(&token.placeholder, &token.title);

        match by_ref.get(&token.ref_id) {
            Some((tag_id, current_name, current)) => {
                let rename = (current_name != &name).then_some(name);
                let refresh = (current != &annotation).then_some(annotation);
                if rename.is_some() || refresh.is_some() {
                    plan.updates.push(TagUpdate {
                        tag_id: *tag_id,
                        rename,
                        annotation: refresh,
                    });
                }
            }
            None => plan.creates.push(TagCreate { name, annotation }),
        }
    }

    for (ref_id, (tag_id, _, _)) in &by_ref {
        if !retained.contains(ref_id.as_str()) {
            plan.deletes.push(*tag_id);
        }
    }

    plan
}
