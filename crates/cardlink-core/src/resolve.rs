//! Per-sync title index.
//!
//! Maps trimmed card titles to an explicit three-state resolution so the
//! ambiguous case can never be confused with "absent". The index is built
//! fresh at the start of every sync from the project's card listing,
//! excludes the source card itself (self-reference never resolves), and is
//! discarded when the sync returns.

use std::collections::HashMap;

use crate::models::{CardId, CardSummary};

/// Outcome of resolving a reference title against the card listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleResolution {
    /// Exactly one other card carries this title.
    Unique(CardId),
    /// Two or more other cards carry this title. Ambiguous titles stay
    /// unresolved until the user disambiguates; silently picking one would
    /// create wrong links.
    Ambiguous,
    /// No other card carries this title.
    NotFound,
}

enum Entry {
    Unique(CardId),
    Ambiguous,
}

/// Trimmed-title lookup over a project's cards, minus the source card.
pub struct TitleIndex {
    by_title: HashMap<String, Entry>,
}

impl TitleIndex {
    /// Build the index from a card listing, excluding `source_card_id`.
    pub fn build(cards: &[CardSummary], source_card_id: CardId) -> Self {
        let mut by_title: HashMap<String, Entry> = HashMap::new();
        for card in cards {
            if card.id == source_card_id {
                continue;
            }
            let title = card.title.trim();
            if title.is_empty() {
                continue;
            }
            by_title
                .entry(title.to_string())
                .and_modify(|entry| *entry = Entry::Ambiguous)
                .or_insert(Entry::Unique(card.id));
        }
        Self { by_title }
    }

    pub fn resolve(&self, title: &str) -> TitleResolution {
        match self.by_title.get(title.trim()) {
            Some(Entry::Unique(id)) => TitleResolution::Unique(*id),
            Some(Entry::Ambiguous) => TitleResolution::Ambiguous,
            None => TitleResolution::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: CardId, title: &str) -> CardSummary {
        CardSummary {
            id,
            title: title.to_string(),
            summary: None,
        }
    }

    #[test]
    fn test_unique_title_resolves() {
        let index = TitleIndex::build(&[card(1, "Source"), card(2, "Target")], 1);
        assert_eq!(index.resolve("Target"), TitleResolution::Unique(2));
    }

    #[test]
    fn test_duplicate_title_is_ambiguous() {
        let index = TitleIndex::build(
            &[card(1, "Source"), card(2, "Duplicate"), card(3, "Duplicate")],
            1,
        );
        assert_eq!(index.resolve("Duplicate"), TitleResolution::Ambiguous);
    }

    #[test]
    fn test_unknown_title_is_not_found() {
        let index = TitleIndex::build(&[card(1, "Source")], 1);
        assert_eq!(index.resolve("Missing"), TitleResolution::NotFound);
    }

    #[test]
    fn test_source_card_is_excluded() {
        let index = TitleIndex::build(&[card(1, "Source"), card(2, "Other")], 1);
        assert_eq!(index.resolve("Source"), TitleResolution::NotFound);
    }

    #[test]
    fn test_source_card_does_not_shadow_another_card_with_same_title() {
        // The source card never counts toward ambiguity.
        let index = TitleIndex::build(&[card(1, "Shared"), card(2, "Shared")], 1);
        assert_eq!(index.resolve("Shared"), TitleResolution::Unique(2));
    }

    #[test]
    fn test_titles_are_trimmed_on_both_sides() {
        let index = TitleIndex::build(&[card(1, "Source"), card(2, "  Padded  ")], 1);
        assert_eq!(index.resolve("Padded"), TitleResolution::Unique(2));
        assert_eq!(index.resolve(" Padded "), TitleResolution::Unique(2));
    }
}
