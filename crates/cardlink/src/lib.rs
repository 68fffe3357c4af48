//! # Cardlink
//!
//! **Reference annotation and backlink synchronization for card-based
//! notes.**
//!
//! Cardlink keeps free-text note cards and their backlink index in sync.
//! Cards may embed references to other cards with the
//! `[[title]](placeholder)` syntax; on every save the engine normalizes
//! the text (assigning a stable ref id to each reference) and reconciles
//! the card's materialized backlinks — stored as tags in a reserved
//! namespace — against what the text actually says.
//!
//! ## Data Flow
//!
//! 1. Raw text → **reference parser** (`cardlink_core::parse`): tokens
//!    get stable ids, orphaned ref comments are stripped, code spans are
//!    left alone.
//! 2. Tokens → **synchronizer** (`cardlink_core::sync`): titles resolve
//!    against the project's live card listing; ambiguous titles stay
//!    unresolved rather than guessing.
//! 3. The minimal create/update/delete set is applied through
//!    [`sqlite_store::SqliteCardStore`], and the normalized text is
//!    persisted as the card's content ([`cards::save_card`]).
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//! | [`sqlite_store`] | SQLite implementation of the `CardStore` collaborator trait |
//! | [`cards`] | Card CRUD helpers and the save-and-sync entry point |
//! | [`backlinks`] | Reverse lookup: cards referencing a given card |

pub mod backlinks;
pub mod cards;
pub mod config;
pub mod db;
pub mod migrate;
pub mod sqlite_store;

pub use cardlink_core::{
    parse_references, sync_references, BacklinkAnnotation, CardStore, InvalidReferenceError,
    ParseOutcome, RefToken, REF_TAG_NAMESPACE,
};
pub use sqlite_store::SqliteCardStore;
