//! # Cardlink Core
//!
//! Shared, runtime-agnostic logic for Cardlink: data models, the reference
//! parser, title resolution, backlink reconciliation planning, the
//! synchronizer, and the store abstraction.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Async collaborator calls are expressed through
//! the executor-neutral [`store::CardStore`] trait and `futures`
//! combinators.
//!
//! ## Data Flow
//!
//! 1. Raw card text goes through the **reference parser** ([`parse`]),
//!    which finds `[[title]](placeholder)` tokens, assigns missing stable
//!    ref ids, strips orphaned ref comments, and returns normalized text
//!    plus an ordered token list.
//! 2. The **synchronizer** ([`sync`]) resolves each token's title against
//!    the project's card listing ([`resolve`]), diffs the result against
//!    the card's persisted backlink tags ([`plan`]), and applies the
//!    minimal create/update/delete set through a [`store::CardStore`].
//! 3. The caller persists the normalized text as the card's new content.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Core data types: `CardSummary`, `TagRecord`, `RefToken`, `BacklinkAnnotation` |
//! | [`parse`] | Reference token parser: ref-id assignment, orphan repair, code-span exclusion |
//! | [`resolve`] | Per-sync title index with explicit unique/ambiguous/not-found resolution |
//! | [`plan`] | Pure reconciliation planner: diff tokens against persisted backlink tags |
//! | [`sync`] | Best-effort synchronizer: applies a plan through a `CardStore` |
//! | [`store`] | `CardStore` collaborator trait and the in-memory implementation |

pub mod models;
pub mod parse;
pub mod plan;
pub mod resolve;
pub mod store;
pub mod sync;

pub use models::{
    BacklinkAnnotation, CardId, CardSummary, NewTag, ProjectId, RefToken, TagAnnotation, TagId,
    TagRecord, DEFAULT_REF_NAME, REF_TAG_NAMESPACE,
};
pub use parse::{parse_references, InvalidReferenceError, ParseOutcome};
pub use plan::{plan_sync, SyncPlan};
pub use resolve::{TitleIndex, TitleResolution};
pub use store::CardStore;
pub use sync::sync_references;
