//! End-to-end tests for the reference synchronizer against a real SQLite
//! database: save text onto a card, then assert on the backlink tags the
//! store ends up with.

use tempfile::TempDir;

use cardlink::backlinks::backlinks_for_card;
use cardlink::cards::{create_card, get_card, save_card};
use cardlink::config::Config;
use cardlink::sqlite_store::SqliteCardStore;
use cardlink::{db, migrate, parse_references, BacklinkAnnotation, CardStore, REF_TAG_NAMESPACE};
use cardlink_core::models::{NewTag, TagRecord};

async fn test_store() -> (TempDir, SqliteCardStore) {
    let tmp = TempDir::new().unwrap();
    let config = Config::with_db_path(tmp.path().join("data").join("cardlink.sqlite"));
    let pool = db::connect(&config).await.unwrap();
    migrate::run_migrations(&pool).await.unwrap();
    (tmp, SqliteCardStore::new(pool))
}

async fn ref_tags(store: &SqliteCardStore, card_id: i64) -> Vec<TagRecord> {
    store
        .list_card_tags(card_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.namespace == REF_TAG_NAMESPACE)
        .collect()
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let (_tmp, store) = test_store().await;
    migrate::run_migrations(store.pool()).await.unwrap();
    migrate::run_migrations(store.pool()).await.unwrap();
}

#[tokio::test]
async fn test_resolved_reference_creates_backlink_tag() {
    let (_tmp, store) = test_store().await;
    let source = create_card(store.pool(), 1, "Source", None).await.unwrap();
    let target = create_card(store.pool(), 1, "Target", None).await.unwrap();
    assert_eq!((source, target), (1, 2));

    let outcome = save_card(&store, source, "see [[Target]](go there)")
        .await
        .unwrap();

    let tags = ref_tags(&store, source).await;
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "go there");
    let annotation = BacklinkAnnotation::from_tag_value(&tags[0].annotation).unwrap();
    assert_eq!(annotation.target_card_id, 2);
    assert_eq!(annotation.source_card_id, 1);
    assert_eq!(annotation.title_snapshot, "Target");
    assert_eq!(annotation.placeholder, "go there");
    assert_eq!(annotation.ref_id, outcome.tokens[0].ref_id);

    // The normalized text (with the ref comment) was persisted.
    let card = get_card(store.pool(), source).await.unwrap().unwrap();
    assert_eq!(card.content, outcome.text);
    assert!(card.content.contains("<!--ref:"));
    // And the persisted text passes validation mode.
    parse_references(&card.content, false).unwrap();
}

#[tokio::test]
async fn test_existing_annotation_renamed_in_place() {
    let (_tmp, store) = test_store().await;
    let source = create_card(store.pool(), 1, "Source", None).await.unwrap();
    let target = create_card(store.pool(), 1, "Target", None).await.unwrap();

    let old = BacklinkAnnotation {
        ref_id: "fixed".to_string(),
        source_card_id: source,
        target_card_id: target,
        title_snapshot: "Target".to_string(),
        placeholder: "old name".to_string(),
    };
    let tag_id = store
        .create_tag(&NewTag {
            project_id: 1,
            name: "old name".to_string(),
            namespace: REF_TAG_NAMESPACE.to_string(),
            annotation: old.to_tag_value(),
        })
        .await
        .unwrap();
    store.associate_tag_with_card(source, tag_id).await.unwrap();

    save_card(&store, source, "[[Target]](new name)<!--ref:fixed-->")
        .await
        .unwrap();

    let tags = ref_tags(&store, source).await;
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].id, tag_id, "tag was recreated instead of updated");
    assert_eq!(tags[0].name, "new name");
    let annotation = BacklinkAnnotation::from_tag_value(&tags[0].annotation).unwrap();
    assert_eq!(annotation.placeholder, "new name");
}

#[tokio::test]
async fn test_ambiguous_title_deletes_annotation_and_creates_nothing() {
    let (_tmp, store) = test_store().await;
    let source = create_card(store.pool(), 1, "Source", None).await.unwrap();
    let dup_a = create_card(store.pool(), 1, "Duplicate", None).await.unwrap();
    create_card(store.pool(), 1, "Duplicate", None).await.unwrap();

    let stale = BacklinkAnnotation {
        ref_id: "ref1".to_string(),
        source_card_id: source,
        target_card_id: dup_a,
        title_snapshot: "Duplicate".to_string(),
        placeholder: "link".to_string(),
    };
    let tag_id = store
        .create_tag(&NewTag {
            project_id: 1,
            name: "link".to_string(),
            namespace: REF_TAG_NAMESPACE.to_string(),
            annotation: stale.to_tag_value(),
        })
        .await
        .unwrap();
    store.associate_tag_with_card(source, tag_id).await.unwrap();

    save_card(&store, source, "[[Duplicate]](link)<!--ref:ref1-->")
        .await
        .unwrap();

    assert!(ref_tags(&store, source).await.is_empty());
}

#[tokio::test]
async fn test_corrupt_annotation_is_deleted() {
    let (_tmp, store) = test_store().await;
    let source = create_card(store.pool(), 1, "Source", None).await.unwrap();

    let tag_id = store
        .create_tag(&NewTag {
            project_id: 1,
            name: "???".to_string(),
            namespace: REF_TAG_NAMESPACE.to_string(),
            annotation: serde_json::json!({"garbage": true}),
        })
        .await
        .unwrap();
    store.associate_tag_with_card(source, tag_id).await.unwrap();

    save_card(&store, source, "no references in this text").await.unwrap();

    assert!(ref_tags(&store, source).await.is_empty());
}

#[tokio::test]
async fn test_three_unique_references_three_creates() {
    let (_tmp, store) = test_store().await;
    let source = create_card(store.pool(), 1, "Source", None).await.unwrap();
    create_card(store.pool(), 1, "A", None).await.unwrap();
    create_card(store.pool(), 1, "B", None).await.unwrap();
    create_card(store.pool(), 1, "C", None).await.unwrap();

    save_card(&store, source, "[[A]](a) [[B]](b) [[C]](c)").await.unwrap();

    let tags = ref_tags(&store, source).await;
    assert_eq!(tags.len(), 3);
    let mut names: Vec<String> = tags.iter().map(|t| t.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_saving_twice_changes_nothing() {
    let (_tmp, store) = test_store().await;
    let source = create_card(store.pool(), 1, "Source", None).await.unwrap();
    create_card(store.pool(), 1, "Target", None).await.unwrap();

    let first = save_card(&store, source, "go to [[Target]](t)").await.unwrap();
    let tags_before = ref_tags(&store, source).await;

    let second = save_card(&store, source, &first.text).await.unwrap();
    let tags_after = ref_tags(&store, source).await;

    assert_eq!(first.text, second.text);
    assert_eq!(first.tokens, second.tokens);
    assert_eq!(tags_before.len(), tags_after.len());
    for (before, after) in tags_before.iter().zip(tags_after.iter()) {
        assert_eq!(before.id, after.id);
        assert_eq!(before.name, after.name);
        assert_eq!(before.annotation, after.annotation);
    }
}

#[tokio::test]
async fn test_backlinks_query_finds_referencing_cards() {
    let (_tmp, store) = test_store().await;
    let target = create_card(store.pool(), 1, "Target", None).await.unwrap();
    let alpha = create_card(store.pool(), 1, "Alpha", None).await.unwrap();
    let beta = create_card(store.pool(), 1, "Beta", None).await.unwrap();

    save_card(&store, alpha, "see [[Target]](from alpha)").await.unwrap();
    save_card(&store, beta, "see [[Target]](from beta)").await.unwrap();

    let mut links = backlinks_for_card(store.pool(), target).await.unwrap();
    links.sort_by_key(|l| l.source_card_id);
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].source_title, "Alpha");
    assert_eq!(links[0].placeholder, "from alpha");
    assert_eq!(links[1].source_title, "Beta");
    assert_eq!(links[1].placeholder, "from beta");
}

#[tokio::test]
async fn test_backlink_from_deleted_card_keeps_empty_title() {
    let (_tmp, store) = test_store().await;
    let target = create_card(store.pool(), 1, "Target", None).await.unwrap();
    let source = create_card(store.pool(), 1, "Source", None).await.unwrap();

    save_card(&store, source, "see [[Target]](from source)").await.unwrap();

    sqlx::query("DELETE FROM card_tags WHERE card_id = ?")
        .bind(source)
        .execute(store.pool())
        .await
        .unwrap();
    sqlx::query("DELETE FROM cards WHERE id = ?")
        .bind(source)
        .execute(store.pool())
        .await
        .unwrap();

    let links = backlinks_for_card(store.pool(), target).await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].source_card_id, source);
    assert_eq!(links[0].source_title, "");
    assert_eq!(links[0].placeholder, "from source");
}

#[tokio::test]
async fn test_user_tags_survive_sync() {
    let (_tmp, store) = test_store().await;
    let source = create_card(store.pool(), 1, "Source", None).await.unwrap();

    let user_tag = store
        .create_tag(&NewTag {
            project_id: 1,
            name: "important".to_string(),
            namespace: String::new(),
            annotation: serde_json::json!({}),
        })
        .await
        .unwrap();
    store.associate_tag_with_card(source, user_tag).await.unwrap();

    save_card(&store, source, "no refs").await.unwrap();

    let tags = store.list_card_tags(source).await.unwrap();
    assert!(tags.iter().any(|t| t.id == user_tag && t.name == "important"));
}

#[tokio::test]
async fn test_code_fences_do_not_materialize_backlinks() {
    let (_tmp, store) = test_store().await;
    let source = create_card(store.pool(), 1, "Source", None).await.unwrap();
    create_card(store.pool(), 1, "Target", None).await.unwrap();

    save_card(&store, source, "```\n[[Target]](in code)\n```").await.unwrap();

    assert!(ref_tags(&store, source).await.is_empty());
}
