//! Upsert, merge, delete and search over JSONB rows.

use super::helpers::{PgContext, owner, pg};
use chrono::{Duration, Utc};
use mcp_registry::registry::{
    domain::{PageRequest, Principal, ServerId, ServerPatch, ServerQuery, TextMatch},
    ports::{ServerRepository, UpsertOutcome},
};
use rstest::rstest;

fn id(value: &str) -> ServerId {
    ServerId::new(value).expect("valid id")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn upserted_record_round_trips(#[future(awt)] pg: PgContext) {
    let record = pg.record("github", &["create_issue"]);
    let outcome = pg.repository.upsert(&record).await.expect("upsert");

    let stored = pg
        .repository
        .find_by_id(record.id())
        .await
        .expect("find")
        .expect("record exists");

    assert_eq!(outcome, UpsertOutcome::Inserted);
    assert_eq!(stored, record);
    assert_eq!(stored.owner(), &owner());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn upsert_replaces_document_but_keeps_creation_time(#[future(awt)] pg: PgContext) {
    let first = pg.record("github", &["create_issue"]);
    pg.repository.upsert(&first).await.expect("first upsert");

    let replacement = pg
        .record("github", &["merge_pull_request"])
        .replacing(first.created_at() + Duration::days(1));
    let outcome = pg.repository.upsert(&replacement).await.expect("second upsert");
    assert_eq!(outcome, UpsertOutcome::Replaced);

    let stored = pg
        .repository
        .find_by_id(first.id())
        .await
        .expect("find")
        .expect("record exists");
    assert_eq!(stored.tools(), replacement.tools());
    assert_eq!(
        stored.created_at().timestamp_micros(),
        first.created_at().timestamp_micros()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn upsert_leaves_a_foreign_record_untouched(#[future(awt)] pg: PgContext) {
    let original = pg.record("github", &["create_issue"]);
    pg.repository.upsert(&original).await.expect("first upsert");

    let intruder = Principal::new("intruder@kp.com").expect("valid principal");
    let foreign = pg.record_owned_by("github", &[], intruder);
    let outcome = pg.repository.upsert(&foreign).await.expect("second upsert");

    let stored = pg
        .repository
        .find_by_id(original.id())
        .await
        .expect("find")
        .expect("record exists");
    assert_eq!(outcome, UpsertOutcome::OwnerConflict);
    assert_eq!(stored, original);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn merge_updates_only_patched_fields(#[future(awt)] pg: PgContext) {
    let record = pg.record("github", &["create_issue"]);
    pg.repository.upsert(&record).await.expect("upsert");
    let patch = ServerPatch {
        description: Some("Forge bridge".to_owned()),
        ..ServerPatch::default()
    };
    let updated_at = Utc::now() + Duration::minutes(5);

    let merged = pg
        .repository
        .merge(record.id(), &patch, updated_at)
        .await
        .expect("merge")
        .expect("record exists");

    assert_eq!(merged.description(), "Forge bridge");
    assert_eq!(merged.name(), record.name());
    assert_eq!(merged.tools(), record.tools());
    assert_eq!(
        merged.updated_at().timestamp_micros(),
        updated_at.timestamp_micros()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn merge_of_absent_record_returns_none(#[future(awt)] pg: PgContext) {
    let merged = pg
        .repository
        .merge(&id(&pg.server_id("missing")), &ServerPatch::default(), Utc::now())
        .await
        .expect("merge");
    assert!(merged.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_reports_whether_a_row_was_removed(#[future(awt)] pg: PgContext) {
    let record = pg.record("github", &[]);
    pg.repository.upsert(&record).await.expect("upsert");

    assert!(pg.repository.delete(record.id()).await.expect("first delete"));
    assert!(!pg.repository.delete(record.id()).await.expect("second delete"));
    assert!(
        pg.repository
            .find_by_id(record.id())
            .await
            .expect("find")
            .is_none()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn substring_search_pages_in_insertion_order(#[future(awt)] pg: PgContext) {
    for name in ["alpha", "beta", "gamma"] {
        pg.repository
            .upsert(&pg.record(name, &[]))
            .await
            .expect("upsert");
    }
    let query = ServerQuery::all().with_text(TextMatch::contains(pg.namespace.to_uppercase()));

    let first = pg
        .repository
        .search(&query, PageRequest::new(2, 0))
        .await
        .expect("first page");
    let second = pg
        .repository
        .search(&query, PageRequest::new(2, 2))
        .await
        .expect("second page");

    let first_ids: Vec<String> = first.records.iter().map(|r| r.id().to_string()).collect();
    let second_ids: Vec<String> = second.records.iter().map(|r| r.id().to_string()).collect();
    assert_eq!(first.total, 3);
    assert_eq!(second.total, 3);
    assert_eq!(first_ids, [pg.server_id("alpha"), pg.server_id("beta")]);
    assert_eq!(second_ids, [pg.server_id("gamma")]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tool_filter_combines_with_text(#[future(awt)] pg: PgContext) {
    pg.repository
        .upsert(&pg.record("github", &["create_issue", "merge_pull_request"]))
        .await
        .expect("upsert");
    pg.repository
        .upsert(&pg.record("gitlab", &["run_pipeline"]))
        .await
        .expect("upsert");
    let query = ServerQuery::all()
        .with_text(TextMatch::contains(pg.namespace.clone()))
        .with_tool_names(["run_pipeline".to_owned(), "unknown".to_owned()]);

    let page = pg
        .repository
        .search(&query, PageRequest::default())
        .await
        .expect("search");

    assert_eq!(page.total, 1);
    assert_eq!(
        page.records.first().map(|record| record.id().to_string()),
        Some(pg.server_id("gitlab"))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn native_text_search_is_available_with_index(#[future(awt)] pg: PgContext) {
    pg.repository
        .probe_text_search()
        .await
        .expect("probe succeeds");
    pg.repository
        .upsert(&pg.record("github", &[]))
        .await
        .expect("upsert");

    let query = ServerQuery::all().with_text(TextMatch::full_text(pg.namespace.clone()));
    let page = pg
        .repository
        .search(&query, PageRequest::default())
        .await
        .expect("search");

    assert_eq!(page.total, 1);
}
