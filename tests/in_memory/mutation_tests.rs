//! Owner-checked updates and deletes.

use super::helpers::{TestContext, alice, bob, context, server_payload, stored_ids};
use mcp_registry::registry::{
    domain::{Principal, RegistryDomainError, ServerId},
    ports::ServerRepository,
    services::{ForbiddenError, RegistryServiceError},
};
use rstest::rstest;
use serde_json::json;

const GITHUB: &str = "kp.internal.acme/github";

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn owner_update_merges_only_supplied_fields(context: TestContext, alice: Principal) {
    let original = context
        .publish(&alice, server_payload(GITHUB, "GitHub", &["create_issue"]))
        .await;

    let updated = context
        .service
        .update(&alice, GITHUB, json!({"description": "Pull requests too", "version": "1.1.0"}))
        .await
        .expect("update should succeed");

    assert_eq!(updated.description(), "Pull requests too");
    assert_eq!(updated.version(), "1.1.0");
    assert_eq!(updated.name(), original.name());
    assert_eq!(updated.tools(), original.tools());
    assert_eq!(updated.created_at(), original.created_at());
    assert!(updated.updated_at() >= original.updated_at());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_cannot_change_identity_or_owner(
    context: TestContext,
    alice: Principal,
    bob: Principal,
) {
    context
        .publish(&alice, server_payload(GITHUB, "GitHub", &[]))
        .await;

    let updated = context
        .service
        .update(
            &alice,
            GITHUB,
            json!({
                "id": "kp.internal.acme/renamed",
                "owner": bob.as_str(),
                "created_at": "1999-01-01T00:00:00Z",
                "team": "tooling"
            }),
        )
        .await
        .expect("update should succeed");

    assert_eq!(updated.id().as_str(), GITHUB);
    assert_eq!(updated.owner(), &alice);
    assert_eq!(updated.team(), "tooling");
    assert_eq!(stored_ids(context.repository.as_ref()).await, [GITHUB]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_owner_cannot_update_or_delete(context: TestContext, alice: Principal, bob: Principal) {
    let original = context
        .publish(&alice, server_payload(GITHUB, "GitHub", &[]))
        .await;

    let update = context
        .service
        .update(&bob, GITHUB, json!({"name": "Mine now"}))
        .await;
    let delete = context.service.delete(&bob, GITHUB).await;

    assert!(matches!(
        update,
        Err(RegistryServiceError::Forbidden(ForbiddenError::NotOwner))
    ));
    assert!(matches!(
        delete,
        Err(RegistryServiceError::Forbidden(ForbiddenError::NotOwner))
    ));
    let stored = context.service.get(GITHUB).await.expect("record remains");
    assert_eq!(stored, original);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mutating_an_absent_record_is_forbidden(context: TestContext, alice: Principal) {
    let update = context
        .service
        .update(&alice, GITHUB, json!({"name": "Ghost"}))
        .await;
    let delete = context.service.delete(&alice, GITHUB).await;

    assert!(matches!(update, Err(RegistryServiceError::Forbidden(_))));
    assert!(matches!(delete, Err(RegistryServiceError::Forbidden(_))));
}

#[rstest]
#[case(json!({"colour": "blue"}))]
#[case(json!({"tools": "not-a-list"}))]
#[case(json!(["name"]))]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_patch_is_rejected(
    context: TestContext,
    alice: Principal,
    #[case] payload: serde_json::Value,
) {
    context
        .publish(&alice, server_payload(GITHUB, "GitHub", &[]))
        .await;

    let result = context.service.update(&alice, GITHUB, payload).await;

    assert!(matches!(
        result,
        Err(RegistryServiceError::Domain(RegistryDomainError::MalformedPatch(_)))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn patch_with_invalid_metadata_is_rejected(context: TestContext, alice: Principal) {
    context
        .publish(&alice, server_payload(GITHUB, "GitHub", &[]))
        .await;

    let result = context
        .service
        .update(&alice, GITHUB, json!({"metadata": {"name": "GitHub"}}))
        .await;

    assert!(matches!(
        result,
        Err(RegistryServiceError::Domain(RegistryDomainError::Schema(_)))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn owner_delete_removes_record(context: TestContext, alice: Principal) {
    context
        .publish(&alice, server_payload(GITHUB, "GitHub", &[]))
        .await;

    context
        .service
        .delete(&alice, GITHUB)
        .await
        .expect("delete should succeed");

    assert!(matches!(
        context.service.get(GITHUB).await,
        Err(RegistryServiceError::NotFound(_))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repository_delete_is_idempotent(context: TestContext, alice: Principal) {
    context
        .publish(&alice, server_payload(GITHUB, "GitHub", &[]))
        .await;
    let id = ServerId::new(GITHUB).expect("valid id");

    let first = context.repository.delete(&id).await.expect("first delete");
    let second = context.repository.delete(&id).await.expect("second delete");

    assert!(first);
    assert!(!second);
}

#[rstest]
#[case("kp.internal.acme/has space".to_owned())]
#[case("   ".to_owned())]
#[case(format!("kp.internal.{}", "k".repeat(256)))]
#[tokio::test(flavor = "multi_thread")]
async fn mutations_on_unstorable_ids_are_forbidden(
    context: TestContext,
    alice: Principal,
    #[case] raw_id: String,
) {
    let updated = context
        .service
        .update(&alice, &raw_id, json!({"description": "new"}))
        .await;
    let deleted = context.service.delete(&alice, &raw_id).await;

    assert!(matches!(
        updated,
        Err(RegistryServiceError::Forbidden(ForbiddenError::NotOwner))
    ));
    assert!(matches!(
        deleted,
        Err(RegistryServiceError::Forbidden(ForbiddenError::NotOwner))
    ));
    assert!(context.audit_log.entries().is_empty());
}
