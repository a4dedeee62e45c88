//! Publishing, replacement and owner assignment.

use super::helpers::{
    TestContext, alice, bob, context, server_payload, stored_ids, strict_context,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mcp_registry::registry::{
    adapters::memory::{InMemoryAuditLog, InMemoryServerRepository},
    domain::{
        PageRequest, Principal, RegistryDomainError, SearchPage, ServerId, ServerPatch,
        ServerQuery, ServerRecord, ServerSubmission,
    },
    ports::{ServerRepository, ServerRepositoryResult, UpsertOutcome},
    services::{
        CapabilityProbe, ForbiddenError, NamespacePolicy, OwnershipGuard, RegistryService,
        RegistryServiceError, SearchQueryBuilder,
    },
};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Barrier;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn published_record_is_readable_by_id(context: TestContext, alice: Principal) {
    let id = "kp.internal.acme/github";
    let published = context
        .publish(&alice, server_payload(id, "GitHub", &["create_issue"]))
        .await;

    let fetched = context.service.get(id).await.expect("get should succeed");

    assert_eq!(fetched, published);
    assert_eq!(fetched.owner(), &alice);
    assert_eq!(fetched.created_at(), fetched.updated_at());
    assert_eq!(fetched.tools().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publish_assigns_the_caller_as_owner(context: TestContext, alice: Principal) {
    let mut payload = server_payload("kp.public.acme/jira", "Jira", &["search_issues"]);
    payload["owner"] = json!("mallory@kp.com");
    payload["created_at"] = json!("1999-01-01T00:00:00Z");

    let record = context.publish(&alice, payload).await;

    assert_eq!(record.owner(), &alice);
    assert_ne!(record.created_at().to_rfc3339(), "1999-01-01T00:00:00+00:00");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn republish_by_owner_replaces_document_and_keeps_creation_time(
    context: TestContext,
    alice: Principal,
) {
    let id = "kp.internal.acme/github";
    let first = context
        .publish(&alice, server_payload(id, "GitHub", &["create_issue"]))
        .await;

    let mut replacement = server_payload(id, "GitHub", &["merge_pull_request"]);
    replacement["tags"] = json!([]);
    let second = context.publish(&alice, replacement).await;

    assert_eq!(second.created_at(), first.created_at());
    assert!(second.tags().is_empty());
    assert_eq!(
        second.tools().iter().map(|tool| tool.name()).collect::<Vec<_>>(),
        ["merge_pull_request"]
    );
    assert_eq!(stored_ids(context.repository.as_ref()).await, [id]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn republish_by_another_principal_is_forbidden(
    context: TestContext,
    alice: Principal,
    bob: Principal,
) {
    let id = "kp.internal.acme/github";
    let original = context
        .publish(&alice, server_payload(id, "GitHub", &["create_issue"]))
        .await;

    let result = context
        .service
        .publish(&bob, server_payload(id, "Hijacked", &[]))
        .await;

    assert!(matches!(
        result,
        Err(RegistryServiceError::Forbidden(ForbiddenError::NotOwner))
    ));
    let stored = context.service.get(id).await.expect("record still exists");
    assert_eq!(stored, original);
}

/// Repository holding every lookup until two callers have looked, so both
/// see the id as free before either writes.
struct LockstepRepository {
    inner: InMemoryServerRepository,
    lookups: Barrier,
}

#[async_trait]
impl ServerRepository for LockstepRepository {
    async fn upsert(&self, record: &ServerRecord) -> ServerRepositoryResult<UpsertOutcome> {
        self.inner.upsert(record).await
    }

    async fn merge(
        &self,
        server_id: &ServerId,
        patch: &ServerPatch,
        updated_at: DateTime<Utc>,
    ) -> ServerRepositoryResult<Option<ServerRecord>> {
        self.inner.merge(server_id, patch, updated_at).await
    }

    async fn delete(&self, server_id: &ServerId) -> ServerRepositoryResult<bool> {
        self.inner.delete(server_id).await
    }

    async fn find_by_id(
        &self,
        server_id: &ServerId,
    ) -> ServerRepositoryResult<Option<ServerRecord>> {
        let found = self.inner.find_by_id(server_id).await;
        self.lookups.wait().await;
        found
    }

    async fn search(
        &self,
        query: &ServerQuery,
        page: PageRequest,
    ) -> ServerRepositoryResult<SearchPage> {
        self.inner.search(query, page).await
    }

    async fn probe_text_search(&self) -> ServerRepositoryResult<()> {
        self.inner.probe_text_search().await
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_first_publishes_leave_one_owner(alice: Principal, bob: Principal) {
    const ID: &str = "kp.internal.acme/github";
    let repository = Arc::new(LockstepRepository {
        inner: InMemoryServerRepository::new(),
        lookups: Barrier::new(2),
    });
    let audit_log = Arc::new(InMemoryAuditLog::new());
    let service = Arc::new(RegistryService::new(
        Arc::clone(&repository),
        Arc::clone(&audit_log),
        OwnershipGuard::new(NamespacePolicy::relaxed()),
        SearchQueryBuilder::new(CapabilityProbe::new()),
        Arc::new(DefaultClock),
    ));

    let publish_as = |principal: Principal, name: &'static str| {
        let shared = Arc::clone(&service);
        tokio::spawn(async move {
            let outcome = shared
                .publish(&principal, server_payload(ID, name, &[]))
                .await;
            (principal, outcome)
        })
    };
    let first = publish_as(alice, "GitHub");
    let second = publish_as(bob, "Hijacked");
    let outcomes = [
        first.await.expect("publish task"),
        second.await.expect("publish task"),
    ];

    let winners: Vec<&Principal> = outcomes
        .iter()
        .filter(|(_, outcome)| outcome.is_ok())
        .map(|(principal, _)| principal)
        .collect();
    assert_eq!(winners.len(), 1);
    assert!(outcomes.iter().any(|(_, outcome)| matches!(
        outcome,
        Err(RegistryServiceError::Forbidden(ForbiddenError::NotOwner))
    )));

    let stored = repository
        .inner
        .find_by_id(&ServerId::new(ID).expect("valid id"))
        .await
        .expect("lookup")
        .expect("record stored");
    assert_eq!(stored.owner(), winners[0]);
    assert_eq!(audit_log.entries().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn store_refuses_to_replace_a_foreign_record(
    context: TestContext,
    alice: Principal,
    bob: Principal,
) {
    let id = "kp.internal.acme/github";
    let original = context
        .publish(&alice, server_payload(id, "GitHub", &["create_issue"]))
        .await;
    let intruder = ServerRecord::publish(
        ServerSubmission::from_json(server_payload(id, "Hijacked", &[]))
            .expect("valid submission"),
        bob,
        &DefaultClock,
    );

    let outcome = context.repository.upsert(&intruder).await.expect("upsert");

    assert_eq!(outcome, UpsertOutcome::OwnerConflict);
    let stored = context.service.get(id).await.expect("record still exists");
    assert_eq!(stored, original);
}

#[rstest]
#[case("kp.public.acme/github")]
#[case("kp.experimental.acme/github")]
#[case("acme/github")]
#[tokio::test(flavor = "multi_thread")]
async fn strict_policy_rejects_ids_outside_production_namespace(
    strict_context: TestContext,
    alice: Principal,
    #[case] id: &str,
) {
    let result = strict_context
        .service
        .publish(&alice, server_payload(id, "GitHub", &[]))
        .await;

    assert!(matches!(
        result,
        Err(RegistryServiceError::Forbidden(ForbiddenError::Namespace { .. }))
    ));
    assert!(stored_ids(strict_context.repository.as_ref()).await.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn relaxed_policy_rejects_unknown_prefixes(context: TestContext, alice: Principal) {
    let result = context
        .service
        .publish(&alice, server_payload("acme.internal/github", "GitHub", &[]))
        .await;

    assert!(matches!(result, Err(RegistryServiceError::Forbidden(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publish_rejects_payload_missing_required_fields(context: TestContext, alice: Principal) {
    let result = context
        .service
        .publish(&alice, json!({"id": "kp.internal.acme/github", "name": "GitHub"}))
        .await;

    assert!(matches!(
        result,
        Err(RegistryServiceError::Domain(
            RegistryDomainError::MalformedSubmission(_)
        ))
    ));
    assert!(context.audit_log.entries().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tools_view_lists_advertised_tools(context: TestContext, alice: Principal) {
    let id = "kp.internal.acme/github";
    context
        .publish(
            &alice,
            server_payload(id, "GitHub", &["create_issue", "merge_pull_request"]),
        )
        .await;

    let view = context.service.tools(id).await.expect("tools should load");

    assert_eq!(view.server_id.as_str(), id);
    assert_eq!(view.server_name, "GitHub");
    assert_eq!(
        view.tools.iter().map(|tool| tool.name()).collect::<Vec<_>>(),
        ["create_issue", "merge_pull_request"]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_id_is_not_found(context: TestContext) {
    let result = context.service.get("kp.internal.acme/missing").await;
    assert!(matches!(result, Err(RegistryServiceError::NotFound(_))));

    let tools = context.service.tools("kp.internal.acme/missing").await;
    assert!(matches!(tools, Err(RegistryServiceError::NotFound(_))));
}
