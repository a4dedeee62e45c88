//! Audit trail contents and write-failure tolerance.

use super::helpers::{TestContext, alice, bob, context, server_payload};
use mcp_registry::registry::{
    adapters::memory::InMemoryServerRepository,
    domain::{AuditAction, AuditEntry, PageRequest, Principal},
    ports::{AuditLog, AuditLogError, AuditLogResult},
    services::{
        CapabilityProbe, NamespacePolicy, OwnershipGuard, RegistryService, SearchQueryBuilder,
    },
};
use mockable::DefaultClock;
use mockall::{Sequence, mock};
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;

mock! {
    AuditSink {}

    #[async_trait::async_trait]
    impl AuditLog for AuditSink {
        async fn append(&self, entry: &AuditEntry) -> AuditLogResult<()>;
    }
}

const GITHUB: &str = "kp.internal.acme/github";

type AuditedService = RegistryService<InMemoryServerRepository, MockAuditSink, DefaultClock>;

fn service_with(audit_log: MockAuditSink) -> AuditedService {
    RegistryService::new(
        Arc::new(InMemoryServerRepository::new()),
        Arc::new(audit_log),
        OwnershipGuard::new(NamespacePolicy::relaxed()),
        SearchQueryBuilder::new(CapabilityProbe::new()),
        Arc::new(DefaultClock),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_audit_writes_do_not_fail_mutations(alice: Principal) {
    let mut audit_log = MockAuditSink::new();
    audit_log.expect_append().times(3).returning(|_| {
        Err(AuditLogError::write(std::io::Error::other("audit store offline")))
    });
    let service = service_with(audit_log);

    service
        .publish(&alice, server_payload(GITHUB, "GitHub", &[]))
        .await
        .expect("publish should survive audit failure");
    service
        .update(&alice, GITHUB, json!({"version": "2.0.0"}))
        .await
        .expect("update should survive audit failure");
    service
        .delete(&alice, GITHUB)
        .await
        .expect("delete should survive audit failure");

    assert_eq!(service.audit_failures(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn each_mutation_appends_one_entry_in_order(alice: Principal) {
    let mut sequence = Sequence::new();
    let mut audit_log = MockAuditSink::new();
    audit_log
        .expect_append()
        .withf(|entry| {
            entry.action == AuditAction::Publish
                && entry.details.get("name") == Some(&json!("GitHub"))
                && entry.details.get("replaced") == Some(&json!(false))
        })
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(()));
    audit_log
        .expect_append()
        .withf(|entry| {
            entry.action == AuditAction::Update
                && entry.details.get("fields") == Some(&json!(["description", "tags"]))
        })
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(()));
    audit_log
        .expect_append()
        .withf(|entry| {
            entry.action == AuditAction::Delete
                && entry.server_id.as_ref().map(|id| id.as_str()) == Some(GITHUB)
        })
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(()));
    let service = service_with(audit_log);

    service
        .publish(&alice, server_payload(GITHUB, "GitHub", &[]))
        .await
        .expect("publish should succeed");
    service
        .update(&alice, GITHUB, json!({"tags": ["scm"], "description": "Forge"}))
        .await
        .expect("update should succeed");
    service
        .delete(&alice, GITHUB)
        .await
        .expect("delete should succeed");

    assert_eq!(service.audit_failures(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reads_and_rejected_writes_are_not_audited(alice: Principal, bob: Principal) {
    let mut audit_log = MockAuditSink::new();
    audit_log.expect_append().times(1).returning(|_| Ok(()));
    let service = service_with(audit_log);

    service
        .publish(&alice, server_payload(GITHUB, "GitHub", &[]))
        .await
        .expect("publish should succeed");
    service.get(GITHUB).await.expect("get should succeed");
    service
        .search(Some("git"), &[], PageRequest::default())
        .await
        .expect("search should succeed");
    let rejected = service.delete(&bob, GITHUB).await;

    assert!(rejected.is_err());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn audit_entries_name_the_acting_principal(context: TestContext, alice: Principal) {
    context
        .publish(&alice, server_payload(GITHUB, "GitHub", &[]))
        .await;
    context
        .publish(&alice, server_payload(GITHUB, "GitHub", &["create_issue"]))
        .await;

    let entries = context.audit_log.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.user_id == alice));
    assert_eq!(
        entries.last().and_then(|entry| entry.details.get("replaced")),
        Some(&json!(true))
    );
}
