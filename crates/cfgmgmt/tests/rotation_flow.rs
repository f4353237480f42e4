//! Rotation workflow against the in-memory issuer
mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cfgmgmt::model::{CfgMetadata, CfgTarget, ConfigElement, RawAttributes, SecretId};
use cfgmgmt::providers::{InMemoryIssuer, KeyId, Principal, ProviderError, StaticIssuerFactory};
use cfgmgmt::rotation::{RotateOptions, RotationError, RotationState, rotate};
use cfgmgmt::store::{ElementApplier, ElementStore, InMemoryElementStore};
use common::{delegated_gcp_element, email, gcp_element, key_id_of, registry_element, today};
use pretty_assertions::assert_eq;

fn issuer_with(keys: &[(&str, &str)]) -> Arc<InMemoryIssuer> {
    let issuer = keys
        .iter()
        .fold(InMemoryIssuer::new(), |issuer, (name, key)| issuer.with_key(&email(name), key));
    Arc::new(issuer)
}

fn old_key(name: &str, key: &str) -> KeyId {
    KeyId::qualified(&Principal::new(email(name)), key)
}

#[tokio::test]
async fn create_then_revert_leaves_provider_unchanged() {
    let issuer = issuer_with(&[("svc1", "old")]);
    let factory = StaticIssuerFactory::new(issuer.clone());
    let element = gcp_element("svc1", "old");
    let store = InMemoryElementStore::new().with_element(element.clone());
    let before = issuer.key_names();

    let pending = rotate(&element, &store, &factory, &RotateOptions::default())
        .await
        .unwrap();
    assert_eq!(pending.state(), RotationState::KeyCreated);
    assert_eq!(issuer.key_names().len(), 2);

    let state = pending.revert().await.unwrap();

    assert_eq!(state, RotationState::Reverted);
    assert_eq!(issuer.key_names(), before);
}

#[tokio::test]
async fn committed_rotation_queues_old_key_and_updates_status() {
    let issuer = issuer_with(&[("svc1", "old")]);
    let factory = StaticIssuerFactory::new(issuer.clone());
    let element = gcp_element("svc1", "old");
    let store = InMemoryElementStore::new().with_element(element.clone());
    let mut metadata = CfgMetadata::default();

    let pending = rotate(&element, &store, &factory, &RotateOptions::default())
        .await
        .unwrap();
    let new_key = pending.compensation().key().clone();
    assert_ne!(key_id_of(pending.updated_element()), "old");
    assert_eq!(pending.updated_element().target(), element.target());

    let applied = pending.commit(&mut metadata, today()).unwrap();

    assert_eq!(applied.state, RotationState::Applied);
    assert_eq!(metadata.queue.len(), 1);
    let entry = &metadata.queue[0];
    assert_eq!(entry.target, CfgTarget::new("gcp", "svc1"));
    assert_eq!(entry.delete_after, today() + chrono::Duration::days(7));
    assert_eq!(entry.secret_id, SecretId::gcp_key(&old_key("svc1", "old")));
    assert_ne!(entry.secret_id.gcp_key_id(), Some(new_key.clone()));
    assert_eq!(metadata.statuses.len(), 1);
    assert_eq!(metadata.statuses[0].credential_update_timestamp, today());
    assert!(issuer.contains(&new_key));
    assert!(issuer.contains(&old_key("svc1", "old")));
}

#[tokio::test]
async fn failed_key_creation_changes_nothing() {
    let issuer = issuer_with(&[("svc1", "old")]);
    issuer.fail_next_creates(1);
    let factory = StaticIssuerFactory::new(issuer.clone());
    let element = gcp_element("svc1", "old");
    let store = InMemoryElementStore::new().with_element(element.clone());

    let err = rotate(&element, &store, &factory, &RotateOptions::default())
        .await
        .unwrap_err();

    assert!(
        matches!(err, RotationError::Provider { source: ProviderError::Quota { .. }, .. }),
        "{err}"
    );
    assert!(err.is_element_scoped());
    assert_eq!(issuer.key_names(), vec![old_key("svc1", "old")]);
    assert_eq!(store.element(element.target()), Some(element));
}

#[tokio::test]
async fn registry_password_holds_json_encoded_key() {
    let issuer = issuer_with(&[("registry", "old")]);
    let factory = StaticIssuerFactory::new(issuer);
    let element = registry_element("registry", "old");
    let store = InMemoryElementStore::new().with_element(element.clone());

    let pending = rotate(&element, &store, &factory, &RotateOptions::default())
        .await
        .unwrap();
    let updated = pending.updated_element();

    let password = updated.attribute("password").and_then(|v| v.as_str()).unwrap();
    let decoded: serde_json::Value = serde_json::from_str(password).unwrap();
    assert_eq!(decoded["client_email"], email("registry"));
    assert_ne!(decoded["private_key_id"], "old");
    assert_eq!(updated.attribute("host"), element.attribute("host"));
    drop(pending);
}

#[tokio::test]
async fn delegated_rotation_uses_referenced_identity() {
    let issuer = issuer_with(&[("svc2", "old")]);
    let factory = StaticIssuerFactory::new(issuer);
    let admin = gcp_element("admin", "admin-key");
    let element = delegated_gcp_element("svc2", "old", "gcp/admin");
    let store = InMemoryElementStore::new()
        .with_element(admin)
        .with_element(element.clone());

    let pending = rotate(&element, &store, &factory, &RotateOptions::default())
        .await
        .unwrap();

    assert_eq!(factory.requested_identities(), vec![CfgTarget::new("gcp", "admin")]);
    assert_eq!(pending.updated_element().attribute("rotation_cfg"), element.attribute("rotation_cfg"));
    assert_eq!(
        pending.updated_element().service_account_key().unwrap().client_email,
        email("svc2")
    );
}

#[tokio::test]
async fn missing_rotation_reference_is_inconsistent() {
    let issuer = issuer_with(&[("svc2", "old")]);
    let factory = StaticIssuerFactory::new(issuer.clone());
    let element = delegated_gcp_element("svc2", "old", "gcp/nobody");
    let store = InMemoryElementStore::new().with_element(element.clone());

    let err = rotate(&element, &store, &factory, &RotateOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RotationError::ConfigInconsistency { .. }), "{err}");
    assert_eq!(issuer.key_names().len(), 1);
}

#[tokio::test]
async fn unrecognized_variant_fails_before_any_provider_call() {
    let issuer = issuer_with(&[]);
    let factory = StaticIssuerFactory::new(issuer);
    let element = ConfigElement::new("github", "bot", RawAttributes::new());
    let store = InMemoryElementStore::new().with_element(element.clone());

    let err = rotate(&element, &store, &factory, &RotateOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RotationError::ConfigInconsistency { .. }), "{err}");
    assert!(factory.requested_identities().is_empty());
}

#[tokio::test]
async fn slow_key_creation_times_out() {
    let issuer = Arc::new(
        InMemoryIssuer::new()
            .with_key(&email("svc1"), "old")
            .with_create_delay(Duration::from_millis(500)),
    );
    let factory = StaticIssuerFactory::new(issuer);
    let element = gcp_element("svc1", "old");
    let store = InMemoryElementStore::new().with_element(element.clone());
    let options = RotateOptions {
        key_create_timeout: Duration::from_millis(20),
    };

    let err = rotate(&element, &store, &factory, &options).await.unwrap_err();

    assert!(
        matches!(err, RotationError::Provider { source: ProviderError::Timeout { .. }, .. }),
        "{err}"
    );
}

struct RejectingApplier;

#[async_trait]
impl ElementApplier for RejectingApplier {
    type Error = std::io::Error;

    async fn apply(&self, _element: &ConfigElement) -> Result<(), Self::Error> {
        Err(std::io::Error::other("downstream unavailable"))
    }
}

#[tokio::test]
async fn revert_after_failed_apply_removes_new_key() {
    let issuer = issuer_with(&[("svc1", "old")]);
    let factory = StaticIssuerFactory::new(issuer.clone());
    let element = gcp_element("svc1", "old");
    let store = InMemoryElementStore::new().with_element(element.clone());

    let pending = rotate(&element, &store, &factory, &RotateOptions::default())
        .await
        .unwrap();
    assert!(RejectingApplier.apply(pending.updated_element()).await.is_err());
    pending.revert().await.unwrap();

    assert_eq!(issuer.key_names(), vec![old_key("svc1", "old")]);
}

#[tokio::test]
async fn failing_revert_reports_the_orphaned_key() {
    let issuer = issuer_with(&[("svc1", "old")]);
    let factory = StaticIssuerFactory::new(issuer.clone());
    let element = gcp_element("svc1", "old");
    let store = InMemoryElementStore::new().with_element(element.clone());

    let pending = rotate(&element, &store, &factory, &RotateOptions::default())
        .await
        .unwrap();
    let new_key = pending.compensation().key().clone();
    issuer.fail_deletes(true);

    let err = pending.revert().await.unwrap_err();

    match err {
        RotationError::RevertFailed { key, .. } => assert_eq!(key, new_key),
        other => panic!("unexpected error: {other}"),
    }
    assert!(issuer.contains(&new_key));
}
