//! Rotation workflow
//!
//! [`rotate`] creates a new key and returns a [`PendingRotation`] in state
//! `key_created`. The caller applies the updated element downstream and then
//! either commits (old key queued, status updated) or reverts (new key
//! deleted through the [`Compensation`]).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{Instrument, error, info, info_span, warn};

use super::context::RotationContext;
use super::error::{RotationError, RotationResult};
use super::state::{RotationId, RotationState};
use crate::model::{
    CfgMetadata, CfgTarget, ConfigElement, QueueEntry, SecretId, ServiceAccountKey,
    create_queue_entry, update_status,
};
use crate::providers::{CredentialIssuer, IssuerFactory, KeyId, Principal, ProviderError};
use crate::store::ElementStore;

/// Default upper bound for one key creation call
pub const DEFAULT_KEY_CREATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Knobs of a single rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotateOptions {
    /// A key creation that does not finish in time counts as failed
    pub key_create_timeout: Duration,
}

impl Default for RotateOptions {
    fn default() -> Self {
        Self {
            key_create_timeout: DEFAULT_KEY_CREATE_TIMEOUT,
        }
    }
}

/// Undo record deleting the freshly created key
pub struct Compensation {
    target: CfgTarget,
    key: KeyId,
    issuer: Arc<dyn CredentialIssuer>,
}

impl Compensation {
    pub fn target(&self) -> &CfgTarget {
        &self.target
    }

    /// Key that [`Compensation::execute`] deletes
    pub fn key(&self) -> &KeyId {
        &self.key
    }

    /// Delete the new key
    pub async fn execute(&self) -> RotationResult<()> {
        self.issuer
            .delete_key(&self.key)
            .await
            .map_err(|source| RotationError::RevertFailed {
                target: self.target.clone(),
                key: self.key.clone(),
                source,
            })?;
        info!(target_element = %self.target, key = %self.key, "reverted new key");
        Ok(())
    }
}

impl fmt::Debug for Compensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compensation")
            .field("target", &self.target)
            .field("key", &self.key)
            .field("provider", &self.issuer.provider_name())
            .finish()
    }
}

/// Rotation whose new key exists but is not yet committed
#[derive(Debug)]
#[must_use = "a pending rotation must be committed or reverted"]
pub struct PendingRotation {
    id: RotationId,
    state: RotationState,
    updated: ConfigElement,
    secret_id: SecretId,
    compensation: Compensation,
}

/// Committed rotation
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedRotation {
    pub id: RotationId,
    pub state: RotationState,
    pub updated: ConfigElement,
    pub queue_entry: QueueEntry,
}

impl PendingRotation {
    pub fn id(&self) -> RotationId {
        self.id
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    pub fn target(&self) -> &CfgTarget {
        self.updated.target()
    }

    /// Element carrying the new secret
    pub fn updated_element(&self) -> &ConfigElement {
        &self.updated
    }

    /// Handles of the *old* key, for the deletion queue
    pub fn secret_id(&self) -> &SecretId {
        &self.secret_id
    }

    pub fn compensation(&self) -> &Compensation {
        &self.compensation
    }

    /// Split into the compensation, queue data and updated element
    pub fn into_parts(self) -> (Compensation, SecretId, ConfigElement) {
        (self.compensation, self.secret_id, self.updated)
    }

    /// Record a successfully applied rotation
    ///
    /// Queues the old key for deletion after the grace period and sets the
    /// element's status to `today`. The caller persists `metadata`.
    pub fn commit(self, metadata: &mut CfgMetadata, today: NaiveDate) -> RotationResult<AppliedRotation> {
        let state = self.state.transition(RotationState::Applied)?;
        let queue_entry = create_queue_entry(self.updated.target(), self.secret_id, today);
        metadata.queue.push(queue_entry.clone());
        update_status(self.updated.target(), &mut metadata.statuses, today);
        info!(
            rotation_id = %self.id,
            target_element = %self.updated.target(),
            delete_after = %queue_entry.delete_after,
            "rotation applied"
        );
        Ok(AppliedRotation {
            id: self.id,
            state,
            updated: self.updated,
            queue_entry,
        })
    }

    /// Delete the new key again; the old key stays valid
    pub async fn revert(self) -> RotationResult<RotationState> {
        let state = self.state.transition(RotationState::Reverted)?;
        self.compensation.execute().await?;
        Ok(state)
    }
}

/// Create a new credential for `element`
///
/// On error nothing was created (or the new key was already deleted again)
/// and the old credential remains valid.
pub async fn rotate<S, F>(
    element: &ConfigElement,
    store: &S,
    factory: &F,
    options: &RotateOptions,
) -> RotationResult<PendingRotation>
where
    S: ElementStore + ?Sized,
    F: IssuerFactory + ?Sized,
{
    let id = RotationId::new();
    let span = info_span!("rotate", rotation_id = %id, element = %element.target());
    async move {
        let target = element.target().clone();
        let provider_error = |source: ProviderError| RotationError::Provider {
            target: target.clone(),
            source,
        };

        let current = element.service_account_key()?;
        let context = RotationContext::resolve(element, store)?;
        info!(
            identity = %context.identity().target(),
            delegated = context.is_delegated(),
            "using rotation identity"
        );
        let issuer = factory.issuer_for(&context).map_err(provider_error)?;

        let principal = Principal::new(&current.client_email);
        let old_key = KeyId::qualified(&principal, &current.private_key_id);

        let issued = match tokio::time::timeout(
            options.key_create_timeout,
            issuer.create_key(&principal),
        )
        .await
        {
            Ok(Ok(issued)) => issued,
            Ok(Err(source)) => {
                error!(error = %source, "unable to create key");
                return Err(provider_error(source));
            }
            Err(_) => {
                error!(timeout = ?options.key_create_timeout, "key creation timed out");
                return Err(provider_error(ProviderError::Timeout {
                    operation: format!("create key for {}", principal.client_email),
                    timeout_secs: options.key_create_timeout.as_secs(),
                }));
            }
        };
        let state = RotationState::Pending.transition(RotationState::KeyCreated)?;
        info!(new_key = %issued.id, "created key");

        let compensation = Compensation {
            target: target.clone(),
            key: issued.id.clone(),
            issuer,
        };

        let updated = match ServiceAccountKey::from_value(issued.material.clone())
            .map_err(|reason| element.inconsistency(format!("issued key unusable: {reason}")))
            .and_then(|_| element.with_secret(&issued.material))
        {
            Ok(updated) => updated,
            Err(e) => {
                if let Err(revert_error) = compensation.execute().await {
                    warn!(error = %revert_error, "could not delete unusable new key");
                }
                return Err(e);
            }
        };

        Ok(PendingRotation {
            id,
            state,
            updated,
            secret_id: SecretId::gcp_key(&old_key),
            compensation,
        })
    }
    .instrument(span)
    .await
}

/// Delete the old credential named by a queue entry
///
/// Resolves the same rotation context as [`rotate`]. Not retried; a missing
/// key is reported by the provider as [`ProviderError::NotFound`].
pub async fn delete_config_secret<S, F>(
    element: &ConfigElement,
    queue_entry: &QueueEntry,
    store: &S,
    factory: &F,
) -> RotationResult<()>
where
    S: ElementStore + ?Sized,
    F: IssuerFactory + ?Sized,
{
    let key = queue_entry
        .secret_id
        .gcp_key_id()
        .ok_or_else(|| element.inconsistency("queue entry has no gcp_secret_key"))?;
    let context = RotationContext::resolve(element, store)?;
    info!(identity = %context.identity().target(), %key, "deleting old key");

    let provider_error = |source| RotationError::Provider {
        target: element.target().clone(),
        source,
    };
    let issuer = factory.issuer_for(&context).map_err(provider_error)?;
    issuer.delete_key(&key).await.map_err(provider_error)
}
