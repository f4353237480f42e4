//! Batch rotation and queue draining over one configuration directory
//!
//! A rotation pass is `rotate -> apply -> commit -> persist` per candidate.
//! The queue is rewritten before the statuses after every committed
//! rotation, so an interrupted run never loses the handle of an old key: a
//! missing status only makes the element due again.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};

use crate::model::{
    CfgMetadata, CfgTarget, ConfigElement, QueueEntry, RotationMethod,
    iter_queue_entries_to_be_deleted,
};
use crate::persist::{MetadataWriter, PersistenceError};
use crate::providers::{IssuerFactory, KeyId, ProviderError};
use crate::rotation::{RotateOptions, RotationError, RotationId, delete_config_secret, rotate};
use crate::selection::{Decision, SelectionFilter, decide, iter_elements_requiring_rotation};
use crate::store::{ElementApplier, ElementStore, iter_cfg_elements};

/// Default cap on rotations per run
pub const DEFAULT_MAX_ROTATIONS: usize = 10;

/// Errors that abort a whole run
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub max_rotations: usize,
    /// Only this element
    pub target: Option<CfgTarget>,
    pub rotation_method: Option<RotationMethod>,
    pub rotate: RotateOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_rotations: DEFAULT_MAX_ROTATIONS,
            target: None,
            rotation_method: None,
            rotate: RotateOptions::default(),
        }
    }
}

/// Element whose rotation completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotatedElement {
    pub target: CfgTarget,
    pub rotation_id: RotationId,
    pub delete_after: NaiveDate,
}

/// Element left unchanged; its old credential remains valid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationFailure {
    pub target: CfgTarget,
    pub error: String,
}

/// New key that could neither be applied nor deleted again
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedKey {
    pub target: CfgTarget,
    pub key: Option<KeyId>,
    pub error: String,
}

/// Outcome of [`RotationRunner::rotate_due`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub rotated: Vec<RotatedElement>,
    /// No rule, or a policy without a usable age limit
    pub skipped_unmanaged: usize,
    /// Failed before or while creating the new key
    pub failed: Vec<RotationFailure>,
    /// New key created, applying failed, new key deleted again
    pub reverted: Vec<RotationFailure>,
    pub orphaned: Vec<OrphanedKey>,
}

impl RunReport {
    /// 0 when all went well, 1 on clean failures, 2 on orphaned keys
    pub fn exit_code(&self) -> i32 {
        if !self.orphaned.is_empty() {
            2
        } else if !self.failed.is_empty() || !self.reverted.is_empty() {
            1
        } else {
            0
        }
    }
}

/// Outcome of [`RotationRunner::drain_queue`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub deleted: Vec<QueueEntry>,
    pub failed: Vec<RotationFailure>,
    /// Entries whose element no longer exists
    pub skipped: Vec<QueueEntry>,
}

impl DrainReport {
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.failed.is_empty())
    }
}

/// Drives rotations and deletions for one element store
#[derive(Debug)]
pub struct RotationRunner<'a, S: ?Sized, F: ?Sized> {
    store: &'a S,
    factory: &'a F,
    options: RunOptions,
}

impl<'a, S, F> RotationRunner<'a, S, F>
where
    S: ElementStore + ?Sized,
    F: IssuerFactory + ?Sized,
{
    pub fn new(store: &'a S, factory: &'a F, options: RunOptions) -> Self {
        Self {
            store,
            factory,
            options,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Elements due for rotation, capped at `max_rotations`
    pub fn candidates(&self, metadata: &CfgMetadata, today: NaiveDate) -> Vec<ConfigElement> {
        let elements = iter_cfg_elements(self.store, self.options.target.as_ref());
        iter_elements_requiring_rotation(&elements, metadata, self.filter(), today)
            .take(self.options.max_rotations)
            .cloned()
            .collect()
    }

    fn filter(&self) -> SelectionFilter<'_> {
        SelectionFilter {
            target: self.options.target.as_ref(),
            element_filter: None,
            rotation_method: self.options.rotation_method,
        }
    }

    /// Rotate every due element, up to `max_rotations`
    ///
    /// Element failures are collected in the report. Only persistence
    /// failures abort the run.
    pub async fn rotate_due<A, W>(
        &self,
        metadata: &mut CfgMetadata,
        applier: &A,
        writer: &W,
        today: NaiveDate,
    ) -> Result<RunReport, RunError>
    where
        A: ElementApplier + ?Sized,
        W: MetadataWriter + ?Sized,
    {
        let mut report = RunReport::default();
        let elements = iter_cfg_elements(self.store, self.options.target.as_ref());
        report.skipped_unmanaged = elements
            .iter()
            .filter(|e| {
                matches!(
                    decide(e, metadata, &self.filter(), today),
                    Decision::Unmanaged | Decision::UnsupportedPolicy
                )
            })
            .count();

        let candidates = self.candidates(metadata, today);
        info!(
            candidates = candidates.len(),
            max_rotations = self.options.max_rotations,
            unmanaged = report.skipped_unmanaged,
            "starting rotation run"
        );

        for element in &candidates {
            let span = info_span!("rotate_element", element = %element.target());
            self.rotate_one(element, metadata, applier, writer, today, &mut report)
                .instrument(span)
                .await?;
        }

        info!(
            rotated = report.rotated.len(),
            failed = report.failed.len(),
            reverted = report.reverted.len(),
            orphaned = report.orphaned.len(),
            "rotation run finished"
        );
        Ok(report)
    }

    async fn rotate_one<A, W>(
        &self,
        element: &ConfigElement,
        metadata: &mut CfgMetadata,
        applier: &A,
        writer: &W,
        today: NaiveDate,
        report: &mut RunReport,
    ) -> Result<(), RunError>
    where
        A: ElementApplier + ?Sized,
        W: MetadataWriter + ?Sized,
    {
        let target = element.target().clone();
        let pending = match rotate(element, self.store, self.factory, &self.options.rotate).await {
            Ok(pending) => pending,
            Err(e) => {
                warn!(error = %e, "rotation failed, element unchanged");
                report.failed.push(RotationFailure {
                    target,
                    error: e.to_string(),
                });
                return Ok(());
            }
        };

        if let Err(apply_error) = applier.apply(pending.updated_element()).await {
            error!(error = %apply_error, "applying rotated element failed, reverting");
            let key = pending.compensation().key().clone();
            match pending.revert().await {
                Ok(_) => report.reverted.push(RotationFailure {
                    target,
                    error: apply_error.to_string(),
                }),
                Err(revert_error) => {
                    error!(error = %revert_error, %key, "new key is orphaned");
                    report.orphaned.push(OrphanedKey {
                        target,
                        key: Some(key),
                        error: format!("{apply_error}; {revert_error}"),
                    });
                }
            }
            return Ok(());
        }

        let applied = match pending.commit(metadata, today) {
            Ok(applied) => applied,
            Err(e) => {
                error!(error = %e, "could not commit applied rotation");
                report.orphaned.push(OrphanedKey {
                    target,
                    key: None,
                    error: e.to_string(),
                });
                return Ok(());
            }
        };
        writer.write_queue(&metadata.queue)?;
        writer.write_statuses(&metadata.statuses)?;

        report.rotated.push(RotatedElement {
            target,
            rotation_id: applied.id,
            delete_after: applied.queue_entry.delete_after,
        });
        Ok(())
    }

    /// Delete old credentials whose grace period is over
    ///
    /// The queue is rewritten after every successful deletion. A key the
    /// provider no longer knows counts as deleted.
    pub async fn drain_queue<W>(
        &self,
        metadata: &mut CfgMetadata,
        writer: &W,
        today: NaiveDate,
    ) -> Result<DrainReport, RunError>
    where
        W: MetadataWriter + ?Sized,
    {
        let due: Vec<QueueEntry> =
            iter_queue_entries_to_be_deleted(&metadata.queue, self.options.target.as_ref(), today)
                .cloned()
                .collect();
        info!(due = due.len(), queued = metadata.queue.len(), "draining deletion queue");

        let mut report = DrainReport::default();
        for entry in due {
            let Some(element) = self.store.element(&entry.target) else {
                warn!(element = %entry.target, "queued element no longer exists, keeping entry");
                report.skipped.push(entry);
                continue;
            };

            match delete_config_secret(&element, &entry, self.store, self.factory).await {
                Ok(()) => {}
                Err(RotationError::Provider {
                    source: ProviderError::NotFound { key },
                    ..
                }) => {
                    info!(element = %entry.target, %key, "old key already gone");
                }
                Err(e) => {
                    warn!(element = %entry.target, error = %e, "could not delete old key");
                    report.failed.push(RotationFailure {
                        target: entry.target.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            }

            metadata.remove_queue_entry(&entry);
            writer.write_queue(&metadata.queue)?;
            report.deleted.push(entry);
        }
        Ok(report)
    }
}
