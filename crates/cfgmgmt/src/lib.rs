//! cfgmgmt - credential compliance and rotation
//!
//! Decides for every configuration element holding a secret whether it
//! complies with its age policy, rotates the ones that do not, and deletes
//! replaced credentials after a grace period.
//!
//! # Flow
//!
//! - [`compliance::determine_status`] matches rule, policy, responsible and
//!   status for one element
//! - [`selection::iter_elements_requiring_rotation`] lazily yields overdue
//!   elements
//! - [`rotation::rotate`] creates a new key and returns a pending rotation
//!   that is committed or reverted
//! - [`runner::RotationRunner`] drives all of the above against a store and
//!   persists statuses and the deletion queue
#![forbid(unsafe_code)]

/// Compliance reports and summaries
pub mod compliance;
/// Compliance metrics sinks
pub mod metrics;
/// Elements, matchers, policies, statuses and queue entries
pub mod model;
/// Metadata files of a configuration directory
pub mod persist;
/// Credential-issuing services
pub mod providers;
/// Credential rotation
pub mod rotation;
/// Batch orchestration
pub mod runner;
/// Rotation candidate selection
pub mod selection;
/// Element stores
pub mod store;
/// Date and file helpers
pub mod utils;

// ── Root re-exports ─────────────────────────────────────────────────────────

pub use crate::compliance::{
    ComplianceReport, ComplianceState, ReportingSummary, determine_status,
    generate_status_reports,
};
pub use crate::model::{
    CfgMetadata, CfgTarget, ConfigElement, ElementMatcher, Policy, PolicyKind, QueueEntry,
    Responsible, RotationMethod, Rule, SecretId, SecretVariant, Status,
};
pub use crate::persist::{CfgDir, MetadataWriter, PersistenceError};
pub use crate::providers::{CredentialIssuer, IssuerFactory, ProviderError};
pub use crate::rotation::{RotationError, RotationResult, RotationState};
pub use crate::runner::{DrainReport, RotationRunner, RunError, RunOptions, RunReport};
pub use crate::selection::{SelectionFilter, iter_elements_requiring_rotation};
pub use crate::store::{DirElementStore, ElementApplier, ElementStore, InMemoryElementStore};

/// Commonly used types and traits
pub mod prelude {
    pub use crate::compliance::{ComplianceReport, ComplianceState, determine_status};
    pub use crate::model::{
        CfgMetadata, CfgTarget, ConfigElement, ElementMatcher, Policy, QueueEntry, RotationMethod,
        Rule, Status, create_queue_entry, iter_queue_entries_to_be_deleted, update_status,
    };
    pub use crate::persist::{CfgDir, MetadataWriter};
    pub use crate::providers::{CredentialIssuer, IssuerFactory, KeyId, Principal, ProviderError};
    pub use crate::rotation::{
        PendingRotation, RotateOptions, RotationError, RotationResult, delete_config_secret,
        rotate,
    };
    pub use crate::runner::{RotationRunner, RunOptions};
    pub use crate::selection::{SelectionFilter, iter_elements_requiring_rotation};
    pub use crate::store::{ElementApplier, ElementStore, iter_cfg_elements};
}
