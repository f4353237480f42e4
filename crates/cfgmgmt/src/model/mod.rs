//! Data model: elements, matchers, policies, statuses and queue entries

pub mod element;
pub mod metadata;
pub mod policy;
pub mod queue;
pub mod responsible;
pub mod status;
pub mod target;

pub use element::{
    CFG_SET_TYPE, CONTAINER_REGISTRY_TYPE, ConfigElement, GCP_SERVICE_ACCOUNT_TYPE, RawAttributes,
    SecretVariant, ServiceAccountKey,
};
pub use metadata::CfgMetadata;
pub use policy::{Policy, PolicyKind, RotationMethod, Rule};
pub use queue::{
    DELETE_GRACE_PERIOD_DAYS, GCP_SECRET_KEY, QueueEntry, SecretId, create_queue_entry,
    iter_queue_entries_to_be_deleted,
};
pub use responsible::{Contact, Responsible};
pub use status::{Status, update_status};
pub use target::{CfgTarget, ElementMatcher, NamePattern, PatternMatcher, TypeMatcher};
