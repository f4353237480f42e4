//! Rotation-specific error types

use thiserror::Error;

use super::state::RotationState;
use crate::model::CfgTarget;
use crate::providers::{KeyId, ProviderError};

/// Errors that can occur while rotating or deleting a credential
#[derive(Debug, Error)]
pub enum RotationError {
    /// Element or metadata cannot be acted on as configured
    #[error("Inconsistent configuration for {target}: {reason}")]
    ConfigInconsistency { target: CfgTarget, reason: String },

    /// Credential service call failed; nothing was changed
    #[error("Provider error for {target}: {source}")]
    Provider {
        target: CfgTarget,
        #[source]
        source: ProviderError,
    },

    /// State transition is not allowed
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: RotationState,
        to: RotationState,
    },

    /// Compensation could not delete the freshly created key
    #[error("Revert failed for {target}, key {key} is orphaned: {source}")]
    RevertFailed {
        target: CfgTarget,
        key: KeyId,
        #[source]
        source: ProviderError,
    },
}

impl RotationError {
    /// Whether the failure stays scoped to one element
    pub fn is_element_scoped(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::ConfigInconsistency { .. })
    }
}

/// Result type for rotation operations
pub type RotationResult<T> = Result<T, RotationError>;
