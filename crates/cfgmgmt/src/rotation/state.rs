//! Rotation state machine and identifiers
//!
//! ```text
//! Pending → KeyCreated → Applied    (success)
//!               ↓
//!           Reverted                (compensation executed)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{RotationError, RotationResult};

/// Unique identifier of one rotation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RotationId(Uuid);

impl RotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a rotation stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationState {
    /// Nothing created yet
    Pending,
    /// New key exists at the provider; old key untouched
    KeyCreated,
    /// New element applied downstream, old key queued for deletion
    Applied,
    /// New key deleted again
    Reverted,
}

impl RotationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Applied | Self::Reverted)
    }

    pub fn can_transition_to(self, next: RotationState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::KeyCreated)
                | (Self::KeyCreated, Self::Applied)
                | (Self::KeyCreated, Self::Reverted)
        )
    }

    pub fn transition(self, next: RotationState) -> RotationResult<RotationState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(RotationError::InvalidStateTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for RotationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::KeyCreated => "key_created",
            Self::Applied => "applied",
            Self::Reverted => "reverted",
        };
        f.write_str(name)
    }
}
