//! Credential rotation
//!
//! Context resolution, the rotation state machine, and the
//! create / commit / revert / delete operations.

pub mod context;
pub mod error;
pub mod state;
pub mod workflow;

pub use context::RotationContext;
pub use error::{RotationError, RotationResult};
pub use state::{RotationId, RotationState};
pub use workflow::{
    AppliedRotation, Compensation, DEFAULT_KEY_CREATE_TIMEOUT, PendingRotation, RotateOptions,
    delete_config_secret, rotate,
};
