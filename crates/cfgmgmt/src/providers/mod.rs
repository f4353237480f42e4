//! Credential-issuing services
//!
//! An issuer creates and deletes keys for one principal on behalf of a
//! rotation identity. Issuers are built per rotation through an
//! [`IssuerFactory`] supplied by the caller; nothing here is cached globally.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::rotation::RotationContext;

#[cfg(feature = "gcp")]
pub mod gcp;
pub mod memory;

#[cfg(feature = "gcp")]
pub use gcp::{GcpIamIssuer, GcpIssuerFactory, ServiceAccountTokenSource, StaticToken, TokenSource};
pub use memory::{InMemoryIssuer, StaticIssuerFactory};

/// Errors reported by a credential-issuing service
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Quota or rate limit exhausted
    #[error("Quota exceeded: {message}")]
    Quota { message: String },

    /// The rotation identity may not manage keys of the principal
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Key does not exist (already deleted or never created)
    #[error("Key not found: {key}")]
    NotFound { key: String },

    /// Transport failure
    #[error("Network error: {message}")]
    Network { message: String },

    /// Call did not finish in time
    #[error("Operation timed out after {timeout_secs}s: {operation}")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    /// Response could not be understood
    #[error("Invalid provider response: {message}")]
    InvalidResponse { message: String },

    /// The rotation identity cannot be turned into a client
    #[error("Provider configuration error: {message}")]
    Configuration { message: String },
}

/// Identity whose keys are managed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub client_email: String,
}

impl Principal {
    pub fn new(client_email: impl Into<String>) -> Self {
        Self {
            client_email: client_email.into(),
        }
    }

    /// `projects/-/serviceAccounts/{email}`
    pub fn service_account_name(&self) -> String {
        format!("projects/-/serviceAccounts/{}", self.client_email)
    }
}

/// Fully qualified key resource name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `projects/-/serviceAccounts/{email}/keys/{key}`
    pub fn qualified(principal: &Principal, key_name: &str) -> Self {
        Self(format!("{}/keys/{key_name}", principal.service_account_name()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Freshly created key
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedKey {
    pub id: KeyId,
    /// Secret document to store in the element
    pub material: Value,
}

/// Creates and deletes credentials of one provider
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    /// Provider name for logging
    fn provider_name(&self) -> &'static str;

    /// Create a brand-new key for `principal`
    async fn create_key(&self, principal: &Principal) -> Result<IssuedKey, ProviderError>;

    /// Delete one key
    ///
    /// Deleting a missing key fails with [`ProviderError::NotFound`] and
    /// leaves every other key untouched.
    async fn delete_key(&self, key: &KeyId) -> Result<(), ProviderError>;
}

/// Builds an issuer acting as the given rotation identity
pub trait IssuerFactory: Send + Sync {
    fn issuer_for(
        &self,
        context: &RotationContext,
    ) -> Result<Arc<dyn CredentialIssuer>, ProviderError>;
}
