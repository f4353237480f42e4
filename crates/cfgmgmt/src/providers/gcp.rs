//! GCP IAM service account key issuer
//!
//! Talks to the IAM REST API directly:
//!
//! - create: `POST {endpoint}/v1/projects/-/serviceAccounts/{email}/keys`
//! - delete: `DELETE {endpoint}/v1/{key name}`
//!
//! Requests are authorised with an OAuth access token. In production the
//! token comes from a signed JWT bearer grant using the rotation identity's
//! service account key ([`ServiceAccountTokenSource`]).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{CredentialIssuer, IssuedKey, IssuerFactory, KeyId, Principal, ProviderError};
use crate::model::ServiceAccountKey;
use crate::rotation::RotationContext;

/// Public IAM endpoint
pub const DEFAULT_IAM_ENDPOINT: &str = "https://iam.googleapis.com";
/// Token endpoint used when the key file carries none
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Scope required for key management
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Tokens are refreshed this long before they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Source of OAuth access tokens
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, ProviderError>;
}

/// Fixed token, e.g. from `gcloud auth print-access-token`
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, ProviderError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Exchanges a self-signed JWT for an access token and caches it
pub struct ServiceAccountTokenSource {
    http: reqwest::Client,
    client_email: String,
    private_key_id: String,
    encoding_key: EncodingKey,
    token_uri: String,
    cached: Mutex<Option<(String, Instant)>>,
}

impl ServiceAccountTokenSource {
    pub fn new(http: reqwest::Client, key: &ServiceAccountKey) -> Result<Self, ProviderError> {
        let pem = key.private_key().ok_or_else(|| ProviderError::Configuration {
            message: format!("service account key of {} has no private_key", key.client_email),
        })?;
        let encoding_key =
            EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| ProviderError::Configuration {
                message: format!("unusable private key of {}: {e}", key.client_email),
            })?;
        Ok(Self {
            http,
            client_email: key.client_email.clone(),
            private_key_id: key.private_key_id.clone(),
            encoding_key,
            token_uri: key.token_uri().unwrap_or(DEFAULT_TOKEN_URI).to_string(),
            cached: Mutex::new(None),
        })
    }

    fn signed_assertion(&self) -> Result<String, ProviderError> {
        let now = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            iss: &self.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.private_key_id.clone());
        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            ProviderError::Configuration {
                message: format!("cannot sign token request: {e}"),
            }
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String, ProviderError> {
        if let Some((token, expires_at)) = self.cached.lock().as_ref() {
            if Instant::now() < *expires_at {
                return Ok(token.clone());
            }
        }

        let assertion = self.signed_assertion()?;
        let response = self
            .http
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(network_error)?;
        let response = check_status(response, &self.token_uri).await?;
        let token: TokenResponse = response.json().await.map_err(|e| ProviderError::InvalidResponse {
            message: format!("token response: {e}"),
        })?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *self.cached.lock() = Some((token.access_token.clone(), Instant::now() + lifetime));
        debug!(client_email = %self.client_email, "obtained access token");
        Ok(token.access_token)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateKeyResponse {
    name: String,
    private_key_data: String,
}

/// IAM client acting as one rotation identity
pub struct GcpIamIssuer {
    http: reqwest::Client,
    endpoint: String,
    tokens: Arc<dyn TokenSource>,
}

impl GcpIamIssuer {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/v1/{resource}", self.endpoint)
    }
}

#[async_trait]
impl CredentialIssuer for GcpIamIssuer {
    fn provider_name(&self) -> &'static str {
        "gcp-iam"
    }

    async fn create_key(&self, principal: &Principal) -> Result<IssuedKey, ProviderError> {
        let url = self.url(&format!("{}/keys", principal.service_account_name()));
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(network_error)?;
        let response = check_status(response, &principal.service_account_name()).await?;
        let created: CreateKeyResponse =
            response.json().await.map_err(|e| ProviderError::InvalidResponse {
                message: format!("create key response: {e}"),
            })?;

        let decoded = STANDARD
            .decode(created.private_key_data.as_bytes())
            .map_err(|e| ProviderError::InvalidResponse {
                message: format!("privateKeyData is not base64: {e}"),
            })?;
        let material: Value =
            serde_json::from_slice(&decoded).map_err(|e| ProviderError::InvalidResponse {
                message: format!("privateKeyData is not a JSON key file: {e}"),
            })?;

        info!(key = %created.name, "created service account key");
        Ok(IssuedKey {
            id: KeyId::new(created.name),
            material,
        })
    }

    async fn delete_key(&self, key: &KeyId) -> Result<(), ProviderError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .delete(self.url(key.as_str()))
            .bearer_auth(token)
            .send()
            .await
            .map_err(network_error)?;
        check_status(response, key.as_str()).await?;
        info!(%key, "deleted service account key");
        Ok(())
    }
}

/// Builds [`GcpIamIssuer`]s authenticated as the rotation identity
#[derive(Debug, Clone)]
pub struct GcpIssuerFactory {
    http: reqwest::Client,
    endpoint: String,
}

impl GcpIssuerFactory {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

impl IssuerFactory for GcpIssuerFactory {
    fn issuer_for(
        &self,
        context: &RotationContext,
    ) -> Result<Arc<dyn CredentialIssuer>, ProviderError> {
        let key = context
            .identity()
            .service_account_key()
            .map_err(|e| ProviderError::Configuration {
                message: e.to_string(),
            })?;
        let tokens = ServiceAccountTokenSource::new(self.http.clone(), &key)?;
        Ok(Arc::new(GcpIamIssuer::new(
            self.http.clone(),
            self.endpoint.clone(),
            Arc::new(tokens),
        )))
    }
}

fn network_error(e: reqwest::Error) -> ProviderError {
    ProviderError::Network {
        message: e.to_string(),
    }
}

async fn check_status(
    response: reqwest::Response,
    resource: &str,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = format!("{resource}: {status} {body}");
    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::Quota { message },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::PermissionDenied { message },
        StatusCode::NOT_FOUND => ProviderError::NotFound {
            key: resource.to_string(),
        },
        _ => ProviderError::InvalidResponse { message },
    })
}
