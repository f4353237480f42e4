//! HTTP document sink
//!
//! Each record is POSTed as a JSON document to `{endpoint}/{index}/_doc`,
//! which is what Elasticsearch/OpenSearch style document stores accept.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::{ComplianceSummaryRecord, ElementComplianceRecord, MetricsError, MetricsSink};

/// Index suffix of summary documents; element documents use the bare index
const SUMMARY_SUFFIX: &str = "-summary";

#[derive(Debug, Clone)]
pub struct HttpMetricsSink {
    http: reqwest::Client,
    endpoint: Url,
    index: String,
}

impl HttpMetricsSink {
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        index: impl Into<String>,
    ) -> Result<Self, MetricsError> {
        let endpoint = Url::parse(endpoint).map_err(|e| MetricsError::Configuration {
            message: format!("invalid metrics endpoint {endpoint:?}: {e}"),
        })?;
        let index = index.into();
        if index.is_empty() || index.contains('/') {
            return Err(MetricsError::Configuration {
                message: format!("invalid metrics index {index:?}"),
            });
        }
        Ok(Self {
            http,
            endpoint,
            index,
        })
    }

    fn document_url(&self, index: &str) -> Result<Url, MetricsError> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{index}/_doc")).map_err(|e| MetricsError::Configuration {
            message: e.to_string(),
        })
    }

    async fn post<T: Serialize + Sync>(&self, index: &str, document: &T) -> Result<(), MetricsError> {
        let url = self.document_url(index)?;
        let response = self
            .http
            .post(url.clone())
            .json(document)
            .send()
            .await
            .map_err(|e| MetricsError::Delivery {
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetricsError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!(%url, "delivered metrics document");
        Ok(())
    }
}

#[async_trait]
impl MetricsSink for HttpMetricsSink {
    async fn compliance_summary(&self, record: &ComplianceSummaryRecord) -> Result<(), MetricsError> {
        let index = format!("{}{SUMMARY_SUFFIX}", self.index);
        self.post(&index, record).await
    }

    async fn element_compliance(&self, record: &ElementComplianceRecord) -> Result<(), MetricsError> {
        self.post(&self.index, record).await
    }
}
