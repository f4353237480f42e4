//! Compliance metrics
//!
//! Two record shapes are emitted per configuration directory: one
//! [`ComplianceSummaryRecord`] and one [`ElementComplianceRecord`] per
//! element. Delivery failures are logged and counted, never propagated
//! into the run.

#[cfg(feature = "http")]
mod http;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[cfg(feature = "http")]
pub use http::HttpMetricsSink;

use crate::compliance::{ComplianceReport, ComplianceState, ReportingSummary};
use crate::model::{CfgTarget, Contact, RotationMethod};

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Metrics endpoint unreachable: {message}")]
    Delivery { message: String },

    #[error("Metrics endpoint rejected document ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid metrics configuration: {message}")]
    Configuration { message: String },
}

/// Aggregated counts of one configuration directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceSummaryRecord {
    pub creation_date: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: ReportingSummary,
}

/// Compliance of one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementComplianceRecord {
    pub creation_date: DateTime<Utc>,
    pub element_storage: Option<String>,
    pub target: CfgTarget,
    pub state: ComplianceState,
    pub policy: Option<String>,
    pub rotation_method: Option<RotationMethod>,
    pub credential_update_timestamp: Option<NaiveDate>,
    pub responsible: Option<String>,
    /// Contacts of the matched responsible mapping
    pub responsibles: Option<Vec<Contact>>,
}

impl ElementComplianceRecord {
    pub fn from_report(report: &ComplianceReport<'_>, today: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            creation_date: now,
            element_storage: report.element_storage.map(str::to_string),
            target: report.target.clone(),
            state: report.state(today),
            policy: report.policy.map(|p| p.name.clone()),
            rotation_method: report.policy.map(|p| p.rotation_method),
            credential_update_timestamp: report.status.map(|s| s.credential_update_timestamp),
            responsible: report.responsible.map(|r| r.name.clone()),
            responsibles: report.responsible.map(|r| r.responsibles.clone()),
        }
    }
}

/// Destination of compliance records
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn compliance_summary(&self, record: &ComplianceSummaryRecord) -> Result<(), MetricsError>;

    async fn element_compliance(&self, record: &ElementComplianceRecord) -> Result<(), MetricsError>;
}

/// Emits records as structured log events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl MetricsSink for TracingSink {
    async fn compliance_summary(&self, record: &ComplianceSummaryRecord) -> Result<(), MetricsError> {
        info!(
            storage = %record.summary.storage,
            compliant = record.summary.compliant,
            non_compliant = record.summary.non_compliant,
            unmanaged = record.summary.unmanaged,
            "compliance summary"
        );
        Ok(())
    }

    async fn element_compliance(&self, record: &ElementComplianceRecord) -> Result<(), MetricsError> {
        info!(
            element = %record.target,
            state = ?record.state,
            policy = record.policy.as_deref(),
            responsible = record.responsible.as_deref(),
            "element compliance"
        );
        Ok(())
    }
}

/// Send the summary and one record per report; returns the failure count
pub async fn report_compliance<M: MetricsSink + ?Sized>(
    sink: &M,
    storage: &str,
    reports: &[ComplianceReport<'_>],
    today: NaiveDate,
) -> usize {
    let now = Utc::now();
    let mut failures = 0;

    let summary = ComplianceSummaryRecord {
        creation_date: now,
        summary: ReportingSummary::from_reports(storage, reports, today),
    };
    if let Err(error) = sink.compliance_summary(&summary).await {
        warn!(%error, storage, "could not deliver compliance summary");
        failures += 1;
    }

    for report in reports {
        let record = ElementComplianceRecord::from_report(report, today, now);
        if let Err(error) = sink.element_compliance(&record).await {
            warn!(%error, element = %record.target, "could not deliver element compliance");
            failures += 1;
        }
    }
    failures
}
