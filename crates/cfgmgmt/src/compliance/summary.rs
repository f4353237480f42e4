//! Aggregated compliance figures of one configuration directory

use chrono::NaiveDate;
use serde::Serialize;

use super::{ComplianceReport, ComplianceState};
use crate::model::CfgMetadata;
use crate::store::{ElementStore, iter_cfg_elements};

/// Element counts per [`ComplianceState`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportingSummary {
    pub storage: String,
    pub compliant: usize,
    pub non_compliant: usize,
    pub unmanaged: usize,
}

impl ReportingSummary {
    pub fn from_reports<'r, 'm: 'r, I>(storage: impl Into<String>, reports: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'r ComplianceReport<'m>>,
    {
        let mut summary = Self {
            storage: storage.into(),
            ..Self::default()
        };
        for report in reports {
            match report.state(today) {
                ComplianceState::Compliant => summary.compliant += 1,
                ComplianceState::NonCompliant => summary.non_compliant += 1,
                ComplianceState::Unmanaged => summary.unmanaged += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.compliant + self.non_compliant + self.unmanaged
    }
}

/// Reports for every element of `store`, tagged with `storage`
pub fn generate_status_reports<'a, S: ElementStore + ?Sized>(
    store: &S,
    metadata: &'a CfgMetadata,
    storage: &'a str,
) -> Vec<ComplianceReport<'a>> {
    iter_cfg_elements(store, None)
        .iter()
        .map(|element| ComplianceReport::for_element(element, metadata).with_storage(storage))
        .collect()
}
