//! Compliance evaluation
//!
//! [`determine_status`] combines the first matching rule, the policy it
//! names, the first matching responsible and the element's status into a
//! [`ComplianceReport`]. Evaluation is pure; nothing is mutated.

mod summary;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

pub use summary::{ReportingSummary, generate_status_reports};

use crate::model::{CfgMetadata, CfgTarget, ConfigElement, Policy, Responsible, Rule, Status};

/// Classification of one element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceState {
    Compliant,
    NonCompliant,
    /// No rule, an unresolvable policy or an unsupported policy kind
    Unmanaged,
}

/// Per-element snapshot of everything that applies to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_storage: Option<&'a str>,
    pub target: CfgTarget,
    pub policy: Option<&'a Policy>,
    pub rule: Option<&'a Rule>,
    pub status: Option<&'a Status>,
    pub responsible: Option<&'a Responsible>,
}

impl<'a> ComplianceReport<'a> {
    /// Evaluate `element` against all metadata collections
    pub fn for_element(element: &ConfigElement, metadata: &'a CfgMetadata) -> Self {
        determine_status(
            element,
            &metadata.policies,
            &metadata.rules,
            &metadata.responsibles,
            &metadata.statuses,
        )
    }

    /// Tag the report with the storage the element was read from
    #[must_use]
    pub fn with_storage(mut self, storage: &'a str) -> Self {
        self.element_storage = Some(storage);
        self
    }

    /// Whether a rule with a resolvable policy applies
    pub fn is_managed(&self) -> bool {
        self.rule.is_some() && self.policy.is_some()
    }

    pub fn state(&self, today: NaiveDate) -> ComplianceState {
        let (Some(policy), Some(_)) = (self.policy, self.rule) else {
            return ComplianceState::Unmanaged;
        };
        if policy.age_limit().is_none() {
            return ComplianceState::Unmanaged;
        }
        match self.status {
            Some(status) if policy.check(status.credential_update_timestamp, today) => {
                ComplianceState::Compliant
            }
            _ => ComplianceState::NonCompliant,
        }
    }
}

/// Evaluate one element
///
/// A rule naming a policy that does not exist is reported as no rule at all.
pub fn determine_status<'a>(
    element: &ConfigElement,
    policies: &'a [Policy],
    rules: &'a [Rule],
    responsibles: &'a [Responsible],
    statuses: &'a [Status],
) -> ComplianceReport<'a> {
    let target = element.target();

    let mut rule = rules.iter().find(|r| r.matches(target));
    let policy = rule.and_then(|r| {
        let policy = policies.iter().find(|p| p.name == r.policy);
        if policy.is_none() {
            warn!(
                element = %target,
                rule = r.name.as_deref().unwrap_or("<unnamed>"),
                policy = %r.policy,
                "rule references unknown policy"
            );
        }
        policy
    });
    if policy.is_none() {
        rule = None;
    }

    ComplianceReport {
        element_storage: None,
        target: target.clone(),
        policy,
        rule,
        status: statuses.iter().find(|s| s.matches(target)),
        responsible: responsibles.iter().find(|r| r.matches(target)),
    }
}
