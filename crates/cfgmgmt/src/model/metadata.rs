//! Aggregate of all metadata of one configuration directory

use serde::{Deserialize, Serialize};

use super::policy::{Policy, PolicyKind, Rule};
use super::queue::QueueEntry;
use super::responsible::Responsible;
use super::status::Status;

/// Policies, rules, responsibles, statuses and the deletion queue
///
/// Loaded once per run, mutated in memory, written back through
/// [`crate::persist::MetadataWriter`]. Elements are referenced by
/// `(type, name)` only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CfgMetadata {
    #[serde(default)]
    pub policies: Vec<Policy>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub responsibles: Vec<Responsible>,
    #[serde(default)]
    pub statuses: Vec<Status>,
    #[serde(default)]
    pub queue: Vec<QueueEntry>,
}

impl CfgMetadata {
    pub fn policy(&self, name: &str) -> Option<&Policy> {
        self.policies.iter().find(|p| p.name == name)
    }

    /// Remove a drained queue entry; returns whether it was present
    pub fn remove_queue_entry(&mut self, entry: &QueueEntry) -> bool {
        match self.queue.iter().position(|e| e == entry) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// Human readable list of soft configuration problems
    ///
    /// None of these abort a run; affected elements are treated as unmanaged.
    pub fn inconsistencies(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for rule in &self.rules {
            if self.policy(&rule.policy).is_none() {
                issues.push(format!(
                    "rule {} references unknown policy {:?}",
                    rule.name.as_deref().unwrap_or("<unnamed>"),
                    rule.policy
                ));
            }
        }
        for policy in &self.policies {
            match policy.kind {
                PolicyKind::MaxAge if policy.max_age.is_none() => {
                    issues.push(format!("policy {:?} has no max_age", policy.name));
                }
                PolicyKind::Unsupported => {
                    issues.push(format!("policy {:?} has an unsupported type", policy.name));
                }
                PolicyKind::MaxAge => {}
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CfgTarget, ElementMatcher, RotationMethod, SecretId};
    use chrono::NaiveDate;
    use std::time::Duration;

    #[test]
    fn reports_dangling_policy_reference() {
        let metadata = CfgMetadata {
            policies: vec![Policy::max_age("p", Duration::from_secs(1), RotationMethod::Manual)],
            rules: vec![Rule::new(vec![ElementMatcher::of_type("gcp")], "missing")],
            ..CfgMetadata::default()
        };
        let issues = metadata.inconsistencies();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("missing"));
    }

    #[test]
    fn removes_only_the_given_entry() {
        let entry = |name: &str| QueueEntry {
            target: CfgTarget::new("gcp", name),
            delete_after: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            secret_id: SecretId::default(),
        };
        let mut metadata = CfgMetadata {
            queue: vec![entry("a"), entry("b")],
            ..CfgMetadata::default()
        };

        assert!(metadata.remove_queue_entry(&entry("a")));
        assert!(!metadata.remove_queue_entry(&entry("a")));
        assert_eq!(metadata.queue, vec![entry("b")]);
    }
}
