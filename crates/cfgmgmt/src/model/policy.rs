//! Rotation policies and the rules binding elements to them

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::target::{CfgTarget, ElementMatcher, any_matches};

/// Kind of rotation requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Credential must be younger than `max_age`
    MaxAge,
    /// Kind this version cannot act on
    #[serde(other)]
    Unsupported,
}

/// How a due rotation is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMethod {
    #[default]
    Manual,
    Automated,
}

/// Rotation requirement referenced by rules
///
/// ```yaml
/// name: max-age-90d
/// type: max_age
/// max_age: 90d
/// rotation_method: automated
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: PolicyKind,

    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub max_age: Option<Duration>,

    #[serde(default)]
    pub rotation_method: RotationMethod,
}

impl Policy {
    pub fn max_age(name: impl Into<String>, max_age: Duration, rotation_method: RotationMethod) -> Self {
        Self {
            name: name.into(),
            kind: PolicyKind::MaxAge,
            max_age: Some(max_age),
            rotation_method,
        }
    }

    /// Age limit a rotation can be scheduled against
    ///
    /// `None` for unsupported kinds and for `max_age` policies missing the
    /// limit; elements bound to such a policy are not managed.
    pub fn age_limit(&self) -> Option<Duration> {
        match self.kind {
            PolicyKind::MaxAge => self.max_age,
            PolicyKind::Unsupported => None,
        }
    }

    /// Whether a credential last rotated on `last_update` is still compliant
    ///
    /// Compliant iff `today - last_update < max_age`; reaching the limit
    /// exactly is overdue. Policies without a usable age limit never pass.
    pub fn check(&self, last_update: NaiveDate, today: NaiveDate) -> bool {
        self.age_limit().is_some_and(|max_age| {
            let age = today.signed_duration_since(last_update);
            chrono::Duration::from_std(max_age).map_or(true, |limit| age < limit)
        })
    }
}

/// Binds elements to a policy by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub targets: Vec<ElementMatcher>,
    pub policy: String,
}

impl Rule {
    pub fn new(targets: Vec<ElementMatcher>, policy: impl Into<String>) -> Self {
        Self {
            name: None,
            targets,
            policy: policy.into(),
        }
    }

    pub fn matches(&self, target: &CfgTarget) -> bool {
        any_matches(&self.targets, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const DAY: u64 = 24 * 3600;

    fn date(days_ago: i64) -> NaiveDate {
        today() - chrono::Duration::days(days_ago)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[rstest]
    #[case(0, true)]
    #[case(10, true)]
    #[case(89, true)]
    #[case(90, false)]
    #[case(100, false)]
    fn max_age_boundary(#[case] days_ago: i64, #[case] compliant: bool) {
        let policy = Policy::max_age("p", Duration::from_secs(90 * DAY), RotationMethod::Automated);
        assert_eq!(policy.check(date(days_ago), today()), compliant);
    }

    #[test]
    fn unsupported_policy_never_complies() {
        let policy = Policy {
            name: "p".into(),
            kind: PolicyKind::Unsupported,
            max_age: Some(Duration::from_secs(90 * DAY)),
            rotation_method: RotationMethod::Manual,
        };
        assert!(!policy.check(today(), today()));
    }

    #[test]
    fn misspelled_max_age_leaves_no_age_limit() {
        let policy: Policy =
            serde_yaml::from_str("{name: p, type: max_age, maxAge: 90d}").unwrap();
        assert_eq!(policy.kind, PolicyKind::MaxAge);
        assert_eq!(policy.age_limit(), None);
        assert!(!policy.check(today(), today()));
    }

    #[test]
    fn deserializes_human_durations() {
        let raw = "
- name: max-age-90d
  type: max_age
  max_age: 90d
  rotation_method: automated
- name: legacy
  type: expiry_date
";
        let policies: Vec<Policy> = serde_yaml::from_str(raw).unwrap();
        assert_eq!(policies[0].max_age, Some(Duration::from_secs(90 * DAY)));
        assert_eq!(policies[0].rotation_method, RotationMethod::Automated);
        assert_eq!(policies[1].kind, PolicyKind::Unsupported);
        assert_eq!(policies[1].rotation_method, RotationMethod::Manual);
        assert_eq!(policies[1].max_age, None);
    }

    #[test]
    fn rule_matches_any_target() {
        let rule = Rule::new(
            vec![
                ElementMatcher::target("gcp", "svc1"),
                ElementMatcher::of_type("container_registry"),
            ],
            "p",
        );
        assert!(rule.matches(&CfgTarget::new("gcp", "svc1")));
        assert!(rule.matches(&CfgTarget::new("container_registry", "x")));
        assert!(!rule.matches(&CfgTarget::new("gcp", "svc2")));
    }
}
