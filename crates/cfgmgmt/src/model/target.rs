//! Element identity and matchers
//!
//! Rules and responsible mappings select elements through an ordered list of
//! [`ElementMatcher`]s. Matchers are a closed set of variants evaluated with a
//! plain `match`; the serialized form picks the variant by its fields:
//!
//! ```yaml
//! - { type: gcp, name: svc1 }            # exact element
//! - { type: container_registry }         # every element of a type
//! - { type: gcp, name_pattern: "ci-.*" } # regular expression over the name
//! ```

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `(type, name)` identity of a configuration element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CfgTarget {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
}

impl CfgTarget {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Parse an element reference of the form `type/name`
    pub fn parse_reference(reference: &str) -> Option<Self> {
        let (type_name, name) = reference.trim().split_once('/')?;
        if type_name.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(type_name, name))
    }

    pub fn matches(&self, other: &CfgTarget) -> bool {
        self == other
    }
}

impl fmt::Display for CfgTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_name, self.name)
    }
}

/// Anchored regular expression over element names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamePattern {
    source: String,
    regex: Regex,
}

impl NamePattern {
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self { source, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl PartialEq for NamePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for NamePattern {}

impl TryFrom<String> for NamePattern {
    type Error = regex::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NamePattern> for String {
    fn from(value: NamePattern) -> Self {
        value.source
    }
}

/// Every element of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeMatcher {
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Elements whose name matches a pattern, optionally restricted to one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternMatcher {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub name_pattern: NamePattern,
}

/// Predicate over element identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementMatcher {
    Pattern(PatternMatcher),
    Target(CfgTarget),
    Type(TypeMatcher),
}

impl ElementMatcher {
    pub fn target(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Target(CfgTarget::new(type_name, name))
    }

    pub fn of_type(type_name: impl Into<String>) -> Self {
        Self::Type(TypeMatcher {
            type_name: type_name.into(),
        })
    }

    pub fn pattern(
        type_name: Option<&str>,
        name_pattern: &str,
    ) -> Result<Self, regex::Error> {
        Ok(Self::Pattern(PatternMatcher {
            type_name: type_name.map(str::to_owned),
            name_pattern: NamePattern::new(name_pattern)?,
        }))
    }

    pub fn matches(&self, target: &CfgTarget) -> bool {
        match self {
            Self::Target(expected) => expected == target,
            Self::Type(m) => m.type_name == target.type_name,
            Self::Pattern(m) => {
                m.type_name
                    .as_deref()
                    .is_none_or(|type_name| type_name == target.type_name)
                    && m.name_pattern.is_match(&target.name)
            }
        }
    }
}

/// True if any matcher in the list matches
pub fn any_matches(matchers: &[ElementMatcher], target: &CfgTarget) -> bool {
    matchers.iter().any(|m| m.matches(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn gcp(name: &str) -> CfgTarget {
        CfgTarget::new("gcp", name)
    }

    #[rstest]
    #[case("gcp/svc1", Some(("gcp", "svc1")))]
    #[case(" container_registry/gcr-ro ", Some(("container_registry", "gcr-ro")))]
    #[case("gcp", None)]
    #[case("/svc1", None)]
    #[case("gcp/", None)]
    #[case("gcp/a/b", None)]
    fn parses_references(#[case] raw: &str, #[case] expected: Option<(&str, &str)>) {
        let expected = expected.map(|(t, n)| CfgTarget::new(t, n));
        assert_eq!(CfgTarget::parse_reference(raw), expected);
    }

    #[test]
    fn exact_matcher() {
        let m = ElementMatcher::target("gcp", "svc1");
        assert!(m.matches(&gcp("svc1")));
        assert!(!m.matches(&gcp("svc2")));
        assert!(!m.matches(&CfgTarget::new("container_registry", "svc1")));
    }

    #[test]
    fn type_matcher() {
        let m = ElementMatcher::of_type("gcp");
        assert!(m.matches(&gcp("anything")));
        assert!(!m.matches(&CfgTarget::new("github", "anything")));
    }

    #[test]
    fn pattern_matcher_is_anchored() {
        let m = ElementMatcher::pattern(Some("gcp"), "ci-.*").unwrap();
        assert!(m.matches(&gcp("ci-prod")));
        assert!(!m.matches(&gcp("old-ci-prod")));
        assert!(!m.matches(&CfgTarget::new("github", "ci-prod")));

        let any_type = ElementMatcher::pattern(None, "ci-.*").unwrap();
        assert!(any_type.matches(&CfgTarget::new("github", "ci-prod")));
    }

    #[test]
    fn deserializes_each_variant_by_shape() {
        let raw = r#"
- { type: gcp, name: svc1 }
- { type: container_registry }
- { type: gcp, name_pattern: "ci-.*" }
- { name_pattern: "x" }
"#;
        let matchers: Vec<ElementMatcher> = serde_yaml::from_str(raw).unwrap();
        assert_eq!(matchers[0], ElementMatcher::target("gcp", "svc1"));
        assert_eq!(matchers[1], ElementMatcher::of_type("container_registry"));
        assert_eq!(
            matchers[2],
            ElementMatcher::pattern(Some("gcp"), "ci-.*").unwrap()
        );
        assert_eq!(matchers[3], ElementMatcher::pattern(None, "x").unwrap());
    }

    #[test]
    fn invalid_pattern_fails_to_load() {
        let raw = r#"[{ type: gcp, name_pattern: "(" }]"#;
        assert!(serde_yaml::from_str::<Vec<ElementMatcher>>(raw).is_err());
    }

    #[test]
    fn display_is_reference_form() {
        assert_eq!(gcp("svc1").to_string(), "gcp/svc1");
    }
}
