//! Owning parties of configuration elements (reporting only)

use serde::{Deserialize, Serialize};

use super::target::{CfgTarget, ElementMatcher, any_matches};

/// One contact, e.g. `{ name: platform-team, type: github_team }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Maps matching elements to their responsible contacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Responsible {
    pub name: String,
    pub targets: Vec<ElementMatcher>,
    #[serde(default)]
    pub responsibles: Vec<Contact>,
}

impl Responsible {
    pub fn matches(&self, target: &CfgTarget) -> bool {
        any_matches(&self.targets, target)
    }
}
