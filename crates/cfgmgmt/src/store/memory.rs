//! In-memory element store

use std::collections::BTreeMap;
use std::convert::Infallible;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ElementApplier, ElementStore};
use crate::model::{CfgTarget, ConfigElement};

/// Elements kept in a map; applying replaces the stored value
#[derive(Debug, Default)]
pub struct InMemoryElementStore {
    elements: RwLock<BTreeMap<CfgTarget, ConfigElement>>,
}

impl InMemoryElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(self, element: ConfigElement) -> Self {
        self.insert(element);
        self
    }

    pub fn insert(&self, element: ConfigElement) {
        self.elements
            .write()
            .insert(element.target().clone(), element);
    }
}

impl ElementStore for InMemoryElementStore {
    fn element_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .elements
            .read()
            .keys()
            .map(|t| t.type_name.clone())
            .collect();
        names.dedup();
        names
    }

    fn elements_of_type(&self, type_name: &str) -> Vec<ConfigElement> {
        self.elements
            .read()
            .values()
            .filter(|e| e.type_name() == type_name)
            .cloned()
            .collect()
    }

    fn element(&self, target: &CfgTarget) -> Option<ConfigElement> {
        self.elements.read().get(target).cloned()
    }
}

#[async_trait]
impl ElementApplier for InMemoryElementStore {
    type Error = Infallible;

    async fn apply(&self, element: &ConfigElement) -> Result<(), Self::Error> {
        self.insert(element.clone());
        Ok(())
    }
}
