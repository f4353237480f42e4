//! Element stores
//!
//! The engine reads elements through [`ElementStore`] and never writes
//! through it. Writing a rotated element back is the job of an
//! [`ElementApplier`], invoked by the run orchestration.

mod dir;
mod memory;

use async_trait::async_trait;

pub use dir::DirElementStore;
pub use memory::InMemoryElementStore;

use crate::model::{CFG_SET_TYPE, CfgTarget, ConfigElement};

/// Read access to configuration elements
pub trait ElementStore: Send + Sync {
    fn element_type_names(&self) -> Vec<String>;

    fn elements_of_type(&self, type_name: &str) -> Vec<ConfigElement>;

    fn element(&self, target: &CfgTarget) -> Option<ConfigElement> {
        self.elements_of_type(&target.type_name)
            .into_iter()
            .find(|e| e.name() == target.name)
    }

    /// Resolve a `type/name` reference
    fn resolve_reference(&self, reference: &str) -> Option<ConfigElement> {
        CfgTarget::parse_reference(reference).and_then(|target| self.element(&target))
    }
}

/// Writes a rotated element to wherever consumers read it from
#[async_trait]
pub trait ElementApplier: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn apply(&self, element: &ConfigElement) -> Result<(), Self::Error>;
}

/// All evaluable elements of a store, optionally restricted to one target
///
/// `cfg_set` elements only reference other elements and are skipped.
pub fn iter_cfg_elements<S: ElementStore + ?Sized>(
    store: &S,
    target: Option<&CfgTarget>,
) -> Vec<ConfigElement> {
    store
        .element_type_names()
        .into_iter()
        .filter(|type_name| type_name != CFG_SET_TYPE)
        .flat_map(|type_name| store.elements_of_type(&type_name))
        .filter(|element| target.is_none_or(|t| t.matches(element.target())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawAttributes;

    #[test]
    fn skips_cfg_sets_and_filters_by_target() {
        let store = InMemoryElementStore::new()
            .with_element(ConfigElement::new("gcp", "a", RawAttributes::new()))
            .with_element(ConfigElement::new("gcp", "b", RawAttributes::new()))
            .with_element(ConfigElement::new("cfg_set", "all", RawAttributes::new()));

        assert_eq!(iter_cfg_elements(&store, None).len(), 2);

        let only_b = CfgTarget::new("gcp", "b");
        let filtered = iter_cfg_elements(&store, Some(&only_b));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].target(), &only_b);
    }

    #[test]
    fn resolves_references() {
        let store = InMemoryElementStore::new()
            .with_element(ConfigElement::new("gcp", "admin", RawAttributes::new()));
        assert!(store.resolve_reference("gcp/admin").is_some());
        assert!(store.resolve_reference("gcp/nobody").is_none());
        assert!(store.resolve_reference("garbage").is_none());
    }
}
