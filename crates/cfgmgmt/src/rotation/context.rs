//! Rotation context: the identity performing a rotation

use crate::model::ConfigElement;
use crate::store::ElementStore;

use super::error::RotationResult;

/// Identity whose credentials are used to talk to the issuer
///
/// Either the element itself or the element named by its `rotation_cfg`.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationContext {
    identity: ConfigElement,
    delegated: bool,
}

impl RotationContext {
    /// Resolve the context of `element` through `store`
    pub fn resolve<S: ElementStore + ?Sized>(
        element: &ConfigElement,
        store: &S,
    ) -> RotationResult<Self> {
        match element.rotation_cfg()? {
            Some(reference) => {
                let identity = store.element(&reference).ok_or_else(|| {
                    element.inconsistency(format!("rotation_cfg {reference} does not exist"))
                })?;
                Ok(Self {
                    identity,
                    delegated: true,
                })
            }
            None => Ok(Self::own(element)),
        }
    }

    /// Rotate with the element's own credentials
    pub fn own(element: &ConfigElement) -> Self {
        Self {
            identity: element.clone(),
            delegated: false,
        }
    }

    pub fn identity(&self) -> &ConfigElement {
        &self.identity
    }

    pub fn is_delegated(&self) -> bool {
        self.delegated
    }
}
