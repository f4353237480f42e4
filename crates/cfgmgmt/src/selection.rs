//! Rotation candidate selection

use std::fmt;

use chrono::NaiveDate;

use crate::compliance::ComplianceReport;
use crate::model::{CfgMetadata, CfgTarget, ConfigElement, RotationMethod};

/// Caller-supplied element predicate
pub type ElementFilter<'f> = &'f (dyn Fn(&ConfigElement) -> bool + Send + Sync);

/// Optional restrictions applied before any policy is consulted
#[derive(Clone, Copy, Default)]
pub struct SelectionFilter<'f> {
    /// Only this exact element
    pub target: Option<&'f CfgTarget>,
    pub element_filter: Option<ElementFilter<'f>>,
    /// Only elements whose policy uses this rotation method
    pub rotation_method: Option<RotationMethod>,
}

impl<'f> SelectionFilter<'f> {
    pub fn target(mut self, target: &'f CfgTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn element_filter(mut self, filter: ElementFilter<'f>) -> Self {
        self.element_filter = Some(filter);
        self
    }

    pub fn rotation_method(mut self, method: RotationMethod) -> Self {
        self.rotation_method = Some(method);
        self
    }
}

impl fmt::Debug for SelectionFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionFilter")
            .field("target", &self.target)
            .field("element_filter", &self.element_filter.map(|_| "<fn>"))
            .field("rotation_method", &self.rotation_method)
            .finish()
    }
}

/// Outcome of evaluating one element, in exclusion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    FilteredOut,
    Unmanaged,
    UnsupportedPolicy,
    MethodMismatch,
    NeverRotated,
    Overdue,
    Compliant,
}

impl Decision {
    pub fn requires_rotation(self) -> bool {
        matches!(self, Self::NeverRotated | Self::Overdue)
    }
}

/// Decide whether `element` must be rotated on `today`
pub fn decide(
    element: &ConfigElement,
    metadata: &CfgMetadata,
    filter: &SelectionFilter<'_>,
    today: NaiveDate,
) -> Decision {
    if filter.target.is_some_and(|t| !t.matches(element.target())) {
        return Decision::FilteredOut;
    }
    if filter.element_filter.is_some_and(|f| !f(element)) {
        return Decision::FilteredOut;
    }

    let report = ComplianceReport::for_element(element, metadata);
    let (Some(policy), Some(_)) = (report.policy, report.rule) else {
        return Decision::Unmanaged;
    };
    if policy.age_limit().is_none() {
        return Decision::UnsupportedPolicy;
    }
    if filter
        .rotation_method
        .is_some_and(|m| m != policy.rotation_method)
    {
        return Decision::MethodMismatch;
    }
    match report.status {
        None => Decision::NeverRotated,
        Some(status) if policy.check(status.credential_update_timestamp, today) => {
            Decision::Compliant
        }
        Some(_) => Decision::Overdue,
    }
}

/// Lazy sequence of elements requiring rotation
///
/// Each element is evaluated when the iterator reaches it; a clone restarts
/// from the clone point.
#[derive(Debug, Clone)]
pub struct RotationCandidates<'a, I> {
    elements: I,
    metadata: &'a CfgMetadata,
    filter: SelectionFilter<'a>,
    today: NaiveDate,
}

impl<'a, I> Iterator for RotationCandidates<'a, I>
where
    I: Iterator<Item = &'a ConfigElement>,
{
    type Item = &'a ConfigElement;

    fn next(&mut self) -> Option<Self::Item> {
        let (metadata, filter, today) = (self.metadata, self.filter, self.today);
        self.elements
            .by_ref()
            .find(|element| decide(element, metadata, &filter, today).requires_rotation())
    }
}

/// Elements whose policy requires rotation now
pub fn iter_elements_requiring_rotation<'a, I>(
    elements: I,
    metadata: &'a CfgMetadata,
    filter: SelectionFilter<'a>,
    today: NaiveDate,
) -> RotationCandidates<'a, I::IntoIter>
where
    I: IntoIterator<Item = &'a ConfigElement>,
{
    RotationCandidates {
        elements: elements.into_iter(),
        metadata,
        filter,
        today,
    }
}
