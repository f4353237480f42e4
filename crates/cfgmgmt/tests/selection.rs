//! Candidate selection over realistic metadata
mod common;

use cfgmgmt::model::{CfgTarget, ConfigElement, ElementMatcher, RotationMethod, Rule};
use cfgmgmt::selection::{SelectionFilter, iter_elements_requiring_rotation};
use common::{days_ago, gcp_element, metadata, registry_element, status, today};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn selected<'a>(
    elements: &'a [ConfigElement],
    metadata: &'a cfgmgmt::CfgMetadata,
    filter: SelectionFilter<'a>,
) -> Vec<&'a str> {
    iter_elements_requiring_rotation(elements, metadata, filter, today())
        .map(ConfigElement::name)
        .collect()
}

#[rstest]
#[case::scenario_a(100, true)]
#[case::scenario_b(10, false)]
#[case::boundary(90, true)]
#[case::day_before_boundary(89, false)]
fn overdue_elements_are_selected(#[case] age_days: i64, #[case] expected: bool) {
    let mut metadata = metadata();
    metadata.statuses.push(status("gcp", "svc1", days_ago(age_days)));
    let elements = vec![gcp_element("svc1", "k1")];

    let names = selected(&elements, &metadata, SelectionFilter::default());

    assert_eq!(names == vec!["svc1"], expected);
}

#[test]
fn never_rotated_elements_are_always_due() {
    let metadata = metadata();
    let elements = vec![gcp_element("a", "k1"), registry_element("b", "k2")];
    assert_eq!(selected(&elements, &metadata, SelectionFilter::default()), vec!["a", "b"]);
}

#[test]
fn unmanaged_elements_are_never_yielded() {
    let mut metadata = metadata();
    metadata.rules = vec![
        Rule::new(vec![ElementMatcher::target("gcp", "dangling")], "no-such-policy"),
        Rule::new(vec![ElementMatcher::target("gcp", "managed")], "max-age-90d"),
    ];
    let elements = vec![
        gcp_element("dangling", "k1"),
        gcp_element("unmatched", "k2"),
        gcp_element("managed", "k3"),
    ];

    assert_eq!(selected(&elements, &metadata, SelectionFilter::default()), vec!["managed"]);
}

#[test]
fn pattern_rules_apply_to_matching_names_only() {
    let mut metadata = metadata();
    metadata.rules = vec![Rule::new(
        vec![ElementMatcher::pattern(Some("gcp"), "ci-.*").unwrap()],
        "max-age-90d",
    )];
    let elements = vec![gcp_element("ci-build", "k1"), gcp_element("prod-ci-build", "k2")];

    assert_eq!(selected(&elements, &metadata, SelectionFilter::default()), vec!["ci-build"]);
}

#[test]
fn filters_restrict_the_sequence() {
    let metadata = metadata();
    let elements = vec![gcp_element("a", "k1"), gcp_element("b", "k2"), registry_element("c", "k3")];

    let only_b = CfgTarget::new("gcp", "b");
    let by_target = SelectionFilter::default().target(&only_b);
    assert_eq!(selected(&elements, &metadata, by_target), vec!["b"]);

    let registries = |e: &ConfigElement| e.type_name() == "container_registry";
    let by_predicate = SelectionFilter::default().element_filter(&registries);
    assert_eq!(selected(&elements, &metadata, by_predicate), vec!["c"]);

    let manual = SelectionFilter::default().rotation_method(RotationMethod::Manual);
    assert!(selected(&elements, &metadata, manual).is_empty());
}

#[test]
fn capped_sequence_can_be_restarted() {
    let metadata = metadata();
    let elements: Vec<_> = (0..4).map(|i| gcp_element(&format!("svc{i}"), "k")).collect();
    let candidates =
        iter_elements_requiring_rotation(&elements, &metadata, SelectionFilter::default(), today());

    let first: Vec<_> = candidates.clone().take(2).map(ConfigElement::name).collect();
    let again: Vec<_> = candidates.take(2).map(ConfigElement::name).collect();
    assert_eq!(first, again);
}
