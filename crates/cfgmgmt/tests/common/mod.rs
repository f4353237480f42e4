//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::time::Duration;

use cfgmgmt::model::{
    CfgMetadata, CfgTarget, ConfigElement, ElementMatcher, Policy, RawAttributes, RotationMethod,
    Rule, Status,
};
use cfgmgmt::providers::memory::key_document;
use chrono::NaiveDate;
use serde_json::{Value, json};

pub const DAY: u64 = 24 * 60 * 60;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

pub fn days_ago(days: i64) -> NaiveDate {
    today() - chrono::Duration::days(days)
}

pub fn email(name: &str) -> String {
    format!("{name}@project.iam.gserviceaccount.com")
}

fn attributes(value: Value) -> RawAttributes {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("fixture attributes are objects"),
    }
}

/// `gcp` element holding the key `key_name` of `<name>@project...`
pub fn gcp_element(name: &str, key_name: &str) -> ConfigElement {
    ConfigElement::new(
        "gcp",
        name,
        attributes(json!({ "service_account_key": key_document(&email(name), key_name) })),
    )
}

/// `gcp` element rotated through another element's identity
pub fn delegated_gcp_element(name: &str, key_name: &str, rotation_cfg: &str) -> ConfigElement {
    ConfigElement::new(
        "gcp",
        name,
        attributes(json!({
            "rotation_cfg": rotation_cfg,
            "service_account_key": key_document(&email(name), key_name),
        })),
    )
}

/// `container_registry` element with the key JSON-encoded in `password`
pub fn registry_element(name: &str, key_name: &str) -> ConfigElement {
    ConfigElement::new(
        "container_registry",
        name,
        attributes(json!({
            "host": "eu.gcr.io",
            "username": "_json_key",
            "password": key_document(&email(name), key_name).to_string(),
        })),
    )
}

/// One automated 90 day policy for `gcp` and `container_registry`
pub fn metadata() -> CfgMetadata {
    CfgMetadata {
        policies: vec![Policy::max_age(
            "max-age-90d",
            Duration::from_secs(90 * DAY),
            RotationMethod::Automated,
        )],
        rules: vec![Rule::new(
            vec![
                ElementMatcher::of_type("gcp"),
                ElementMatcher::of_type("container_registry"),
            ],
            "max-age-90d",
        )],
        ..CfgMetadata::default()
    }
}

pub fn status(type_name: &str, name: &str, date: NaiveDate) -> Status {
    Status {
        target: CfgTarget::new(type_name, name),
        credential_update_timestamp: date,
    }
}

pub fn key_id_of(element: &ConfigElement) -> String {
    element.service_account_key().unwrap().private_key_id
}
