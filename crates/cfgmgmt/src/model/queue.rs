//! Old credentials awaiting deferred deletion

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::target::CfgTarget;
use crate::providers::KeyId;
use crate::utils::time::iso_date;

/// Days an old credential stays valid after its replacement was created
pub const DELETE_GRACE_PERIOD_DAYS: i64 = 7;

/// `secretId` key holding a qualified GCP service account key name
pub const GCP_SECRET_KEY: &str = "gcp_secret_key";

/// Provider-specific handles identifying the *old* credential
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretId(Map<String, Value>);

impl SecretId {
    pub fn gcp_key(key: &KeyId) -> Self {
        let mut map = Map::new();
        map.insert(GCP_SECRET_KEY.to_string(), Value::String(key.to_string()));
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Key name stored under [`GCP_SECRET_KEY`]
    pub fn gcp_key_id(&self) -> Option<KeyId> {
        self.get(GCP_SECRET_KEY).map(KeyId::new)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for SecretId {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Deletion queue record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub target: CfgTarget,
    #[serde(rename = "deleteAfter", with = "iso_date")]
    pub delete_after: NaiveDate,
    #[serde(rename = "secretId")]
    pub secret_id: SecretId,
}

impl QueueEntry {
    /// Due for deletion on or after `delete_after`
    pub fn to_be_deleted(&self, today: NaiveDate) -> bool {
        today >= self.delete_after
    }
}

/// Queue the old credential of `target` for deletion after the grace period
pub fn create_queue_entry(target: &CfgTarget, secret_id: SecretId, today: NaiveDate) -> QueueEntry {
    QueueEntry {
        target: target.clone(),
        delete_after: today + chrono::Duration::days(DELETE_GRACE_PERIOD_DAYS),
        secret_id,
    }
}

/// Entries due for deletion on `today`, optionally only those of `target`
pub fn iter_queue_entries_to_be_deleted<'a>(
    queue: &'a [QueueEntry],
    target: Option<&'a CfgTarget>,
    today: NaiveDate,
) -> impl Iterator<Item = &'a QueueEntry> + Clone {
    queue
        .iter()
        .filter(move |entry| target.is_none_or(|t| t.matches(&entry.target)))
        .filter(move |entry| entry.to_be_deleted(today))
}
