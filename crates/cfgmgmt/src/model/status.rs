//! Last known rotation date per element

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::target::CfgTarget;
use crate::utils::time::iso_date;

/// Rotation record of one element; at most one per target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub target: CfgTarget,
    #[serde(with = "iso_date")]
    pub credential_update_timestamp: NaiveDate,
}

impl Status {
    pub fn matches(&self, target: &CfgTarget) -> bool {
        self.target.matches(target)
    }
}

/// Record that `target` was rotated on `today`
///
/// Finds or creates the status entry. Call once per rotation, after the new
/// credential was applied downstream, then persist the whole list.
pub fn update_status<'a>(
    target: &CfgTarget,
    statuses: &'a mut Vec<Status>,
    today: NaiveDate,
) -> &'a Status {
    let index = match statuses.iter().position(|s| s.matches(target)) {
        Some(index) => {
            statuses[index].credential_update_timestamp = today;
            index
        }
        None => {
            statuses.push(Status {
                target: target.clone(),
                credential_update_timestamp: today,
            });
            statuses.len() - 1
        }
    };
    tracing::debug!(target_element = %target, %today, "credential update timestamp set");
    &statuses[index]
}
