//! Metadata files of a configuration directory
//!
//! | file                        | top-level key    | content                 |
//! |-----------------------------|------------------|-------------------------|
//! | `config_policies.yaml`      | `policies`,`rules` | policies and rules    |
//! | `config_responsibles.yaml`  | `responsibles`   | responsible mappings    |
//! | `config_status.yaml`        | `config_status`  | rotation statuses       |
//! | `config_queue.yaml`         | `rotation_queue` | deletion queue          |
//!
//! Missing files load as empty. Status and queue files are rewritten in full
//! and atomically on every mutation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{CfgMetadata, Policy, QueueEntry, Responsible, Rule, Status};
use crate::utils::fs::atomic_write;

pub const POLICIES_FILE: &str = "config_policies.yaml";
pub const RESPONSIBLES_FILE: &str = "config_responsibles.yaml";
pub const STATUS_FILE: &str = "config_status.yaml";
pub const QUEUE_FILE: &str = "config_queue.yaml";

/// File names holding metadata rather than elements
pub const METADATA_FILES: [&str; 4] = [POLICIES_FILE, RESPONSIBLES_FILE, STATUS_FILE, QUEUE_FILE];

/// Failures reading or writing persisted state
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Cannot serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Destination of status and queue rewrites
pub trait MetadataWriter: Send + Sync {
    fn write_statuses(&self, statuses: &[Status]) -> Result<(), PersistenceError>;

    fn write_queue(&self, queue: &[QueueEntry]) -> Result<(), PersistenceError>;
}

#[derive(Debug, Default, Deserialize)]
struct PoliciesDocument {
    #[serde(default)]
    policies: Vec<Policy>,
    #[serde(default)]
    rules: Vec<Rule>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsiblesDocument {
    #[serde(default)]
    responsibles: Vec<Responsible>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StatusDocument<S> {
    #[serde(default)]
    config_status: S,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct QueueDocument<Q> {
    #[serde(default)]
    rotation_queue: Q,
}

/// Configuration directory holding elements and metadata files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgDir {
    root: PathBuf,
}

impl CfgDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_metadata_file(file_name: &str) -> bool {
        METADATA_FILES.contains(&file_name)
    }

    /// Load all metadata files
    pub fn load_metadata(&self) -> Result<CfgMetadata, PersistenceError> {
        let policies: PoliciesDocument = self.read_document(POLICIES_FILE)?;
        let responsibles: ResponsiblesDocument = self.read_document(RESPONSIBLES_FILE)?;
        let statuses: StatusDocument<Vec<Status>> = self.read_document(STATUS_FILE)?;
        let queue: QueueDocument<Vec<QueueEntry>> = self.read_document(QUEUE_FILE)?;

        let metadata = CfgMetadata {
            policies: policies.policies,
            rules: policies.rules,
            responsibles: responsibles.responsibles,
            statuses: statuses.config_status,
            queue: queue.rotation_queue,
        };
        debug!(
            cfg_dir = %self.root.display(),
            policies = metadata.policies.len(),
            rules = metadata.rules.len(),
            statuses = metadata.statuses.len(),
            queue = metadata.queue.len(),
            "loaded metadata"
        );
        Ok(metadata)
    }

    fn read_document<T: DeserializeOwned + Default>(&self, file_name: &str) -> Result<T, PersistenceError> {
        let path = self.root.join(file_name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(source) => return Err(PersistenceError::Io { path, source }),
        };
        if content.trim().is_empty() {
            return Ok(T::default());
        }
        serde_yaml::from_str(&content).map_err(|source| PersistenceError::Parse { path, source })
    }

    fn write_document<T: Serialize>(&self, file_name: &str, document: &T) -> Result<(), PersistenceError> {
        let path = self.root.join(file_name);
        let content = serde_yaml::to_string(document).map_err(|source| PersistenceError::Serialize {
            path: path.clone(),
            source,
        })?;
        atomic_write(&path, content.as_bytes()).map_err(|source| PersistenceError::Io { path, source })
    }
}

impl MetadataWriter for CfgDir {
    fn write_statuses(&self, statuses: &[Status]) -> Result<(), PersistenceError> {
        self.write_document(STATUS_FILE, &StatusDocument {
            config_status: statuses,
        })
    }

    fn write_queue(&self, queue: &[QueueEntry]) -> Result<(), PersistenceError> {
        self.write_document(QUEUE_FILE, &QueueDocument {
            rotation_queue: queue,
        })
    }
}
