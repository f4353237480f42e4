//! Directory backed element store
//!
//! Every `<type>.yaml` (or `.yml`) file in the directory maps element names
//! to attribute maps. Metadata files (`config_*.yaml`) are skipped.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::{ElementApplier, ElementStore};
use crate::model::{CfgTarget, ConfigElement, RawAttributes};
use crate::persist::{CfgDir, PersistenceError};
use crate::utils::fs::atomic_write;

#[derive(Debug)]
struct TypeFile {
    path: PathBuf,
    elements: BTreeMap<String, ConfigElement>,
}

/// Elements read from, and written back to, per-type YAML files
#[derive(Debug)]
pub struct DirElementStore {
    root: PathBuf,
    types: RwLock<BTreeMap<String, TypeFile>>,
}

impl DirElementStore {
    /// Read every element file below `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let root = root.into();
        let entries = fs::read_dir(&root).map_err(|source| PersistenceError::Io {
            path: root.clone(),
            source,
        })?;

        let mut types = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|source| PersistenceError::Io {
                path: root.clone(),
                source,
            })?;
            let path = entry.path();
            let Some(type_name) = element_type_of(&path) else {
                continue;
            };
            let elements = read_type_file(&path)?
                .into_iter()
                .map(|(name, raw)| {
                    let element = ConfigElement::new(type_name.clone(), name.clone(), raw);
                    (name, element)
                })
                .collect::<BTreeMap<_, _>>();
            debug!(path = %path.display(), count = elements.len(), "loaded element file");
            types.insert(type_name, TypeFile { path, elements });
        }

        info!(cfg_dir = %root.display(), types = types.len(), "opened element store");
        Ok(Self {
            root,
            types: RwLock::new(types),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, type_name: &str) -> PathBuf {
        self.types
            .read()
            .get(type_name)
            .map_or_else(|| self.root.join(format!("{type_name}.yaml")), |f| f.path.clone())
    }
}

fn element_type_of(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    let file_name = path.file_name()?.to_str()?;
    if CfgDir::is_metadata_file(file_name) {
        return None;
    }
    let extension = path.extension()?.to_str()?;
    if extension != "yaml" && extension != "yml" {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}

fn read_type_file(path: &Path) -> Result<BTreeMap<String, RawAttributes>, PersistenceError> {
    let content = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_yaml::from_str(&content).map_err(|source| PersistenceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl ElementStore for DirElementStore {
    fn element_type_names(&self) -> Vec<String> {
        self.types.read().keys().cloned().collect()
    }

    fn elements_of_type(&self, type_name: &str) -> Vec<ConfigElement> {
        self.types
            .read()
            .get(type_name)
            .map(|f| f.elements.values().cloned().collect())
            .unwrap_or_default()
    }

    fn element(&self, target: &CfgTarget) -> Option<ConfigElement> {
        self.types
            .read()
            .get(&target.type_name)
            .and_then(|f| f.elements.get(&target.name))
            .cloned()
    }
}

#[async_trait]
impl ElementApplier for DirElementStore {
    type Error = PersistenceError;

    /// Replace the element's entry in its type file, keeping all others
    async fn apply(&self, element: &ConfigElement) -> Result<(), Self::Error> {
        let path = self.path_for(element.type_name());
        let mut document = match fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => {
                serde_yaml::from_str::<serde_yaml::Mapping>(&content).map_err(|source| {
                    PersistenceError::Parse {
                        path: path.clone(),
                        source,
                    }
                })?
            }
            Ok(_) => serde_yaml::Mapping::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => serde_yaml::Mapping::new(),
            Err(source) => return Err(PersistenceError::Io { path, source }),
        };

        let attributes = serde_yaml::to_value(element.raw()).map_err(|source| {
            PersistenceError::Serialize {
                path: path.clone(),
                source,
            }
        })?;
        document.insert(serde_yaml::Value::String(element.name().to_string()), attributes);
        let content = serde_yaml::to_string(&document).map_err(|source| {
            PersistenceError::Serialize {
                path: path.clone(),
                source,
            }
        })?;
        atomic_write(&path, content.as_bytes()).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;

        let mut types = self.types.write();
        let file = types
            .entry(element.type_name().to_string())
            .or_insert_with(|| TypeFile {
                path,
                elements: BTreeMap::new(),
            });
        file.elements
            .insert(element.name().to_string(), element.clone());
        debug!(element = %element.target(), "applied element");
        Ok(())
    }
}
