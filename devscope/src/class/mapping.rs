//! Lookup tables referenced by `map` modifiers.
//!
//! A mapping file is a flat YAML mapping, e.g. `ifType.yaml`:
//!
//! ```yaml
//! 6: ethernetCsmacd
//! 24: softwareLoopback
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use super::yaml::Scalar;
use crate::error::ClassError;

pub type Mapping = Arc<IndexMap<String, String>>;

/// Mapping files by name.
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    files: HashMap<String, Mapping>,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.yaml` file in `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, ClassError> {
        let mut store = Self::new();
        let entries = fs::read_dir(dir).map_err(|source| ClassError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ClassError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            paths.push(entry.path());
        }
        paths.sort();

        for path in paths {
            if !path.is_file() {
                continue;
            }
            if !is_yaml(&path) {
                return Err(ClassError::UnexpectedFile(path));
            }
            let text = fs::read_to_string(&path).map_err(|source| ClassError::Io {
                path: path.clone(),
                source,
            })?;
            let raw: IndexMap<Scalar, Scalar> =
                serde_yaml::from_str(&text).map_err(|source| ClassError::Yaml {
                    path: path.clone(),
                    source,
                })?;

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            debug!("loaded mapping '{file_name}' with {} entries", raw.len());
            store.insert(&file_name, from_scalars(raw));
        }
        Ok(store)
    }

    /// Register a mapping under `name` and its stem (`ifType.yaml`, `ifType`).
    pub fn insert(&mut self, name: &str, mapping: IndexMap<String, String>) {
        let mapping = Arc::new(mapping);
        if let Some(stem) = name.strip_suffix(".yaml").or_else(|| name.strip_suffix(".yml")) {
            self.files.insert(stem.to_string(), mapping.clone());
        }
        self.files.insert(name.to_string(), mapping);
    }

    pub fn get(&self, name: &str) -> Result<Mapping, ClassError> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| ClassError::UnknownMapping(name.to_string()))
    }
}

pub(crate) fn from_scalars(raw: IndexMap<Scalar, Scalar>) -> IndexMap<String, String> {
    raw.into_iter().map(|(k, v)| (k.0, v.0)).collect()
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
