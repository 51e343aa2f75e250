use std::fs;
use std::path::{Path, PathBuf};
use std::sync::PoisonError;

use log::{debug, warn};

use super::mapping::is_yaml;
use super::{ClassDefinition, ClassNode, Hierarchy, MappingStore, ROOT_CLASS};
use crate::error::ClassError;
use crate::extension::ExtensionRegistry;

/// Loads a class directory into a [`Hierarchy`].
///
/// # Example
///
/// ```no_run
/// use devscope::class::HierarchyLoader;
///
/// # fn example() -> Result<(), devscope::Error> {
/// let hierarchy = HierarchyLoader::new("classes")
///     .mappings("classes/mappings")
///     .load()?;
/// println!("{} device classes", hierarchy.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct HierarchyLoader {
    dir: PathBuf,
    mappings_dir: Option<PathBuf>,
    extensions: Option<ExtensionRegistry>,
}

impl HierarchyLoader {
    /// Load the classes below `dir`; `dir/generic.yaml` is the root.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            mappings_dir: None,
            extensions: None,
        }
    }

    /// Directory of mapping files for `map` modifiers.
    pub fn mappings(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mappings_dir = Some(dir.into());
        self
    }

    /// Use `registry` instead of the global extension registry.
    pub fn extensions(mut self, registry: ExtensionRegistry) -> Self {
        self.extensions = Some(registry);
        self
    }

    pub fn load(&self) -> Result<Hierarchy, ClassError> {
        let mappings = match &self.mappings_dir {
            Some(dir) => MappingStore::load_dir(dir)?,
            None => MappingStore::new(),
        };

        let root_file = self.dir.join(format!("{ROOT_CLASS}.yaml"));
        if !root_file.is_file() {
            return Err(ClassError::invalid(
                ROOT_CLASS,
                format!("missing '{}'", root_file.display()),
            ));
        }
        let mut root = ClassNode::new(read_definition(&root_file)?);
        root.children = self.read_level(&self.dir, Some(&root_file))?;
        let root_dir = self.dir.join(ROOT_CLASS);
        if root_dir.is_dir() {
            root.children.extend(self.read_level(&root_dir, None)?);
        }

        let hierarchy = match &self.extensions {
            Some(registry) => Hierarchy::build(&root, &mappings, registry)?,
            None => {
                let registry = ExtensionRegistry::global()
                    .read()
                    .unwrap_or_else(PoisonError::into_inner);
                Hierarchy::build(&root, &mappings, &registry)?
            }
        };
        debug!(
            "loaded {} device classes from '{}'",
            hierarchy.len(),
            self.dir.display()
        );
        Ok(hierarchy)
    }

    /// Class files of one directory with their children, in name order.
    fn read_level(&self, dir: &Path, skip: Option<&Path>) -> Result<Vec<ClassNode>, ClassError> {
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for path in list_dir(dir)? {
            if Some(path.as_path()) == skip {
                continue;
            }
            if path.is_dir() {
                dirs.push(path);
            } else if is_yaml(&path) {
                files.push(path);
            } else {
                return Err(ClassError::UnexpectedFile(path));
            }
        }

        let mut nodes = Vec::with_capacity(files.len());
        for file in &files {
            let mut node = ClassNode::new(read_definition(file)?);
            let children_dir = file.with_extension("");
            if children_dir.is_dir() {
                node.children = self.read_level(&children_dir, None)?;
            }
            nodes.push(node);
        }

        for dir in dirs {
            let is_class_dir = files.iter().any(|f| f.with_extension("") == dir);
            let is_special = dir == self.dir.join(ROOT_CLASS)
                || self.mappings_dir.as_deref() == Some(dir.as_path());
            if !is_class_dir && !is_special {
                warn!("ignoring directory '{}' without class file", dir.display());
            }
        }
        Ok(nodes)
    }
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, ClassError> {
    let io_error = |source| ClassError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        paths.push(entry.map_err(io_error)?.path());
    }
    paths.sort();
    Ok(paths)
}

fn read_definition(path: &Path) -> Result<ClassDefinition, ClassError> {
    let text = fs::read_to_string(path).map_err(|source| ClassError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| ClassError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
