//! Global registry mapping class names to code extensions.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use super::CodeExtension;
use super::vendors;
use crate::error::{ClassError, Result};

/// Global extension registry.
static REGISTRY: Lazy<RwLock<ExtensionRegistry>> = Lazy::new(|| {
    let mut registry = ExtensionRegistry::new();
    registry.register_builtin_extensions();
    RwLock::new(registry)
});

/// Code extensions by full class name.
#[derive(Default, Clone)]
pub struct ExtensionRegistry {
    extensions: HashMap<String, Arc<dyn CodeExtension>>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.extensions.keys().collect();
        names.sort();
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &names)
            .finish()
    }
}

impl ExtensionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            extensions: HashMap::new(),
        }
    }

    /// A registry holding the built-in vendor extensions.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_extensions();
        registry
    }

    /// Get the global registry.
    pub fn global() -> &'static RwLock<ExtensionRegistry> {
        &REGISTRY
    }

    fn register_builtin_extensions(&mut self) {
        self.extensions
            .insert("adva/fsp3kr7".to_string(), Arc::new(vendors::adva::Fsp3kR7));
        self.extensions
            .insert("ekinops".to_string(), Arc::new(vendors::ekinops::Ekinops));
        self.extensions
            .insert("ceraos/ip10".to_string(), Arc::new(vendors::ceraos::Ip10));
        self.extensions
            .insert("timos".to_string(), Arc::new(vendors::timos::Timos));
    }

    /// Register an extension for the class with full name `class`.
    pub fn register(
        &mut self,
        class: impl Into<String>,
        extension: Arc<dyn CodeExtension>,
    ) -> Result<()> {
        let class = class.into();
        if self.extensions.contains_key(&class) {
            return Err(ClassError::ExtensionAlreadyRegistered { name: class }.into());
        }
        self.extensions.insert(class, extension);
        Ok(())
    }

    /// Get the extension of a class.
    pub fn get(&self, class: &str) -> Option<Arc<dyn CodeExtension>> {
        self.extensions.get(class).cloned()
    }

    /// Check if a class has an extension.
    pub fn contains(&self, class: &str) -> bool {
        self.extensions.contains_key(class)
    }

    /// List all class names with an extension.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.extensions.keys()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::PoisonError;

    use super::*;
    use crate::error::Error;

    struct Marker;

    #[async_trait::async_trait]
    impl CodeExtension for Marker {
        fn name(&self) -> &str {
            "marker"
        }
    }

    #[test]
    fn test_builtin_extensions() {
        let registry = ExtensionRegistry::global()
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for class in ["adva/fsp3kr7", "ekinops", "ceraos/ip10", "timos"] {
            assert!(registry.contains(class), "missing {class}");
        }
        assert!(registry.get("routerOS").is_none());
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = ExtensionRegistry::new();
        registry.register("acme", Arc::new(Marker)).unwrap();
        assert_eq!(registry.get("acme").map(|e| e.name().to_string()).as_deref(), Some("marker"));
        assert!(matches!(
            registry.register("acme", Arc::new(Marker)),
            Err(Error::Class(ClassError::ExtensionAlreadyRegistered { .. }))
        ));
        assert_eq!(registry.names().count(), 1);
    }
}
