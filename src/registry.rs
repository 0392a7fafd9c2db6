//! # Named extension registries.
//!
//! The engine resolves serializers, swaps, retry policies, confirm handlers
//! and hooks by name. Each kind gets its own [`Registry`]. Registration of
//! an already-taken name is rejected; replacing an entry is a deliberate
//! act through `register_override`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::EngineError;

/// Name-keyed store of shared extension values.
pub struct Registry<T: ?Sized> {
    entries: RwLock<HashMap<String, Arc<T>>>,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: ?Sized> Registry<T> {
    /// Registers `value` under `name`. Duplicate names are a config error.
    pub fn register(&self, name: &str, value: Arc<T>) -> Result<(), EngineError> {
        let mut entries = self.entries.write().expect("registry lock");
        if entries.contains_key(name) {
            return Err(EngineError::config(format!(
                "name '{name}' is already registered"
            )));
        }
        entries.insert(name.to_string(), value);
        Ok(())
    }

    /// Registers `value` under `name`, replacing any existing entry.
    pub fn register_override(&self, name: &str, value: Arc<T>) {
        self.entries
            .write()
            .expect("registry lock")
            .insert(name.to_string(), value);
    }

    /// Looks up an entry by name.
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries.read().expect("registry lock").get(name).cloned()
    }

    /// True when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .expect("registry lock")
            .contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_registration_rejected() {
        let reg: Registry<String> = Registry::default();
        reg.register("a", Arc::new("one".to_string())).unwrap();
        assert!(reg.register("a", Arc::new("two".to_string())).is_err());
        assert_eq!(*reg.get("a").unwrap(), "one");
    }

    #[test]
    fn test_override_replaces() {
        let reg: Registry<String> = Registry::default();
        reg.register("a", Arc::new("one".to_string())).unwrap();
        reg.register_override("a", Arc::new("two".to_string()));
        assert_eq!(*reg.get("a").unwrap(), "two");
        assert!(reg.get("missing").is_none());
    }
}
