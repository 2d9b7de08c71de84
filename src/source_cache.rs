//! Build-scoped cache of parsed source units.
//!
//! One [`SourceCache`] is created per specification build and passed by
//! reference to every route build. Lookups take a shared lock and never block
//! each other; [`SourceCache::add`] takes the exclusive lock. Units are never
//! evicted: the cache is dropped together with the build.
//!
//! Function names are indexed per unit when the unit is added. When several
//! units declare the same bare name, lookups return the first unit indexed.

use crate::parser::SourceUnit;
use indexmap::{IndexMap, IndexSet};
use log::debug;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Thread-safe index of parsed source units and the functions they declare.
#[derive(Debug, Default)]
pub struct SourceCache {
    state: RwLock<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    /// Unit key → lowered unit, in insertion order
    units: IndexMap<PathBuf, Arc<SourceUnit>>,
    /// Unit key → bare names of the functions it declares
    functions: IndexMap<PathBuf, IndexSet<String>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unit under `key` and indexes its function names.
    ///
    /// Adding the same key twice keeps the first unit. Returns whether the
    /// unit was newly inserted.
    pub fn add(&self, key: impl Into<PathBuf>, unit: SourceUnit) -> bool {
        let key = key.into();
        let mut state = self.state.write();
        if state.units.contains_key(&key) {
            debug!("Source unit already cached: {}", key.display());
            return false;
        }

        let names: IndexSet<String> = unit.functions.iter().map(|f| f.name.clone()).collect();
        debug!("Caching {} ({} functions)", key.display(), names.len());
        state.functions.insert(key.clone(), names);
        state.units.insert(key, Arc::new(unit));
        true
    }

    /// Returns the first indexed unit declaring a function named `name`.
    pub fn find_function(&self, name: &str) -> Option<Arc<SourceUnit>> {
        let state = self.state.read();
        state
            .functions
            .iter()
            .find(|(_, names)| names.contains(name))
            .and_then(|(key, _)| state.units.get(key).cloned())
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.state
            .read()
            .functions
            .values()
            .any(|names| names.contains(name))
    }

    /// Returns the unit cached under `key`.
    pub fn unit(&self, key: &Path) -> Option<Arc<SourceUnit>> {
        self.state.read().units.get(key).cloned()
    }

    pub fn contains_unit(&self, key: &Path) -> bool {
        self.state.read().units.contains_key(key)
    }

    /// Names of the functions indexed for `key`.
    pub fn function_names(&self, key: &Path) -> Option<IndexSet<String>> {
        self.state.read().functions.get(key).cloned()
    }

    /// Number of cached units
    pub fn len(&self) -> usize {
        self.state.read().units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FunctionDecl;
    use crate::status_scan::StatusInference;
    use std::thread;

    fn unit(path: &str, names: &[&str]) -> SourceUnit {
        SourceUnit {
            path: PathBuf::from(path),
            functions: names
                .iter()
                .map(|name| FunctionDecl {
                    name: name.to_string(),
                    receiver: None,
                    doc: None,
                    status: StatusInference::Unresolved,
                })
                .collect(),
        }
    }

    #[test]
    fn test_add_and_find() {
        let cache = SourceCache::new();
        assert!(cache.is_empty());
        assert!(cache.add("src/users.rs", unit("src/users.rs", &["get_user", "list_users"])));

        assert!(cache.has_function("get_user"));
        assert!(!cache.has_function("delete_user"));
        let found = cache.find_function("list_users").unwrap();
        assert_eq!(found.path, PathBuf::from("src/users.rs"));
        assert!(cache.find_function("missing").is_none());
    }

    #[test]
    fn test_add_is_idempotent() {
        let cache = SourceCache::new();
        assert!(cache.add("src/users.rs", unit("src/users.rs", &["get_user", "get_user"])));
        assert!(!cache.add("src/users.rs", unit("src/users.rs", &["get_user", "other"])));

        assert_eq!(cache.len(), 1);
        let names = cache.function_names(Path::new("src/users.rs")).unwrap();
        assert_eq!(names.len(), 1);
        assert!(!cache.has_function("other"));
    }

    #[test]
    fn test_first_indexed_unit_wins() {
        let cache = SourceCache::new();
        cache.add("src/a.rs", unit("src/a.rs", &["health"]));
        cache.add("src/b.rs", unit("src/b.rs", &["health"]));

        let found = cache.find_function("health").unwrap();
        assert_eq!(found.path, PathBuf::from("src/a.rs"));
    }

    #[test]
    fn test_concurrent_adds_and_reads() {
        let cache = SourceCache::new();

        thread::scope(|scope| {
            for i in 0..8 {
                let cache = &cache;
                scope.spawn(move || {
                    let key = format!("src/unit_{}.rs", i % 4);
                    let name = format!("handler_{}", i % 4);
                    cache.add(key.clone(), unit(&key, &[name.as_str()]));
                    assert!(cache.has_function(&name));
                    assert!(cache.find_function(&name).is_some());
                });
            }
        });

        assert_eq!(cache.len(), 4);
    }
}
