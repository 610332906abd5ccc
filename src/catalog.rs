use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::shared_symbol_table::SharedSymbolTable;

/// A collection of shared symbol tables, consulted when resolving the `imports` of a local
/// symbol table.
///
/// Catalogs hand out [`Arc`] references to their tables, so removing an entry from a catalog
/// never invalidates a stream that already resolved an import against it.
///
/// Implementations of this trait are not required to be internally synchronized; callers that
/// share one catalog across threads must wrap it in a lock.
pub trait Catalog {
    /// Returns the highest registered version of the shared symbol table with the given name,
    /// or `None` if no table is registered under that name (or the name is the empty string).
    fn get_table(&self, name: &str) -> Option<Arc<SharedSymbolTable>>;

    /// Returns the shared symbol table with the given name and version, or `None` if that
    /// exact version is not registered.
    fn get_table_with_version(&self, name: &str, version: usize) -> Option<Arc<SharedSymbolTable>>;
}

/// A [`Catalog`] backed by an in-memory map. Tables may be added and removed at any time.
#[derive(Debug, Default)]
pub struct MapCatalog {
    tables_by_name: HashMap<String, BTreeMap<usize, Arc<SharedSymbolTable>>>,
}

impl MapCatalog {
    pub fn new() -> Self {
        Self {
            tables_by_name: HashMap::new(),
        }
    }

    /// Adds a shared symbol table to the catalog, replacing any existing table with the same
    /// name and version.
    pub fn insert_table(&mut self, table: SharedSymbolTable) {
        self.insert_shared_table(Arc::new(table))
    }

    /// Adds an already-shared symbol table to the catalog.
    pub fn insert_shared_table(&mut self, table: Arc<SharedSymbolTable>) {
        let versions = self
            .tables_by_name
            .entry(table.name().to_owned())
            .or_default();
        versions.insert(table.version(), table);
    }

    /// Removes the table with the given name and version, returning it if it was present.
    /// Streams that already resolved imports against the removed table keep their references.
    pub fn remove_table(&mut self, name: &str, version: usize) -> Option<Arc<SharedSymbolTable>> {
        let versions = self.tables_by_name.get_mut(name)?;
        let removed = versions.remove(&version);
        if versions.is_empty() {
            self.tables_by_name.remove(name);
        }
        removed
    }
}

impl Catalog for MapCatalog {
    fn get_table(&self, name: &str) -> Option<Arc<SharedSymbolTable>> {
        if name.is_empty() {
            return None;
        }
        let versions = self.tables_by_name.get(name)?;
        let (_highest_version, table) = versions.iter().next_back()?;
        Some(Arc::clone(table))
    }

    fn get_table_with_version(&self, name: &str, version: usize) -> Option<Arc<SharedSymbolTable>> {
        if name.is_empty() {
            return None;
        }
        self.tables_by_name.get(name)?.get(&version).map(Arc::clone)
    }
}

/// A [`Catalog`] with no tables in it. Every import resolved against this catalog produces a
/// substitute table.
#[derive(Debug, Clone, Default)]
pub struct EmptyCatalog;

impl Catalog for EmptyCatalog {
    fn get_table(&self, _name: &str) -> Option<Arc<SharedSymbolTable>> {
        None
    }

    fn get_table_with_version(
        &self,
        _name: &str,
        _version: usize,
    ) -> Option<Arc<SharedSymbolTable>> {
        None
    }
}

#[cfg(test)]
mod catalog_tests {
    use super::*;
    use crate::symbol::Symbol;
    use crate::IonResult;

    fn table_named_t(version: usize) -> SharedSymbolTable {
        SharedSymbolTable::new(
            "T",
            version,
            vec![Symbol::owned("true"), Symbol::owned("false")],
        )
        .unwrap()
    }

    #[test]
    fn get_table_by_name() -> IonResult<()> {
        let mut catalog = MapCatalog::new();
        catalog.insert_table(table_named_t(1));
        assert!(catalog.get_table("T").is_some());
        assert!(catalog.get_table("S").is_none());
        assert!(catalog.get_table("").is_none());
        Ok(())
    }

    #[test]
    fn get_table_by_name_returns_highest_version() -> IonResult<()> {
        let mut catalog = MapCatalog::new();
        catalog.insert_table(table_named_t(2));
        catalog.insert_table(table_named_t(5));
        catalog.insert_table(table_named_t(3));
        assert_eq!(catalog.get_table("T").unwrap().version(), 5);
        Ok(())
    }

    #[test]
    fn get_table_with_version() -> IonResult<()> {
        let mut catalog = MapCatalog::new();
        catalog.insert_table(table_named_t(1));
        assert!(catalog.get_table_with_version("T", 1).is_some());
        assert!(catalog.get_table_with_version("T", 2).is_none());
        Ok(())
    }

    #[test]
    fn removal_does_not_invalidate_held_references() -> IonResult<()> {
        let mut catalog = MapCatalog::new();
        catalog.insert_table(table_named_t(1));
        let held = catalog.get_table("T").unwrap();
        assert!(catalog.remove_table("T", 1).is_some());
        assert!(catalog.get_table("T").is_none());
        // The resolved reference is still fully usable.
        assert_eq!(held.text_for(1), Some("true"));
        Ok(())
    }
}
