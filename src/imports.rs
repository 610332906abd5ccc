//! Resolution of the `imports` declared by a local symbol table against a [`Catalog`].

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::result::{unresolvable_import, IonResult};
use crate::shared_symbol_table::SharedSymbolTable;
use crate::symbol::Symbol;

/// An entry of a local symbol table's `imports` list, exactly as it appears on the wire:
/// `{name: "...", version: 2, max_id: 5}`.
///
/// The declared `max_id` is authoritative for symbol ID allocation even when it disagrees with
/// the size of the table the catalog actually holds; it may also be absent, in which case an
/// exact catalog match is required to supply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDescriptor {
    name: String,
    version: usize,
    max_id: Option<usize>,
}

impl ImportDescriptor {
    pub fn new<S: Into<String>>(name: S, version: usize, max_id: Option<usize>) -> Self {
        ImportDescriptor {
            name: name.into(),
            version: version.max(1),
            max_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> usize {
        self.version
    }

    pub fn max_id(&self) -> Option<usize> {
        self.max_id
    }
}

/// The outcome of resolving one [`ImportDescriptor`] against a catalog: a table to draw symbol
/// text from and the width of the symbol ID range the import occupies.
///
/// When the catalog could not supply the exact table the descriptor named, `table` is a
/// synthesized *substitute*: it behaves like the declared table, padding any position the
/// backing table cannot fill with unknown text, and `is_substitute` is true.
#[derive(Debug, Clone)]
pub struct ResolvedImport {
    descriptor: ImportDescriptor,
    table: Arc<SharedSymbolTable>,
    is_substitute: bool,
}

impl ResolvedImport {
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn version(&self) -> usize {
        self.descriptor.version()
    }

    /// The number of symbol IDs this import occupies in the local table.
    pub fn max_id(&self) -> usize {
        self.table.max_id()
    }

    /// The table this import resolved to. If `is_substitute` is true, this is a synthesized
    /// stand-in rather than the table the descriptor declared.
    pub fn table(&self) -> &Arc<SharedSymbolTable> {
        &self.table
    }

    pub fn is_substitute(&self) -> bool {
        self.is_substitute
    }

    /// Returns the symbol at the given 1-based position within this import's SID range.
    pub fn symbol_for(&self, position: usize) -> Option<&Symbol> {
        self.table.symbol_for(position)
    }

    /// Returns true if `other` declares the same (name, version, max_id) triple.
    pub(crate) fn declares_same_table(&self, other: &ResolvedImport) -> bool {
        self.name() == other.name()
            && self.version() == other.version()
            && self.max_id() == other.max_id()
    }
}

/// Resolves an import declaration against the provided catalog, synthesizing a substitute
/// table when an exact match is unavailable.
///
/// The fallback ladder, in order of preference:
/// 1. The catalog holds `(name, version)` and its `max_id` agrees with the declaration (or the
///    declaration omitted `max_id`): the table is used as-is.
/// 2. The catalog holds `(name, version)` but its size disagrees: a substitute clamps or pads
///    it to the declared `max_id`.
/// 3. The catalog holds some other version of `name`: a substitute wraps the highest registered
///    version.
/// 4. The catalog holds nothing under `name`: a substitute with `max_id` slots of unknown text.
///
/// Resolution fails with [`UnresolvableImport`](crate::IonError::UnresolvableImport) when the
/// declared name is empty or when no exact match exists and the declaration did not provide
/// the `max_id` needed to size a substitute.
pub fn resolve_import(
    catalog: &dyn Catalog,
    descriptor: &ImportDescriptor,
) -> IonResult<ResolvedImport> {
    if descriptor.name().is_empty() {
        return unresolvable_import("the declared table name is empty");
    }

    if let Some(exact) = catalog.get_table_with_version(descriptor.name(), descriptor.version()) {
        return match descriptor.max_id() {
            None => Ok(ResolvedImport {
                descriptor: ImportDescriptor::new(
                    descriptor.name(),
                    descriptor.version(),
                    Some(exact.max_id()),
                ),
                table: exact,
                is_substitute: false,
            }),
            Some(declared_max_id) if declared_max_id == exact.max_id() => Ok(ResolvedImport {
                descriptor: descriptor.clone(),
                table: exact,
                is_substitute: false,
            }),
            Some(declared_max_id) => Ok(substitute(descriptor, declared_max_id, Some(exact.as_ref()))),
        };
    }

    // No exact match. A substitute can only be synthesized if the declaration told us how many
    // symbol IDs it occupies.
    let declared_max_id = match descriptor.max_id() {
        Some(declared_max_id) => declared_max_id,
        None => {
            return unresolvable_import(format!(
                "table '{}' version {} is not in the catalog and the declaration has no max_id",
                descriptor.name(),
                descriptor.version()
            ));
        }
    };

    let best_available = catalog.get_table(descriptor.name());
    Ok(substitute(
        descriptor,
        declared_max_id,
        best_available.as_deref(),
    ))
}

// Uniformly synthesizes a substitute: positions the backing table can fill keep their text,
// positions beyond it (or all positions, with no backing table) get unknown text, and positions
// past the declared max_id are clamped away.
fn substitute(
    descriptor: &ImportDescriptor,
    declared_max_id: usize,
    backing: Option<&SharedSymbolTable>,
) -> ResolvedImport {
    let symbols: Vec<Symbol> = (1..=declared_max_id)
        .map(|position| {
            backing
                .and_then(|table| table.symbol_for(position))
                .cloned()
                .unwrap_or_else(Symbol::unknown_text)
        })
        .collect();
    let table = SharedSymbolTable::new(descriptor.name(), descriptor.version(), symbols)
        .expect("descriptor name was checked to be non-empty");
    ResolvedImport {
        descriptor: ImportDescriptor::new(
            descriptor.name(),
            descriptor.version(),
            Some(declared_max_id),
        ),
        table: Arc::new(table),
        is_substitute: true,
    }
}
