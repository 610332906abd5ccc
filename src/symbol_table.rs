use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::constants::v1_0;
use crate::imports::ResolvedImport;
use crate::result::{illegal_operation, IonResult};
use crate::symbol::Symbol;
use crate::types::SymbolId;

/// The active symbol table of a single Ion stream.
///
/// A `SymbolTable` maps symbol IDs to text (and back) across three layers: the Ion 1.0 system
/// symbols (`$1`-`$9`), the stream's resolved imports, and the symbols appended locally by the
/// stream itself. Symbol IDs are assigned densely and never reused; `$0` is always the symbol
/// with unknown text.
///
/// Tables grow until they are *sealed*, which happens when their contents are serialized into a
/// symbol table struct. A sealed table rejects further interning; writers that need to keep
/// adding symbols start a fresh open generation layered on the sealed one with
/// [`SymbolTable::new_generation`], which preserves every previously assigned symbol ID.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    // The previous, now-immutable generation of this stream's table, if any.
    sealed_ancestor: Option<Arc<SymbolTable>>,
    // The stream's resolved imports. Stored only by the first generation; later generations
    // reach them through `sealed_ancestor`.
    imports: Vec<ResolvedImport>,
    // The highest SID covered by the system symbols and imports. Identical in every generation
    // of one stream's table.
    import_base: usize,
    // The highest SID assigned before this generation was opened.
    generation_base: usize,
    // Symbols appended by this generation, in SID order.
    local_symbols: Vec<Symbol>,
    // Maps known text to the lowest SID that can represent it, across all layers.
    ids_by_text: FxHashMap<Arc<str>, SymbolId>,
    is_sealed: bool,
}

impl SymbolTable {
    /// Constructs a table containing only the system symbols.
    pub fn new() -> SymbolTable {
        SymbolTable::with_imports(Vec::new())
    }

    /// Constructs a table layered over the provided resolved imports. The first
    /// locally-interned symbol will be assigned
    /// `1 + system max_id + sum of each import's max_id`.
    pub fn with_imports(imports: Vec<ResolvedImport>) -> SymbolTable {
        let mut ids_by_text = FxHashMap::default();
        // System symbols claim their text first...
        for (index, text) in v1_0::SYSTEM_SYMBOLS.iter().enumerate() {
            ids_by_text.insert(Arc::from(*text), index + 1);
        }
        // ...then each import in declaration order. Lookups prefer the earliest SID for a
        // given text, so an entry is only added if the text is not yet claimed.
        let mut import_base = v1_0::SYSTEM_MAX_ID;
        for import in &imports {
            for (offset, symbol) in import.table().symbols().iter().enumerate() {
                if let Some(text) = symbol.shared_text() {
                    ids_by_text.entry(text).or_insert(import_base + offset + 1);
                }
            }
            import_base += import.max_id();
        }
        SymbolTable {
            sealed_ancestor: None,
            imports,
            import_base,
            generation_base: import_base,
            local_symbols: Vec::new(),
            ids_by_text,
            is_sealed: false,
        }
    }

    /// Opens a new, growable generation layered on a sealed table. Every SID assigned by the
    /// sealed table (and its own ancestors) remains valid and keeps its meaning.
    pub fn new_generation(sealed: Arc<SymbolTable>) -> SymbolTable {
        assert!(
            sealed.is_sealed(),
            "a new generation can only be layered on a sealed table"
        );
        SymbolTable {
            imports: Vec::new(),
            import_base: sealed.import_base,
            generation_base: sealed.max_id(),
            local_symbols: Vec::new(),
            ids_by_text: sealed.ids_by_text.clone(),
            is_sealed: false,
            sealed_ancestor: Some(sealed),
        }
    }

    /// Returns the SID associated with `text`, interning it if necessary.
    ///
    /// If the text is already known to the system symbols, an import, or a previously interned
    /// local symbol, the existing (lowest) SID is returned and the table is not modified.
    /// Interning a genuinely new symbol fails if the table has been sealed.
    pub fn intern<A: AsRef<str>>(&mut self, text: A) -> IonResult<SymbolId> {
        if let Some(sid) = self.sid_for(&text) {
            return Ok(sid);
        }
        let shared: Arc<str> = Arc::from(text.as_ref());
        self.add_local_symbol(Symbol::shared(Arc::clone(&shared)), Some(shared))
    }

    /// Appends a symbol slot whose text is unknown (for example, a `null` entry in a symbol
    /// table struct's `symbols` list) and returns its SID.
    pub fn add_placeholder(&mut self) -> IonResult<SymbolId> {
        self.add_local_symbol(Symbol::unknown_text(), None)
    }

    /// Appends a new slot for `maybe_text` *unconditionally*, returning the assigned SID.
    ///
    /// This is the behavior required when processing a symbol table struct's `symbols` list:
    /// every entry occupies a slot, even when its text duplicates an earlier symbol. (Lookups
    /// by text still prefer the earliest SID.)
    pub fn add_symbol_or_placeholder(&mut self, maybe_text: Option<String>) -> IonResult<SymbolId> {
        match maybe_text {
            Some(text) => {
                let shared: Arc<str> = Arc::from(text.as_str());
                self.add_local_symbol(Symbol::shared(Arc::clone(&shared)), Some(shared))
            }
            None => self.add_placeholder(),
        }
    }

    fn add_local_symbol(
        &mut self,
        symbol: Symbol,
        text_key: Option<Arc<str>>,
    ) -> IonResult<SymbolId> {
        if self.is_sealed {
            return illegal_operation(
                "cannot add a symbol to a sealed symbol table; start a new generation instead",
            );
        }
        self.local_symbols.push(symbol);
        let sid = self.max_id();
        if let Some(text) = text_key {
            self.ids_by_text.entry(text).or_insert(sid);
        }
        Ok(sid)
    }

    /// If defined, returns the (lowest) symbol ID associated with the provided text.
    pub fn sid_for<A: AsRef<str>>(&self, text: &A) -> Option<SymbolId> {
        self.ids_by_text.get(text.as_ref()).copied()
    }

    /// If defined, returns the text associated with the provided symbol ID.
    pub fn text_for(&self, sid: SymbolId) -> Option<&str> {
        if sid == 0 || sid > self.max_id() {
            return None;
        }
        if sid <= self.generation_base {
            return match &self.sealed_ancestor {
                Some(ancestor) => ancestor.text_for(sid),
                None => self.prefix_text_for(sid),
            };
        }
        self.local_symbols[sid - self.generation_base - 1].text()
    }

    // Looks up text among the system symbols and imports. Only called on the first generation,
    // which owns the imports.
    fn prefix_text_for(&self, sid: SymbolId) -> Option<&str> {
        if sid <= v1_0::SYSTEM_MAX_ID {
            return Some(v1_0::SYSTEM_SYMBOLS[sid - 1]);
        }
        let mut base = v1_0::SYSTEM_MAX_ID;
        for import in &self.imports {
            if sid <= base + import.max_id() {
                return import.symbol_for(sid - base)?.text();
            }
            base += import.max_id();
        }
        None
    }

    /// If the provided symbol ID is in range, returns it as a [`Symbol`] (which will have
    /// unknown text if no reachable table can supply any). Out-of-range SIDs return `None`.
    pub fn symbol_for(&self, sid: SymbolId) -> Option<Symbol> {
        if !self.sid_is_valid(sid) {
            return None;
        }
        match self.text_for(sid) {
            Some(text) => Some(Symbol::shared(Arc::from(text))),
            None => Some(Symbol::unknown_text()),
        }
    }

    /// Returns true if the provided symbol ID is in the range of IDs this table has assigned
    /// (`0..=max_id`). Note that a valid SID can still map to unknown text; this method lets
    /// users distinguish a SID with unknown text from a SID that is out of range entirely.
    pub fn sid_is_valid(&self, sid: SymbolId) -> bool {
        sid <= self.max_id()
    }

    /// The highest symbol ID this table has assigned.
    pub fn max_id(&self) -> usize {
        self.generation_base + self.local_symbols.len()
    }

    /// The highest symbol ID covered by the system symbols and imports; locally-appended
    /// symbols begin at `import_base() + 1`.
    pub fn import_base(&self) -> usize {
        self.import_base
    }

    /// The stream's resolved imports, in declaration order.
    pub fn imports(&self) -> &[ResolvedImport] {
        match &self.sealed_ancestor {
            Some(ancestor) => ancestor.imports(),
            None => &self.imports,
        }
    }

    /// The symbols appended by this generation, in SID order. Symbols appended by sealed
    /// ancestor generations are not included.
    pub fn local_symbols(&self) -> &[Symbol] {
        &self.local_symbols
    }

    /// Marks this table as immutable. Subsequent calls to [`SymbolTable::intern`] that would
    /// add a new symbol will fail; see [`SymbolTable::new_generation`].
    pub fn seal(&mut self) {
        self.is_sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.is_sealed
    }

    /// Returns true if `other` assigns exactly the same meaning to every symbol ID as this
    /// table: the same imports (by name, version, and max_id) in the same order, and the same
    /// local symbol text in the same slots. Tables that satisfy this are interchangeable for
    /// interpreting encoded symbol IDs.
    pub fn has_same_mapping(&self, other: &SymbolTable) -> bool {
        if self.max_id() != other.max_id() || self.import_base != other.import_base {
            return false;
        }
        let my_imports = self.imports();
        let other_imports = other.imports();
        if my_imports.len() != other_imports.len() {
            return false;
        }
        if !my_imports
            .iter()
            .zip(other_imports)
            .all(|(mine, theirs)| mine.declares_same_table(theirs))
        {
            return false;
        }
        // Compare every locally-assigned slot across all generations.
        ((self.import_base + 1)..=self.max_id()).all(|sid| self.text_for(sid) == other.text_for(sid))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}
