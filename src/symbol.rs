use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::result::{decoding_error_raw, IonResult};

/// Stores or points to the text of a given [Symbol].
#[derive(Debug, Eq)]
enum SymbolText {
    // This Symbol shares its text with a symbol table
    Shared(Arc<str>),
    // This Symbol owns its own text
    Owned(String),
    // This Symbol maps to a slot with no text (a null or non-string entry in a symbol table,
    // an import slot the catalog could not supply, or SID `$0`)
    Unknown,
}

impl SymbolText {
    fn text(&self) -> Option<&str> {
        match self {
            SymbolText::Shared(text) => Some(text.as_ref()),
            SymbolText::Owned(text) => Some(text.as_str()),
            SymbolText::Unknown => None,
        }
    }
}

impl Clone for SymbolText {
    fn clone(&self) -> Self {
        match self {
            SymbolText::Owned(text) => SymbolText::Owned(text.to_owned()),
            SymbolText::Shared(text) => SymbolText::Shared(Arc::clone(text)),
            SymbolText::Unknown => SymbolText::Unknown,
        }
    }
}

impl PartialEq for SymbolText {
    fn eq(&self, other: &Self) -> bool {
        // Compare the Symbols' text, not their ownership models
        self.text() == other.text()
    }
}

impl Hash for SymbolText {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the Symbol's text, ignoring where and how it's stored
        self.text().hash(state)
    }
}

impl PartialOrd for SymbolText {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SymbolText {
    fn cmp(&self, other: &Self) -> Ordering {
        // Symbols with unknown text sort before any known text
        self.text().cmp(&other.text())
    }
}

/// The text of a fully resolved field name, annotation, or symbol value.
///
/// The text stored in a `Symbol` may be a `String`, a shared reference to text in a symbol
/// table, or absent altogether. Unknown text is not an error: a symbol ID can be perfectly
/// valid while referring to a slot whose text no reachable table can supply.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    text: SymbolText,
}

impl Symbol {
    pub fn owned<T: Into<String>>(text: T) -> Symbol {
        Symbol {
            text: SymbolText::Owned(text.into()),
        }
    }

    pub fn shared(text: Arc<str>) -> Symbol {
        Symbol {
            text: SymbolText::Shared(text),
        }
    }

    /// Constructs a Symbol whose text is genuinely absent from every reachable symbol table.
    pub fn unknown_text() -> Symbol {
        Symbol {
            text: SymbolText::Unknown,
        }
    }

    /// Returns this Symbol's text, or `None` if its text is unknown.
    pub fn text(&self) -> Option<&str> {
        self.text.text()
    }

    /// Returns this Symbol's text, raising a [`Decoding`](crate::IonError::Decoding) error if
    /// the text is unknown.
    pub fn expect_text(&self) -> IonResult<&str> {
        self.text()
            .ok_or_else(|| decoding_error_raw("symbol has unknown text"))
    }

    pub(crate) fn shared_text(&self) -> Option<Arc<str>> {
        match &self.text {
            SymbolText::Shared(text) => Some(Arc::clone(text)),
            SymbolText::Owned(text) => Some(Arc::from(text.as_str())),
            SymbolText::Unknown => None,
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.text() {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "$0"),
        }
    }
}

impl<A: AsRef<str>> PartialEq<A> for Symbol {
    fn eq(&self, other: &A) -> bool {
        self.text() == Some(other.as_ref())
    }
}

impl PartialEq<Symbol> for &str {
    fn eq(&self, other: &Symbol) -> bool {
        other.text() == Some(*self)
    }
}

impl From<&str> for Symbol {
    fn from(text: &str) -> Self {
        Symbol::owned(text)
    }
}

impl From<String> for Symbol {
    fn from(text: String) -> Self {
        Symbol::owned(text)
    }
}

impl From<Option<String>> for Symbol {
    fn from(text: Option<String>) -> Self {
        match text {
            Some(text) => Symbol::owned(text),
            None => Symbol::unknown_text(),
        }
    }
}

#[cfg(test)]
mod symbol_tests {
    use super::*;

    #[test]
    fn text_comparison_ignores_ownership() {
        let owned = Symbol::owned("foo");
        let shared = Symbol::shared(Arc::from("foo"));
        assert_eq!(owned, shared);
        assert_eq!(owned, "foo");
        assert_ne!(owned, Symbol::unknown_text());
    }

    #[test]
    fn unknown_text_sorts_first() {
        let mut symbols = vec![
            Symbol::owned("bar"),
            Symbol::unknown_text(),
            Symbol::owned("foo"),
        ];
        symbols.sort();
        assert_eq!(symbols[0], Symbol::unknown_text());
        assert_eq!(symbols[1], "bar");
        assert_eq!(symbols[2], "foo");
    }

    #[test]
    fn expect_text_raises_on_unknown() {
        assert!(Symbol::owned("foo").expect_text().is_ok());
        assert!(Symbol::unknown_text().expect_text().is_err());
    }
}
