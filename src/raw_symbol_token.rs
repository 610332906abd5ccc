use crate::symbol::Symbol;
use crate::types::SymbolId;

/// A symbol token as it appears in a binary Ion stream: either a symbol ID awaiting resolution
/// or text awaiting interning. A `RawSymbolToken` cannot store both a symbol ID _and_ text,
/// which means that it is not suitable for representing a resolved symbol; see [`Symbol`] for
/// that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSymbolToken {
    SymbolId(SymbolId),
    Text(String),
}

impl RawSymbolToken {
    pub fn matches(&self, sid: SymbolId, text: &str) -> bool {
        match self {
            RawSymbolToken::SymbolId(s) if *s == sid => true,
            RawSymbolToken::Text(t) if t == text => true,
            _ => false,
        }
    }

    pub fn local_sid(&self) -> Option<SymbolId> {
        match self {
            RawSymbolToken::SymbolId(s) => Some(*s),
            RawSymbolToken::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            RawSymbolToken::SymbolId(_) => None,
            RawSymbolToken::Text(t) => Some(t.as_str()),
        }
    }
}

/// A borrowed variant of [`RawSymbolToken`], allowing symbol-accepting writer methods to be
/// called without cloning text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSymbolTokenRef<'a> {
    SymbolId(SymbolId),
    Text(&'a str),
}

/// Types that can be viewed as a [`RawSymbolTokenRef`] without allocating. Writer methods that
/// accept symbol tokens (field names, annotations, symbol values) are generic over this trait,
/// letting callers pass a `&str`, `String`, `SymbolId`, [`Symbol`], or [`RawSymbolToken`].
pub trait AsRawSymbolTokenRef {
    fn as_raw_symbol_token_ref(&self) -> RawSymbolTokenRef<'_>;
}

impl AsRawSymbolTokenRef for SymbolId {
    fn as_raw_symbol_token_ref(&self) -> RawSymbolTokenRef<'_> {
        RawSymbolTokenRef::SymbolId(*self)
    }
}

impl AsRawSymbolTokenRef for String {
    fn as_raw_symbol_token_ref(&self) -> RawSymbolTokenRef<'_> {
        RawSymbolTokenRef::Text(self.as_str())
    }
}

impl AsRawSymbolTokenRef for &str {
    fn as_raw_symbol_token_ref(&self) -> RawSymbolTokenRef<'_> {
        RawSymbolTokenRef::Text(self)
    }
}

impl AsRawSymbolTokenRef for RawSymbolToken {
    fn as_raw_symbol_token_ref(&self) -> RawSymbolTokenRef<'_> {
        match self {
            RawSymbolToken::SymbolId(sid) => RawSymbolTokenRef::SymbolId(*sid),
            RawSymbolToken::Text(text) => RawSymbolTokenRef::Text(text.as_str()),
        }
    }
}

impl AsRawSymbolTokenRef for Symbol {
    fn as_raw_symbol_token_ref(&self) -> RawSymbolTokenRef<'_> {
        match self.text() {
            Some(text) => RawSymbolTokenRef::Text(text),
            // A symbol with unknown text maps to SID `$0`.
            None => RawSymbolTokenRef::SymbolId(0),
        }
    }
}

impl<T> AsRawSymbolTokenRef for &T
where
    T: AsRawSymbolTokenRef,
{
    fn as_raw_symbol_token_ref(&self) -> RawSymbolTokenRef<'_> {
        (*self).as_raw_symbol_token_ref()
    }
}

/// Constructs a [`RawSymbolToken`] with a local symbol ID and no text.
/// A common case when parsing binary Ion.
#[inline]
pub fn local_sid_token(local_sid: SymbolId) -> RawSymbolToken {
    RawSymbolToken::SymbolId(local_sid)
}

/// Constructs a [`RawSymbolToken`] with just text.
#[inline]
pub fn text_token<T: Into<String>>(text: T) -> RawSymbolToken {
    RawSymbolToken::Text(text.into())
}

impl From<SymbolId> for RawSymbolToken {
    fn from(value: SymbolId) -> Self {
        local_sid_token(value)
    }
}

impl From<String> for RawSymbolToken {
    fn from(value: String) -> Self {
        text_token(value)
    }
}

impl From<&str> for RawSymbolToken {
    fn from(value: &str) -> Self {
        text_token(value.to_string())
    }
}
