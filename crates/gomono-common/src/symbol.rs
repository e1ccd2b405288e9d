//! Interned identifiers.

use std::fmt;

use string_interner::{backend::StringBackend, DefaultSymbol, StringInterner};

/// An interned string. Comparing two symbols is a `u32` comparison; the text
/// lives in the [`SymbolInterner`] that produced it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Option<DefaultSymbol>);

impl Symbol {
    /// Placeholder symbol for synthesized or missing names.
    pub const DUMMY: Symbol = Symbol(None);

    #[inline]
    pub const fn is_dummy(self) -> bool {
        self.0.is_none()
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        use string_interner::Symbol as _;
        self.0.map(|s| s.to_usize() as u32).unwrap_or(u32::MAX)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dummy() {
            write!(f, "Symbol(DUMMY)")
        } else {
            write!(f, "Symbol({})", self.as_u32())
        }
    }
}

/// Registry of every identifier seen by a session.
///
/// Synthesized instantiation names are interned here too, so the printer
/// downstream never needs a second name table.
#[derive(Clone)]
pub struct SymbolInterner {
    interner: StringInterner<StringBackend<DefaultSymbol>>,
}

impl SymbolInterner {
    /// Creates an interner with the predeclared names already present.
    pub fn new() -> Self {
        let mut interner = Self {
            interner: StringInterner::new(),
        };
        for name in predeclared::ALL_TYPES
            .iter()
            .chain(predeclared::ALL_FUNCS)
            .chain(predeclared::ALL_VALUES)
        {
            interner.intern_static(name);
        }
        interner
    }

    #[inline]
    pub fn intern(&mut self, string: &str) -> Symbol {
        Symbol(Some(self.interner.get_or_intern(string)))
    }

    #[inline]
    pub fn intern_static(&mut self, string: &'static str) -> Symbol {
        Symbol(Some(self.interner.get_or_intern_static(string)))
    }

    /// Looks up a string without interning it.
    #[inline]
    pub fn get(&self, string: &str) -> Option<Symbol> {
        self.interner.get(string).map(|s| Symbol(Some(s)))
    }

    /// Returns `None` for [`Symbol::DUMMY`] and foreign symbols.
    #[inline]
    pub fn resolve(&self, symbol: Symbol) -> Option<&str> {
        symbol.0.and_then(|s| self.interner.resolve(s))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.interner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.interner.is_empty()
    }
}

impl Default for SymbolInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SymbolInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolInterner")
            .field("len", &self.interner.len())
            .finish()
    }
}

/// Names declared in the universe scope.
pub mod predeclared {
    macro_rules! define_names {
        ($all:ident { $($name:ident => $string:literal),* $(,)? }) => {
            $(
                pub const $name: &str = $string;
            )*

            pub const $all: &[&str] = &[$($string),*];
        };
    }

    define_names!(ALL_TYPES {
        BOOL => "bool",
        STRING => "string",
        INT => "int",
        INT8 => "int8",
        INT16 => "int16",
        INT32 => "int32",
        INT64 => "int64",
        UINT => "uint",
        UINT8 => "uint8",
        UINT16 => "uint16",
        UINT32 => "uint32",
        UINT64 => "uint64",
        UINTPTR => "uintptr",
        FLOAT32 => "float32",
        FLOAT64 => "float64",
        BYTE => "byte",
        RUNE => "rune",
        ERROR => "error",
        COMPARABLE => "comparable",
        ANY => "any",
    });

    define_names!(ALL_FUNCS {
        APPEND => "append",
        CAP => "cap",
        CLOSE => "close",
        COPY => "copy",
        DELETE => "delete",
        LEN => "len",
        MAKE => "make",
        NEW => "new",
        PANIC => "panic",
        PRINT => "print",
        PRINTLN => "println",
    });

    define_names!(ALL_VALUES {
        TRUE => "true",
        FALSE => "false",
        NIL => "nil",
        BLANK => "_",
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedups() {
        let mut interner = SymbolInterner::new();
        let a = interner.intern("Pair");
        let b = interner.intern("Pair");
        let c = interner.intern("List");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), Some("Pair"));
    }

    #[test]
    fn test_predeclared_are_interned() {
        let interner = SymbolInterner::new();
        for name in predeclared::ALL_TYPES {
            assert!(interner.get(name).is_some(), "{} not interned", name);
        }
        assert!(interner.get(predeclared::COMPARABLE).is_some());
        assert!(interner.get("not_predeclared").is_none());
    }

    #[test]
    fn test_dummy_symbol() {
        let interner = SymbolInterner::new();
        assert!(Symbol::DUMMY.is_dummy());
        assert_eq!(interner.resolve(Symbol::DUMMY), None);
        assert_eq!(Symbol::DUMMY.as_u32(), u32::MAX);
    }
}
