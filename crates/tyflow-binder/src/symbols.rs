use crate::node::NodeIndex;
use tyflow_common::interner::Atom;

/// Symbol flags.
pub mod symbol_flags {
    pub const NONE: u32 = 0;
    pub const FUNCTION_SCOPED_VARIABLE: u32 = 1 << 0;
    pub const BLOCK_SCOPED_VARIABLE: u32 = 1 << 1;
    pub const PROPERTY: u32 = 1 << 2;
    pub const FUNCTION: u32 = 1 << 4;
    pub const CLASS: u32 = 1 << 5;
    /// `const` declaration (with `BLOCK_SCOPED_VARIABLE`)
    pub const CONST: u32 = 1 << 6;
    pub const PARAMETER: u32 = 1 << 7;
    /// Assigned somewhere the bound nodes do not show, such as a module
    /// that re-exports and reassigns the binding.
    pub const ASSIGNED: u32 = 1 << 8;
    /// `readonly` property, or a `static` member declared `readonly`.
    pub const READONLY: u32 = 1 << 9;
    /// Member of the class constructor rather than of its instances.
    pub const STATIC: u32 = 1 << 10;

    pub const VARIABLE: u32 = FUNCTION_SCOPED_VARIABLE | BLOCK_SCOPED_VARIABLE;
}

/// Unique identifier for a symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub flags: u32,
    pub escaped_name: Atom,
    /// The declaration whose initializer a `const` alias resolves to.
    pub value_declaration: NodeIndex,
    /// Owning class of a member.
    pub parent: SymbolId,
}

impl Symbol {
    #[inline]
    pub fn has_any_flags(&self, flags: u32) -> bool {
        (self.flags & flags) != 0
    }

    #[inline]
    pub fn is_const_variable(&self) -> bool {
        self.has_any_flags(symbol_flags::CONST)
    }

    /// Bindings whose assignments are tracked: parameters and `let`/`var`
    /// variables.
    pub fn is_parameter_or_mutable_local(&self) -> bool {
        self.has_any_flags(symbol_flags::PARAMETER)
            || (self.has_any_flags(symbol_flags::VARIABLE) && !self.is_const_variable())
    }
}

/// Arena of symbols addressed by `SymbolId`.
#[derive(Clone, Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> Self {
        SymbolArena {
            symbols: Vec::new(),
        }
    }

    pub fn alloc(&mut self, flags: u32, escaped_name: Atom) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            flags,
            escaped_name,
            value_declaration: NodeIndex::NONE,
            parent: SymbolId::NONE,
        });
        id
    }

    #[inline]
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        if id.is_none() {
            return None;
        }
        self.symbols.get(id.0 as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        if id.is_none() {
            return None;
        }
        self.symbols.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
