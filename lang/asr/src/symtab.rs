use std::collections::BTreeMap;

use crate::SymbolId;

/// The node owning a symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    /// The global scope of the translation unit.
    TranslationUnit,
    /// A scope-owning symbol (program, module, function, derived type or block).
    Symbol(SymbolId),
    /// The root of a fragment that is not attached to the translation unit, e.g. a
    /// freshly deserialized modfile.
    Detached,
}

/// A scope: a mapping from names to symbols plus a link to the enclosing scope.
///
/// Name lookup through the parent chain is provided by [`Asr::resolve`](crate::Asr::resolve)
/// since the parent lives in the same arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    /// Identity of the table, unique within one translation unit.
    pub counter: u64,
    pub parent: Option<crate::SymtabId>,
    pub owner: Owner,
    scope: BTreeMap<String, SymbolId>,
}

impl SymbolTable {
    pub(crate) fn new(counter: u64, parent: Option<crate::SymtabId>) -> SymbolTable {
        SymbolTable { counter, parent, owner: Owner::Detached, scope: BTreeMap::new() }
    }

    /// Look up a name in this table only.
    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.scope.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scope.contains_key(name)
    }

    /// Register `sym` under `name`.
    ///
    /// Returns `false` without changing the table if the name is already taken.
    pub(crate) fn try_insert(&mut self, name: String, sym: SymbolId) -> bool {
        match self.scope.entry(name) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(sym);
                true
            }
        }
    }

    /// Register `sym` under `name`, replacing any previous entry.
    pub fn overwrite(&mut self, name: String, sym: SymbolId) -> Option<SymbolId> {
        self.scope.insert(name, sym)
    }

    pub fn erase(&mut self, name: &str) -> Option<SymbolId> {
        self.scope.remove(name)
    }

    /// The entries of this table, sorted by name.
    pub fn scope(&self) -> impl Iterator<Item = (&str, SymbolId)> + '_ {
        self.scope.iter().map(|(name, sym)| (name.as_str(), *sym))
    }

    pub fn symbols(&self) -> Vec<SymbolId> {
        self.scope.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.scope.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scope.is_empty()
    }
}
