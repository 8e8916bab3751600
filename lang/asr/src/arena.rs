use lasr_lang_miette_util::ToMiette;

use crate::{
    AsrError, AsrResult, Expr, ExprId, ExprKind, HasLocation, Location, Owner, Stmt, StmtId,
    StmtKind, Symbol, SymbolId, SymbolTable, SymtabId,
};

/// A loose top-level entry of a translation unit, outside of any program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    Stmt(StmtId),
    Expr(ExprId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub loc: Location,
    pub global_scope: SymtabId,
    pub items: Vec<Item>,
}

/// The arena holding every node of one translation unit.
///
/// The arena also owns the generator for symbol table counters, so two arenas never
/// interfere with each other.
#[derive(Debug, Clone)]
pub struct Asr {
    symbols: Vec<Symbol>,
    symtabs: Vec<SymbolTable>,
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    next_counter: u64,
    pub unit: TranslationUnit,
}

impl Default for Asr {
    fn default() -> Self {
        Self::new()
    }
}

impl Asr {
    /// Create an arena holding an empty translation unit.
    pub fn new() -> Asr {
        let mut global = SymbolTable::new(1, None);
        global.owner = Owner::TranslationUnit;
        Asr {
            symbols: Vec::new(),
            symtabs: vec![global],
            exprs: Vec::new(),
            stmts: Vec::new(),
            next_counter: 2,
            unit: TranslationUnit {
                loc: Location::initial(),
                global_scope: SymtabId(0),
                items: Vec::new(),
            },
        }
    }

    pub fn global_scope(&self) -> SymtabId {
        self.unit.global_scope
    }

    // Allocation
    //
    //

    /// Allocate a fresh symbol table with the next unused counter.
    pub fn new_symtab(&mut self, parent: Option<SymtabId>) -> SymtabId {
        let counter = self.next_counter;
        self.new_symtab_with_counter(counter, parent)
    }

    /// Allocate a symbol table with a given counter, e.g. one read back from a modfile.
    ///
    /// Later calls to [`Asr::new_symtab`] continue above the largest counter seen. No
    /// uniqueness check happens here; that is the job of the verifier.
    pub fn new_symtab_with_counter(&mut self, counter: u64, parent: Option<SymtabId>) -> SymtabId {
        self.next_counter = self.next_counter.max(counter + 1);
        let id = SymtabId(self.symtabs.len() as u32);
        self.symtabs.push(SymbolTable::new(counter, parent));
        id
    }

    /// Allocate a symbol without registering it in any table.
    ///
    /// If the symbol owns a table, that table's owner is set to the new symbol.
    pub fn alloc_symbol(&mut self, sym: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        if let Some(symtab) = sym.symtab() {
            self.symtabs[symtab.index()].owner = Owner::Symbol(id);
        }
        self.symbols.push(sym);
        id
    }

    /// Allocate a symbol and register it under its own name in `scope`.
    pub fn add_symbol(&mut self, scope: SymtabId, sym: Symbol) -> AsrResult<SymbolId> {
        let name = sym.name().to_owned();
        if self.symtab(scope).contains(&name) {
            return Err(AsrError::DuplicateSymbol { name, span: Some(sym.loc().to_miette()) });
        }
        let id = self.alloc_symbol(sym);
        self.symtab_mut(scope).try_insert(name, id);
        Ok(id)
    }

    /// Register an already allocated symbol under `name` in `scope`.
    pub fn insert_symbol(&mut self, scope: SymtabId, name: &str, sym: SymbolId) -> AsrResult {
        if self.symtab_mut(scope).try_insert(name.to_owned(), sym) {
            Ok(())
        } else {
            Err(AsrError::DuplicateSymbol {
                name: name.to_owned(),
                span: Some(self.symbol(sym).loc().to_miette()),
            })
        }
    }

    pub fn add_expr(&mut self, loc: Location, kind: ExprKind) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr { loc, kind });
        id
    }

    pub fn add_stmt(&mut self, loc: Location, kind: StmtKind) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt { loc, kind });
        id
    }

    // Access
    //
    //

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn symtab(&self, id: SymtabId) -> &SymbolTable {
        &self.symtabs[id.index()]
    }

    pub fn symtab_mut(&mut self, id: SymtabId) -> &mut SymbolTable {
        &mut self.symtabs[id.index()]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.index()]
    }

    /// Checked access, for consumers that must not trust a handle.
    pub fn get_symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn get_symtab(&self, id: SymtabId) -> Option<&SymbolTable> {
        self.symtabs.get(id.index())
    }

    /// The counter the next call to [`Asr::new_symtab`] will assign.
    pub fn next_counter(&self) -> u64 {
        self.next_counter
    }

    // Lookup
    //
    //

    /// Look up `name` in `scope` and then in each enclosing scope.
    pub fn lookup(&self, scope: SymtabId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(symtab) = current {
            let table = self.symtab(symtab);
            if let Some(sym) = table.get(name) {
                return Some(sym);
            }
            current = table.parent;
        }
        None
    }

    /// Like [`Asr::lookup`] but fails with `NotFound`.
    pub fn resolve(&self, scope: SymtabId, name: &str) -> AsrResult<SymbolId> {
        self.lookup(scope, name)
            .ok_or_else(|| AsrError::NotFound { name: name.to_owned(), span: None })
    }

    /// Resolve `name` after descending from `scope` through the tables owned by the
    /// symbols named in `scope_names`, outermost first.
    pub fn find_scoped(
        &self,
        scope: SymtabId,
        name: &str,
        scope_names: &[String],
    ) -> AsrResult<SymbolId> {
        let unresolved = || AsrError::UnresolvedExternal {
            name: name.to_owned(),
            path: scope_names.join("::"),
            span: None,
        };
        let mut current = scope;
        for segment in scope_names {
            let owner = self.symtab(current).get(segment).ok_or_else(unresolved)?;
            current = self.symbol(owner).symtab().ok_or_else(unresolved)?;
        }
        self.symtab(current).get(name).ok_or_else(unresolved)
    }

    /// A name starting with `prefix` that is not yet taken in `scope`.
    ///
    /// Returns `prefix` itself when it is free, otherwise `prefix_1`, `prefix_2`, ...
    pub fn get_unique_name(&self, scope: SymtabId, prefix: &str) -> String {
        let table = self.symtab(scope);
        if !table.contains(prefix) {
            return prefix.to_owned();
        }
        (1..)
            .map(|n| format!("{prefix}_{n}"))
            .find(|candidate| !table.contains(candidate))
            .unwrap_or_default()
    }

    /// Whether `outer` is `inner` or one of its ancestors.
    pub fn symtab_encloses(&self, outer: SymtabId, inner: SymtabId) -> bool {
        let mut current = Some(inner);
        while let Some(symtab) = current {
            if symtab == outer {
                return true;
            }
            current = self.symtab(symtab).parent;
        }
        false
    }

    /// The table a symbol is registered in.
    pub fn parent_symtab(&self, sym: SymbolId) -> Option<SymtabId> {
        let symbol = self.symbol(sym);
        match symbol.symtab() {
            Some(own) => self.symtab(own).parent,
            None => symbol.stored_parent_symtab(),
        }
    }

    /// Move the symbol registered as `name` from `from` into `to`, updating the back
    /// links of the symbol (or of its own table).
    pub fn move_symbol(&mut self, from: SymtabId, to: SymtabId, name: &str) -> AsrResult<SymbolId> {
        let sym = self
            .symtab(from)
            .get(name)
            .ok_or_else(|| AsrError::NotFound { name: name.to_owned(), span: None })?;
        self.insert_symbol(to, name, sym)?;
        self.symtab_mut(from).erase(name);
        self.reparent(sym, to);
        Ok(sym)
    }

    /// Point the back link of `sym` at `parent` without touching any table's entries.
    pub fn reparent(&mut self, sym: SymbolId, parent: SymtabId) {
        match self.symbol(sym).symtab() {
            Some(own) => self.symtab_mut(own).parent = Some(parent),
            None => self.symbol_mut(sym).set_stored_parent_symtab(parent),
        }
    }

    /// All symbols reachable from `scope` through nested tables, parents before
    /// children, each table's entries in name order.
    pub fn symbols_in(&self, scope: SymtabId) -> Vec<SymbolId> {
        let mut out = Vec::new();
        let mut stack = vec![scope];
        while let Some(symtab) = stack.pop() {
            let mut nested = Vec::new();
            for (_, sym) in self.symtab(symtab).scope() {
                out.push(sym);
                if let Some(own) = self.symbol(sym).symtab() {
                    // Skip tables owned by symbols registered elsewhere, e.g. an
                    // ExternalSymbol's target would have been reached through its module.
                    if self.symtab(own).parent == Some(symtab) {
                        nested.push(own);
                    }
                }
            }
            stack.extend(nested.into_iter().rev());
        }
        out
    }
}
