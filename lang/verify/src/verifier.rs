use lasr_lang_asr::{
    Asr, ExprId, ExprKind, HasLocation, HashMap, Item, Location, Owner, StmtId, StmtKind, Symbol,
    SymbolId, SymtabId, Ttype,
};
use lasr_lang_miette_util::ToMiette;

use crate::result::{VerifyError, VerifyResult};

/// Check every structural invariant of the translation unit held by `asr`.
///
/// With `check_external`, external symbols must be linked to their targets; without it
/// they are not inspected, which is what a pipeline stage before linking needs.
/// Verification stops at the first violation.
pub fn verify(asr: &Asr, check_external: bool) -> VerifyResult {
    log::debug!("Verifying ASR (check_external = {check_external})");
    let mut verifier = Verifier { asr, check_external, current: None, counters: HashMap::default() };
    verifier.unit()
}

struct Verifier<'a> {
    asr: &'a Asr,
    check_external: bool,
    /// The innermost scope entered so far.
    current: Option<SymtabId>,
    /// Every table entered so far, by counter.
    counters: HashMap<u64, SymtabId>,
}

fn span(loc: Location) -> Option<miette::SourceSpan> {
    Some(loc.to_miette())
}

/// Dependency names are plain identifiers.
fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl<'a> Verifier<'a> {
    fn name(&self, sym: SymbolId) -> String {
        self.asr.symbol(sym).name().to_owned()
    }

    fn symbol_span(&self, sym: SymbolId) -> Option<miette::SourceSpan> {
        span(self.asr.symbol(sym).loc())
    }

    // Scopes
    //
    //

    fn unit(&mut self) -> VerifyResult {
        let global = self.asr.global_scope();
        let Some(table) = self.asr.get_symtab(global) else {
            return Err(VerifyError::DanglingSymtab { owner: "translation unit".to_owned(), span: None });
        };
        if let Some(parent) = table.parent {
            return Err(VerifyError::WrongParent {
                owner: "translation unit".to_owned(),
                expected: None,
                found: self.asr.get_symtab(parent).map(|t| t.counter),
                span: span(self.asr.unit.loc),
            });
        }
        if table.owner != Owner::TranslationUnit {
            return Err(VerifyError::WrongOwner {
                owner: "translation unit".to_owned(),
                span: span(self.asr.unit.loc),
            });
        }
        self.counters.insert(table.counter, global);
        self.current = Some(global);
        self.scope_symbols(global)?;
        for item in &self.asr.unit.items {
            match item {
                Item::Stmt(stmt) => self.stmt(*stmt)?,
                Item::Expr(expr) => self.expr(*expr)?,
            }
        }
        Ok(())
    }

    /// Run `body` inside the table owned by `owner` after checking how the table is wired.
    fn with_scope<F>(&mut self, owner: SymbolId, symtab: SymtabId, body: F) -> VerifyResult
    where
        F: FnOnce(&mut Self) -> VerifyResult,
    {
        let Some(table) = self.asr.get_symtab(symtab) else {
            return Err(VerifyError::DanglingSymtab {
                owner: self.name(owner),
                span: self.symbol_span(owner),
            });
        };
        if table.parent != self.current {
            let counter_of = |t: Option<SymtabId>| t.and_then(|t| self.asr.get_symtab(t)).map(|t| t.counter);
            return Err(VerifyError::WrongParent {
                owner: self.name(owner),
                expected: counter_of(self.current),
                found: counter_of(table.parent),
                span: self.symbol_span(owner),
            });
        }
        if self.counters.contains_key(&table.counter) {
            return Err(VerifyError::DuplicateCounter {
                owner: self.name(owner),
                counter: table.counter,
                span: self.symbol_span(owner),
            });
        }
        if table.owner != Owner::Symbol(owner) {
            return Err(VerifyError::WrongOwner {
                owner: self.name(owner),
                span: self.symbol_span(owner),
            });
        }
        self.counters.insert(table.counter, symtab);

        let saved = self.current.replace(symtab);
        let result = self.scope_symbols(symtab).and_then(|()| body(self));
        self.current = saved;
        result
    }

    fn scope_symbols(&mut self, symtab: SymtabId) -> VerifyResult {
        let asr = self.asr;
        asr.symtab(symtab).scope().try_for_each(|(_, sym)| self.symbol(sym))
    }

    /// Whether `sym` is registered in `symtab` or one of its ancestors, under its own
    /// name and as that very symbol.
    fn symtab_in_scope(&self, symtab: SymtabId, sym: SymbolId) -> bool {
        let Some(owning) = self.asr.parent_symtab(sym) else {
            return false;
        };
        let name = self.asr.symbol(sym).name();
        let mut current = Some(symtab);
        while let Some(s) = current {
            let table = self.asr.symtab(s);
            if s == owning {
                return table.get(name) == Some(sym);
            }
            current = table.parent;
        }
        false
    }

    fn in_current_scope(&self, sym: SymbolId) -> bool {
        self.current.is_some_and(|current| self.symtab_in_scope(current, sym))
    }

    fn require_in_scope(&self, node: &'static str, sym: SymbolId, loc: Location) -> VerifyResult {
        if self.in_current_scope(sym) {
            Ok(())
        } else {
            Err(VerifyError::OutOfScope { node, name: self.name(sym), span: span(loc) })
        }
    }

    fn dependencies(&self, owner: SymbolId, deps: &[String]) -> VerifyResult {
        match deps.iter().find(|dep| !valid_name(dep)) {
            Some(dep) => Err(VerifyError::InvalidDependency {
                module: self.name(owner),
                dependency: dep.clone(),
                span: self.symbol_span(owner),
            }),
            None => Ok(()),
        }
    }

    fn require_global(&self, sym: SymbolId) -> VerifyResult {
        if self.asr.parent_symtab(sym) == Some(self.asr.global_scope()) {
            Ok(())
        } else {
            Err(VerifyError::NotInGlobalScope {
                kind: self.asr.symbol(sym).kind().as_str(),
                name: self.name(sym),
                span: self.symbol_span(sym),
            })
        }
    }

    // Symbols
    //
    //

    fn symbol(&mut self, sym: SymbolId) -> VerifyResult {
        let asr = self.asr;
        match asr.symbol(sym) {
            Symbol::Program(x) => {
                self.require_global(sym)?;
                self.dependencies(sym, &x.dependencies)?;
                self.with_scope(sym, x.symtab, |v| v.body(&x.body))
            }
            Symbol::Module(x) => {
                self.require_global(sym)?;
                self.dependencies(sym, &x.dependencies)?;
                self.with_scope(sym, x.symtab, |_| Ok(()))
            }
            Symbol::Function(x) => {
                self.dependencies(sym, &x.dependencies)?;
                self.with_scope(sym, x.symtab, |v| {
                    x.args.iter().try_for_each(|arg| v.expr(*arg))?;
                    v.body(&x.body)?;
                    x.return_var.map_or(Ok(()), |ret| v.expr(ret))
                })
            }
            Symbol::StructType(x) => {
                self.dependencies(sym, &x.dependencies)?;
                if let Some(parent) = x.parent {
                    self.require_in_scope("StructType::parent", parent, x.loc)?;
                }
                self.with_scope(sym, x.symtab, |_| Ok(()))
            }
            Symbol::Block(x) => self.with_scope(sym, x.symtab, |v| v.body(&x.body)),
            Symbol::Variable(x) => {
                let registered = asr
                    .get_symtab(x.parent_symtab)
                    .is_some_and(|t| self.counters.get(&t.counter) == Some(&x.parent_symtab));
                if !registered {
                    return Err(VerifyError::UnregisteredParentSymtab {
                        name: x.name.clone(),
                        span: span(x.loc),
                    });
                }
                if asr.symtab(x.parent_symtab).get(&x.name) != Some(sym) {
                    return Err(VerifyError::NotInParentSymtab {
                        name: x.name.clone(),
                        span: span(x.loc),
                    });
                }
                self.ttype(&x.ty, x.loc)?;
                if let Some(e) = x.symbolic_value {
                    self.expr(e)?;
                }
                if let Some(e) = x.value {
                    self.expr(e)?;
                }
                Ok(())
            }
            Symbol::ExternalSymbol(_) if self.check_external => self.external(sym),
            Symbol::ExternalSymbol(_) => Ok(()),
            Symbol::GenericProcedure(x) => {
                for proc in &x.procs {
                    self.require_in_scope("GenericProcedure", *proc, x.loc)?;
                }
                Ok(())
            }
            Symbol::ClassProcedure(x) => self.require_in_scope("ClassProcedure", x.proc, x.loc),
        }
    }

    fn external(&self, sym: SymbolId) -> VerifyResult {
        let asr = self.asr;
        let Some(ext) = asr.symbol(sym).as_external() else {
            return Ok(());
        };
        let name = ext.name.clone();
        let loc = span(ext.loc);
        let Some(target) = ext.external else {
            return Err(VerifyError::UnlinkedExternal { name, span: loc });
        };
        let target_sym = asr.symbol(target);
        if let Symbol::ExternalSymbol(_) = target_sym {
            return Err(VerifyError::ChainedExternal { name, span: loc });
        }
        if target_sym.name() != ext.original_name {
            return Err(VerifyError::ExternalNameMismatch {
                name,
                original_name: ext.original_name.clone(),
                target: target_sym.name().to_owned(),
                span: loc,
            });
        }
        let Some(module) = asr.module_of(target) else {
            return Err(VerifyError::ExternalModuleMismatch {
                name,
                module_name: ext.module_name.clone(),
                actual: "no module".to_owned(),
                span: loc,
            });
        };
        let module = asr.symbol(module);
        if module.name() != ext.module_name {
            return Err(VerifyError::ExternalModuleMismatch {
                name,
                module_name: ext.module_name.clone(),
                actual: format!("module `{}`", module.name()),
                span: loc,
            });
        }
        let found = module
            .symtab()
            .and_then(|scope| asr.find_scoped(scope, &ext.original_name, &ext.scope_names).ok());
        if found != Some(target) {
            return Err(VerifyError::ExternalLookupMismatch { name, span: loc });
        }
        Ok(())
    }

    fn ttype(&mut self, ty: &Ttype, loc: Location) -> VerifyResult {
        match ty {
            Ttype::Struct { derived_type } => self.require_in_scope("Struct", *derived_type, loc),
            Ttype::Array { elem, .. } => {
                for dim in ty.dims() {
                    for e in dim.start.into_iter().chain(dim.length) {
                        self.expr(e)?;
                    }
                }
                self.ttype(elem, loc)
            }
            Ttype::Pointer(inner) | Ttype::Allocatable(inner) | Ttype::List(inner) => {
                self.ttype(inner, loc)
            }
            Ttype::Tuple(elems) => elems.iter().try_for_each(|t| self.ttype(t, loc)),
            _ => Ok(()),
        }
    }

    // Statements and expressions
    //
    //

    fn body(&mut self, body: &[StmtId]) -> VerifyResult {
        body.iter().try_for_each(|s| self.stmt(*s))
    }

    fn stmt(&mut self, stmt: StmtId) -> VerifyResult {
        let asr = self.asr;
        let node = asr.stmt(stmt);
        match &node.kind {
            StmtKind::SubroutineCall { name, dt, .. } => {
                self.procedure_reference("SubroutineCall", *name, *dt, node.loc)?;
            }
            StmtKind::BlockCall { m, .. } => {
                self.require_in_scope("BlockCall", *m, node.loc)?;
                if !matches!(asr.symbol(*m), Symbol::Block(_)) {
                    return Err(VerifyError::WrongSymbolKind {
                        node: "BlockCall",
                        name: self.name(*m),
                        expected: "block",
                        actual: asr.symbol(*m).kind().as_str(),
                        span: span(node.loc),
                    });
                }
            }
            _ => {}
        }
        for expr in node.kind.exprs() {
            self.expr(expr)?;
        }
        for body in node.kind.bodies() {
            self.body(body)?;
        }
        Ok(())
    }

    /// Check the target of a (type-bound) procedure call.
    fn procedure_reference(
        &self,
        node: &'static str,
        name: SymbolId,
        dt: Option<ExprId>,
        loc: Location,
    ) -> VerifyResult {
        let asr = self.asr;
        match dt {
            Some(dt) => {
                let derived_type = asr
                    .expr_type(dt)
                    .and_then(|ty| asr.derived_type_of(ty.past_array()))
                    .ok_or(VerifyError::NotADerivedType { node, span: span(loc) })?;
                let found = asr.struct_type_chain(derived_type).into_iter().any(|ty| {
                    asr.symbol(ty).symtab().is_some_and(|table| self.symtab_in_scope(table, name))
                });
                if !found {
                    return Err(VerifyError::OutOfScope { node, name: self.name(name), span: span(loc) });
                }
            }
            None => {
                self.require_in_scope(node, name, loc)?;
                if self.check_external {
                    let target = asr.symbol(asr.past_external(name));
                    if !matches!(target, Symbol::Function(_)) {
                        return Err(VerifyError::WrongSymbolKind {
                            node,
                            name: self.name(name),
                            expected: "function",
                            actual: target.kind().as_str(),
                            span: span(loc),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// A member reference `v%member` through a derived type that was imported from
    /// another module: the member lives in the table of the imported type (or of a type
    /// it extends), which is never an ancestor of the current scope.
    fn external_derived_type_member(&self, derived_type: SymbolId, member: SymbolId) -> bool {
        let asr = self.asr;
        let Symbol::ExternalSymbol(ext) = asr.symbol(derived_type) else {
            return false;
        };
        let Some(target) = ext.external else {
            return false;
        };
        matches!(asr.symbol(target), Symbol::StructType(_))
            && self.member_of_type_chain(target, member)
    }

    fn member_of_type_chain(&self, derived_type: SymbolId, member: SymbolId) -> bool {
        let asr = self.asr;
        asr.struct_type_chain(derived_type).into_iter().any(|ty| {
            asr.symbol(ty).symtab().is_some_and(|table| self.symtab_in_scope(table, member))
        })
    }

    fn member_reference(&self, v: ExprId, member: SymbolId, loc: Location) -> VerifyResult {
        let asr = self.asr;
        let Some(Ttype::Struct { derived_type }) = asr.expr_type(v).map(|ty| ty.past_array()) else {
            return Err(VerifyError::NotADerivedType { node: "StructInstanceMember", span: span(loc) });
        };
        let derived_type = *derived_type;
        let allowed = if let Symbol::ExternalSymbol(_) = asr.symbol(derived_type) {
            self.external_derived_type_member(derived_type, member)
        } else {
            self.in_current_scope(derived_type) && self.member_of_type_chain(derived_type, member)
        };
        if allowed {
            Ok(())
        } else {
            Err(VerifyError::OutOfScope {
                node: "StructInstanceMember",
                name: self.name(member),
                span: span(loc),
            })
        }
    }

    fn expr(&mut self, expr: ExprId) -> VerifyResult {
        let asr = self.asr;
        let node = asr.expr(expr);
        let loc = node.loc;
        match &node.kind {
            ExprKind::Var { sym } => {
                let target = asr.symbol(*sym);
                if !matches!(
                    target,
                    Symbol::Variable(_) | Symbol::ExternalSymbol(_) | Symbol::Function(_)
                ) {
                    return Err(VerifyError::WrongSymbolKind {
                        node: "Var",
                        name: self.name(*sym),
                        expected: "variable",
                        actual: target.kind().as_str(),
                        span: span(loc),
                    });
                }
                if self.check_external && matches!(target, Symbol::ExternalSymbol(_)) {
                    let resolved = asr.symbol(asr.past_external(*sym));
                    if !matches!(resolved, Symbol::Variable(_) | Symbol::Function(_)) {
                        return Err(VerifyError::WrongSymbolKind {
                            node: "Var",
                            name: self.name(*sym),
                            expected: "variable",
                            actual: resolved.kind().as_str(),
                            span: span(loc),
                        });
                    }
                }
                self.require_in_scope("Var", *sym, loc)?;
            }
            ExprKind::FunctionCall { name, dt, .. } => {
                self.procedure_reference("FunctionCall", *name, *dt, loc)?;
            }
            ExprKind::StructInstanceMember { v, member, .. } => {
                self.member_reference(*v, *member, loc)?;
            }
            ExprKind::StructConstructor { dt_sym, .. } => {
                self.require_in_scope("StructConstructor", *dt_sym, loc)?;
            }
            _ => {}
        }
        for child in node.kind.children() {
            self.expr(child)?;
        }
        if let Some(value) = node.kind.value() {
            self.expr(value)?;
        }
        if let Some(ty) = node.kind.ty() {
            self.ttype(ty, loc)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lasr_lang_asr::builder::{self, FunctionBuilder};
    use lasr_lang_asr::{BinOp, Intent};

    use super::*;

    /// `program main; integer :: x; x = x + 1; end program`
    fn simple_program() -> (Asr, SymbolId, SymbolId) {
        let mut asr = Asr::new();
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let x = builder::add_variable(&mut asr, scope, "x", Ttype::int()).unwrap();
        let (target, lhs, one) = (asr.var(x), asr.var(x), asr.int(1));
        let sum = asr.binop(lhs, BinOp::Add, one);
        let stmt = asr.assign(target, sum);
        builder::push_stmt(&mut asr, main, stmt);
        (asr, main, x)
    }

    #[test]
    fn well_formed_program_passes() {
        let (asr, _, _) = simple_program();
        assert_eq!(verify(&asr, false), Ok(()));
        assert_eq!(verify(&asr, true), Ok(()));
    }

    #[test]
    fn duplicate_counter_is_rejected() {
        let (mut asr, main, _) = simple_program();
        let other = builder::add_program(&mut asr, "other").unwrap();
        let main_counter = asr.symtab(asr.symbol(main).symtab().unwrap()).counter;
        let other_scope = asr.symbol(other).symtab().unwrap();
        asr.symtab_mut(other_scope).counter = main_counter;
        assert!(matches!(verify(&asr, false), Err(VerifyError::DuplicateCounter { .. })));
    }

    #[test]
    fn miswired_parent_is_rejected() {
        let (mut asr, main, _) = simple_program();
        let scope = asr.symbol(main).symtab().unwrap();
        let f = FunctionBuilder::new(&mut asr, scope, "f").finish().unwrap();
        let f_scope = asr.symbol(f).symtab().unwrap();
        asr.symtab_mut(f_scope).parent = Some(asr.global_scope());
        assert!(matches!(verify(&asr, false), Err(VerifyError::WrongParent { owner, .. }) if owner == "f"));
    }

    #[test]
    fn variable_must_be_registered_under_its_name() {
        let (mut asr, main, x) = simple_program();
        let scope = asr.symbol(main).symtab().unwrap();
        asr.symtab_mut(scope).erase("x");
        asr.symtab_mut(scope).overwrite("y".to_owned(), x);
        assert!(matches!(verify(&asr, false), Err(VerifyError::NotInParentSymtab { .. })));
    }

    #[test]
    fn reference_into_sibling_scope_is_rejected() {
        let (mut asr, _, x) = simple_program();
        let other = builder::add_program(&mut asr, "other").unwrap();
        let xv = asr.var(x);
        let print = asr.print(vec![xv]);
        builder::push_stmt(&mut asr, other, print);
        assert!(matches!(
            verify(&asr, false),
            Err(VerifyError::OutOfScope { node: "Var", name, .. }) if name == "x"
        ));
    }

    #[test]
    fn shadowing_symbol_is_not_the_referenced_one() {
        let (mut asr, main, x) = simple_program();
        let scope = asr.symbol(main).symtab().unwrap();
        let f = FunctionBuilder::new(&mut asr, scope, "f").local("x", Ttype::int()).finish().unwrap();
        // `x` of the program is still visible from `f`, shadowing does not matter
        let xv = asr.var(x);
        let print = asr.print(vec![xv]);
        builder::push_stmt(&mut asr, f, print);
        assert_eq!(verify(&asr, false), Ok(()));
    }

    fn module_with_function(asr: &mut Asr) -> (SymbolId, SymbolId) {
        let m = builder::add_module(asr, "m", &[]).unwrap();
        let m_scope = asr.symbol(m).symtab().unwrap();
        let f = FunctionBuilder::new(asr, m_scope, "f").returns(Ttype::int()).finish().unwrap();
        (m, f)
    }

    #[test]
    fn external_symbols_are_checked_only_on_request() {
        let mut asr = Asr::new();
        let (_, f) = module_with_function(&mut asr);
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let ext = builder::add_external(&mut asr, scope, "f", f).unwrap();
        assert_eq!(verify(&asr, true), Ok(()));

        asr.symbol_mut(ext).as_external_mut().unwrap().external = None;
        assert_eq!(verify(&asr, false), Ok(()));
        assert!(matches!(verify(&asr, true), Err(VerifyError::UnlinkedExternal { .. })));
    }

    #[test]
    fn chained_external_is_rejected() {
        let mut asr = Asr::new();
        let (_, f) = module_with_function(&mut asr);
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let first = builder::add_external(&mut asr, scope, "f", f).unwrap();
        let second = builder::add_external(&mut asr, scope, "g", f).unwrap();
        asr.symbol_mut(second).as_external_mut().unwrap().external = Some(first);
        assert!(matches!(verify(&asr, true), Err(VerifyError::ChainedExternal { name, .. }) if name == "g"));
    }

    #[test]
    fn external_original_name_must_match() {
        let mut asr = Asr::new();
        let (_, f) = module_with_function(&mut asr);
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let ext = builder::add_external(&mut asr, scope, "f", f).unwrap();
        asr.symbol_mut(ext).as_external_mut().unwrap().original_name = "g".to_owned();
        assert!(matches!(verify(&asr, true), Err(VerifyError::ExternalNameMismatch { .. })));
    }

    #[test]
    fn invalid_dependency_name_is_rejected() {
        let mut asr = Asr::new();
        builder::add_module(&mut asr, "m", &["bad-name"]).unwrap();
        assert!(matches!(
            verify(&asr, false),
            Err(VerifyError::InvalidDependency { dependency, .. }) if dependency == "bad-name"
        ));

        let mut asr = Asr::new();
        builder::add_module(&mut asr, "m", &[""]).unwrap();
        assert!(matches!(verify(&asr, false), Err(VerifyError::InvalidDependency { .. })));
    }

    #[test]
    fn function_call_target_must_be_a_function() {
        let mut asr = Asr::new();
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let x = builder::add_variable(&mut asr, scope, "x", Ttype::int()).unwrap();
        let call = asr.call(x, vec![]);
        let target = asr.var(x);
        let stmt = asr.assign(target, call);
        builder::push_stmt(&mut asr, main, stmt);
        assert_eq!(verify(&asr, false), Ok(()));
        assert!(matches!(verify(&asr, true), Err(VerifyError::WrongSymbolKind { node: "FunctionCall", .. })));
    }

    #[test]
    fn imported_variable_must_be_a_variable() {
        let mut asr = Asr::new();
        let m = builder::add_module(&mut asr, "m", &[]).unwrap();
        let m_scope = asr.symbol(m).symtab().unwrap();
        let t = builder::add_struct_type(&mut asr, m_scope, "t", &[("x", Ttype::int())], None).unwrap();
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let t_ext = builder::add_external(&mut asr, scope, "t", t).unwrap();
        let tv = asr.var(t_ext);
        let print = asr.print(vec![tv]);
        builder::push_stmt(&mut asr, main, print);

        assert_eq!(verify(&asr, false), Ok(()));
        assert!(matches!(
            verify(&asr, true),
            Err(VerifyError::WrongSymbolKind { node: "Var", actual: "derived type", .. })
        ));
    }

    /// `module m` defines `type t; integer :: x`, `program main` imports `t` and
    /// reads `v%x` for `type(t) :: v`.
    fn imported_struct_member() -> (Asr, SymbolId, SymbolId, ExprId) {
        let mut asr = Asr::new();
        let m = builder::add_module(&mut asr, "m", &[]).unwrap();
        let m_scope = asr.symbol(m).symtab().unwrap();
        let t = builder::add_struct_type(&mut asr, m_scope, "t", &[("x", Ttype::int())], None).unwrap();
        let t_scope = asr.symbol(t).symtab().unwrap();
        let member = asr.symtab(t_scope).get("x").unwrap();

        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let t_ext = builder::add_external(&mut asr, scope, "t", t).unwrap();
        let v = builder::add_variable(&mut asr, scope, "v", Ttype::Struct { derived_type: t_ext }).unwrap();
        let vv = asr.var(v);
        let access = asr.add_expr(
            Location::initial(),
            ExprKind::StructInstanceMember { v: vv, member, ty: Ttype::int() },
        );
        let print = asr.print(vec![access]);
        builder::push_stmt(&mut asr, main, print);
        (asr, main, member, access)
    }

    #[test]
    fn member_of_imported_derived_type_is_allowed() {
        let (asr, _, _, _) = imported_struct_member();
        assert_eq!(verify(&asr, true), Ok(()));
    }

    #[test]
    fn member_of_unrelated_type_is_rejected() {
        let (mut asr, main, _, access) = imported_struct_member();
        let scope = asr.symbol(main).symtab().unwrap();
        let other = builder::add_struct_type(&mut asr, scope, "other", &[("y", Ttype::int())], None).unwrap();
        let other_scope = asr.symbol(other).symtab().unwrap();
        let y = asr.symtab(other_scope).get("y").unwrap();
        if let ExprKind::StructInstanceMember { member, .. } = &mut asr.expr_mut(access).kind {
            *member = y;
        }
        assert!(matches!(
            verify(&asr, true),
            Err(VerifyError::OutOfScope { node: "StructInstanceMember", name, .. }) if name == "y"
        ));
    }

    #[test]
    fn dummy_arguments_live_in_function_scope() {
        let mut asr = Asr::new();
        let global = asr.global_scope();
        FunctionBuilder::new(&mut asr, global, "f")
            .arg("a", Ttype::int(), Intent::In)
            .returns(Ttype::int())
            .finish()
            .unwrap();
        assert_eq!(verify(&asr, true), Ok(()));
    }
}
