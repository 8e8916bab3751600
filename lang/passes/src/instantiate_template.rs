//! Specializes calls to functions with type parameters.
//!
//! A call whose argument types bind every type parameter of its callee is redirected to
//! a copy `__instantiated_<name>_<types>` of the callee with the parameters replaced.
//! Copies are made once per binding and live next to the generic function. Calls that
//! cannot be bound are left alone.

use lasr_lang_asr::builder;
use lasr_lang_asr::duplicate::ExprStmtDuplicator;
use lasr_lang_asr::{
    Asr, ExprId, ExprKind, Function, StmtId, StmtKind, Symbol, SymbolId, SymtabId, Ttype, Variable,
};

use crate::options::PassOptions;
use crate::result::PassResult;
use crate::utils::{BodyCtx, BodyRewriter, Rewrite, rewrite_bodies, rewrite_symbol_body};

type Bindings = Vec<(String, Ttype)>;

pub fn instantiate_template(asr: &mut Asr, _options: &PassOptions) -> PassResult {
    let mut instantiator = Instantiator::default();
    rewrite_bodies(&mut instantiator, asr)?;
    // Bodies of fresh instantiations may call generic functions themselves.
    while let Some(func) = instantiator.pending.pop() {
        rewrite_symbol_body(&mut instantiator, asr, func)?;
    }
    Ok(())
}

#[derive(Default)]
struct Instantiator {
    pending: Vec<SymbolId>,
}

impl BodyRewriter for Instantiator {
    fn rewrite_stmt(&mut self, asr: &mut Asr, ctx: BodyCtx, stmt: StmtId) -> PassResult<Rewrite> {
        for expr in asr.stmt(stmt).kind.exprs() {
            self.visit_expr(asr, expr)?;
        }
        if let StmtKind::SubroutineCall { name, args, .. } = &asr.stmt(stmt).kind {
            let (name, args) = (*name, args.clone());
            if let Some((specialized, _)) = self.specialize(asr, name, &args)? {
                log::trace!("Instantiated subroutine call in scope {:?}", ctx.scope);
                if let StmtKind::SubroutineCall { name, .. } = &mut asr.stmt_mut(stmt).kind {
                    *name = specialized;
                }
            }
        }
        Ok(Rewrite::Keep)
    }
}

impl Instantiator {
    fn visit_expr(&mut self, asr: &mut Asr, expr: ExprId) -> PassResult {
        for child in asr.expr(expr).kind.children() {
            self.visit_expr(asr, child)?;
        }
        let ExprKind::FunctionCall { name, args, .. } = &asr.expr(expr).kind else {
            return Ok(());
        };
        let (name, args) = (*name, args.clone());
        if let Some((specialized, bindings)) = self.specialize(asr, name, &args)? {
            if let ExprKind::FunctionCall { name, ty, .. } = &mut asr.expr_mut(expr).kind {
                *name = specialized;
                *ty = ty.substitute(&bindings);
            }
        }
        Ok(())
    }

    /// The specialization of `callee` for the given arguments, visible from the call site.
    fn specialize(
        &mut self,
        asr: &mut Asr,
        callee: SymbolId,
        args: &[Option<ExprId>],
    ) -> PassResult<Option<(SymbolId, Bindings)>> {
        let generic = asr.past_external(callee);
        let Some(func) = asr.symbol(generic).as_function() else {
            return Ok(None);
        };
        if func.type_params.is_empty() {
            return Ok(None);
        }
        let Some(home) = asr.parent_symtab(generic) else {
            return Ok(None);
        };
        let Some(bindings) = bind_type_params(asr, func, args, home) else {
            return Ok(None);
        };
        let mangled: Vec<String> = bindings.iter().map(|(_, ty)| ty.mangle()).collect();
        let name = format!("__instantiated_{}_{}", func.name, mangled.join("_"));

        let specialized = match asr.symtab(home).get(&name) {
            Some(existing) => existing,
            None => match self.instantiate(asr, generic, home, &name, &bindings)? {
                Some(created) => created,
                None => return Ok(None),
            },
        };
        if callee == generic {
            return Ok(Some((specialized, bindings)));
        }

        // Called through an external symbol: expose the specialization the same way.
        let Some(ext_scope) = asr.parent_symtab(callee) else {
            return Ok(None);
        };
        let ext = match asr.symtab(ext_scope).get(&name) {
            Some(ext) if asr.past_external(ext) == specialized => ext,
            Some(_) => return Ok(None),
            None => builder::add_external(asr, ext_scope, &name, specialized)?,
        };
        Ok(Some((ext, bindings)))
    }

    fn instantiate(
        &mut self,
        asr: &mut Asr,
        generic: SymbolId,
        home: SymtabId,
        name: &str,
        bindings: &Bindings,
    ) -> PassResult<Option<SymbolId>> {
        let Some(func) = asr.symbol(generic).as_function().cloned() else {
            return Ok(None);
        };
        let entries = asr.symtab(func.symtab).symbols();
        if entries.iter().any(|sym| !matches!(asr.symbol(*sym), Symbol::Variable(_))) {
            log::debug!("Cannot instantiate `{}`: it contains nested procedures or types", func.name);
            return Ok(None);
        }
        log::debug!("Instantiating `{}` as `{name}`", func.name);

        let symtab = asr.new_symtab(Some(home));
        let mut dup = ExprStmtDuplicator::new(true);

        // Declare all copies first so dimensions may refer to any of them.
        let mut copies = Vec::with_capacity(entries.len());
        for sym in entries {
            let Some(var) = asr.symbol(sym).as_variable().cloned() else {
                continue;
            };
            let copy = Variable {
                parent_symtab: symtab,
                ty: var.ty.substitute(bindings),
                ..var
            };
            let id = asr.add_symbol(symtab, copy.into())?;
            dup.symbol_map.insert(sym, id);
            copies.push(id);
        }
        for id in copies {
            let Some(var) = asr.symbol(id).as_variable().cloned() else {
                continue;
            };
            let ty = dup.duplicate_ttype(asr, &var.ty)?;
            let symbolic_value =
                var.symbolic_value.map(|v| dup.duplicate_expr(asr, v)).transpose()?;
            let value = var.value.map(|v| dup.duplicate_expr(asr, v)).transpose()?;
            if let Some(copy) = asr.symbol_mut(id).as_variable_mut() {
                copy.ty = ty;
                copy.symbolic_value = symbolic_value;
                copy.value = value;
            }
        }

        let args =
            func.args.iter().map(|a| dup.duplicate_expr(asr, *a)).collect::<Result<Vec<_>, _>>()?;
        let return_var = func.return_var.map(|r| dup.duplicate_expr(asr, r)).transpose()?;
        let body = dup.duplicate_body(asr, &func.body)?;
        for stmt in &body {
            substitute_stmt(asr, *stmt, bindings);
        }

        let specialized = Function {
            symtab,
            name: name.to_owned(),
            args,
            body,
            return_var,
            type_params: vec![],
            ..func
        };
        let id = asr.add_symbol(home, specialized.into())?;
        self.pending.push(id);
        Ok(Some(id))
    }
}

/// Bind every type parameter of `func` from the types of the actual arguments.
fn bind_type_params(
    asr: &Asr,
    func: &Function,
    args: &[Option<ExprId>],
    home: SymtabId,
) -> Option<Bindings> {
    if func.args.len() != args.len() {
        return None;
    }
    let mut bindings = Bindings::new();
    for (formal, actual) in func.args.iter().zip(args) {
        let formal = asr.expr_type(*formal)?;
        let actual = asr.expr_type((*actual)?)?;
        if !unify(formal, actual, &mut bindings) {
            return None;
        }
    }
    func.type_params
        .iter()
        .map(|param| {
            let (_, ty) = bindings.iter().find(|(name, _)| name == param)?;
            bindable(asr, ty, home).then(|| (param.clone(), ty.clone()))
        })
        .collect()
}

fn unify(formal: &Ttype, actual: &Ttype, bindings: &mut Bindings) -> bool {
    match (formal.past_wrappers(), actual.past_wrappers()) {
        (Ttype::TypeParameter { param }, actual) => {
            match bindings.iter().find(|(name, _)| name == param) {
                Some((_, bound)) => bound.same_as(actual),
                None => {
                    bindings.push((param.clone(), actual.clone()));
                    true
                }
            }
        }
        (Ttype::Array { elem: f, dims: fd }, Ttype::Array { elem: a, dims: ad }) => {
            fd.len() == ad.len() && unify(f, a, bindings)
        }
        (Ttype::List(f), Ttype::List(a)) => unify(f, a, bindings),
        (Ttype::Tuple(f), Ttype::Tuple(a)) => {
            f.len() == a.len() && f.iter().zip(a).all(|(f, a)| unify(f, a, bindings))
        }
        (formal, actual) => !formal.is_generic() && formal.same_as(actual),
    }
}

/// Whether a type can stand for a type parameter of a function registered in `home`.
fn bindable(asr: &Asr, ty: &Ttype, home: SymtabId) -> bool {
    match ty {
        Ttype::TypeParameter { .. } | Ttype::Array { .. } => false,
        Ttype::Struct { derived_type } => {
            asr.parent_symtab(*derived_type).is_some_and(|owner| asr.symtab_encloses(owner, home))
        }
        Ttype::Pointer(inner) | Ttype::Allocatable(inner) | Ttype::List(inner) => {
            bindable(asr, inner, home)
        }
        Ttype::Tuple(elems) => elems.iter().all(|t| bindable(asr, t, home)),
        _ => true,
    }
}

fn substitute_stmt(asr: &mut Asr, stmt: StmtId, bindings: &Bindings) {
    for expr in asr.stmt(stmt).kind.exprs() {
        substitute_expr(asr, expr, bindings);
    }
    let nested: Vec<StmtId> = asr.stmt(stmt).kind.bodies().into_iter().flatten().copied().collect();
    for inner in nested {
        substitute_stmt(asr, inner, bindings);
    }
}

fn substitute_expr(asr: &mut Asr, expr: ExprId, bindings: &Bindings) {
    for child in asr.expr(expr).kind.children() {
        substitute_expr(asr, child, bindings);
    }
    if let Some(ty) = asr.expr_mut(expr).kind.ty_mut() {
        *ty = ty.substitute(bindings);
    }
}
