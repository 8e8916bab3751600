//! Inlines calls to small scalar functions into the statement list of the caller.
//!
//! The callee's locals are copied into the caller under fresh names, its arguments are
//! assigned before the copied body, and the call is replaced by the copied result
//! variable. Early returns jump to an empty block placed after the body. Inlining is
//! opportunistic: a call that cannot be inlined is left as it is.

use lasr_lang_asr::builder;
use lasr_lang_asr::duplicate::ExprStmtDuplicator;
use lasr_lang_asr::visit::{Visitor, walk_expr, walk_stmt};
use lasr_lang_asr::{
    Abi, Asr, DefType, ExprId, ExprKind, Function, HashMap, Intent, StmtId, StmtKind, Storage,
    Symbol, SymbolId, Variable,
};

use crate::options::PassOptions;
use crate::result::PassResult;
use crate::utils::{
    BodyCtx, BodyRewriter, Rewrite, map_expr_children, map_stmt_exprs, rewrite_bodies,
    rewrite_nested,
};

pub fn inline_function_calls(asr: &mut Asr, options: &PassOptions) -> PassResult {
    let mut inliner = Inliner {
        fast: options.fast,
        inline_external: options.inline_external_symbol_calls,
        next_label: HashMap::default(),
    };
    rewrite_bodies(&mut inliner, asr)
}

struct Inliner {
    fast: bool,
    inline_external: bool,
    /// The next free `GoTo` label of every caller.
    next_label: HashMap<SymbolId, i64>,
}

impl BodyRewriter for Inliner {
    fn rewrite_stmt(&mut self, asr: &mut Asr, ctx: BodyCtx, stmt: StmtId) -> PassResult<Rewrite> {
        let mut before = Vec::new();
        map_stmt_exprs(asr, stmt, |asr, expr| self.inline_in(asr, ctx, expr, &mut before))?;
        if before.is_empty() {
            return Ok(Rewrite::Keep);
        }
        rewrite_nested(self, asr, ctx, stmt)?;
        before.push(stmt);
        Ok(Rewrite::Replace(before))
    }
}

impl Inliner {
    fn inline_in(
        &mut self,
        asr: &mut Asr,
        ctx: BodyCtx,
        expr: ExprId,
        before: &mut Vec<StmtId>,
    ) -> PassResult<ExprId> {
        map_expr_children(asr, expr, |asr, child| self.inline_in(asr, ctx, child, before))?;
        let ExprKind::FunctionCall { name, ref args, dt: None, .. } = asr.expr(expr).kind else {
            return Ok(expr);
        };
        let args = args.clone();
        let Some(callee) = self.inlinable(asr, ctx, name) else {
            return Ok(expr);
        };
        match self.inline_call(asr, ctx, callee, &args, before)? {
            Some(result) => {
                log::debug!("Inlined a call to `{}`", asr.symbol(callee).name());
                Ok(result)
            }
            None => Ok(expr),
        }
    }

    /// The function called through `name` if calls to it may be inlined.
    fn inlinable(&self, asr: &Asr, ctx: BodyCtx, name: SymbolId) -> Option<SymbolId> {
        if matches!(asr.symbol(name), Symbol::ExternalSymbol(_)) && !self.inline_external {
            return None;
        }
        let callee = asr.past_external(name);
        let func = asr.symbol(callee).as_function()?;
        let eligible = (self.fast || func.inline)
            && callee != ctx.owner
            && func.abi == Abi::Source
            && func.deftype == DefType::Implementation
            && func.return_var.is_some()
            && func.type_params.is_empty()
            && !asr.is_intrinsic(callee)
            && !calls(asr, &func.body, callee);
        let scalar_locals = asr.symtab(func.symtab).symbols().into_iter().all(|sym| {
            matches!(asr.symbol(sym), Symbol::Variable(v) if !v.ty.is_array() && !v.ty.is_character())
        });
        (eligible && scalar_locals).then_some(callee)
    }

    /// Copy the body of `callee` before the current statement; the copied result variable.
    fn inline_call(
        &mut self,
        asr: &mut Asr,
        ctx: BodyCtx,
        callee: SymbolId,
        args: &[Option<ExprId>],
        before: &mut Vec<StmtId>,
    ) -> PassResult<Option<ExprId>> {
        let Some(func) = asr.symbol(callee).as_function().cloned() else {
            return Ok(None);
        };
        let Some(return_var) = func.return_var.filter(|_| args.len() == func.args.len()) else {
            return Ok(None);
        };

        let mut dup = ExprStmtDuplicator::new(true);
        dup.target_scope = Some(ctx.scope);
        let mut created = Vec::new();
        for sym in asr.symtab(func.symtab).symbols() {
            let Some(var) = asr.symbol(sym).as_variable().cloned() else {
                return Ok(None);
            };
            let Ok(ty) = dup.duplicate_ttype(asr, &var.ty) else {
                log::trace!("Cannot copy the local `{}` of `{}`", var.name, func.name);
                erase_locals(asr, ctx, &created);
                return Ok(None);
            };
            let name = asr.get_unique_name(ctx.scope, &format!("{}_{}", var.name, func.name));
            let mut copy = builder::variable(ctx.scope, &name, ty);
            if var.storage == Storage::Parameter {
                copy.storage = Storage::Parameter;
            }
            let copy = asr.add_symbol(ctx.scope, copy.into())?;
            created.push((name, var, copy));
            dup.symbol_map.insert(sym, copy);
        }

        match self.copy_body(asr, ctx, &func, return_var, args, &mut dup, &created) {
            Ok(Some((stmts, result))) => {
                before.extend(stmts);
                Ok(Some(result))
            }
            Ok(None) | Err(_) => {
                log::trace!("Rolling back the inlining of `{}`", func.name);
                erase_locals(asr, ctx, &created);
                Ok(None)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn copy_body(
        &mut self,
        asr: &mut Asr,
        ctx: BodyCtx,
        func: &Function,
        return_var: ExprId,
        args: &[Option<ExprId>],
        dup: &mut ExprStmtDuplicator,
        created: &[(String, Variable, SymbolId)],
    ) -> PassResult<Option<(Vec<StmtId>, ExprId)>> {
        // initializers of the copied locals
        for (_, original, copy) in created {
            let value = original.value.map(|v| dup.duplicate_expr(asr, v)).transpose()?;
            let symbolic = original.symbolic_value.map(|v| dup.duplicate_expr(asr, v)).transpose()?;
            if let Some(var) = asr.symbol_mut(*copy).as_variable_mut() {
                var.value = value;
                var.symbolic_value = symbolic;
            }
        }

        let mut stmts = Vec::new();
        let mut write_back = Vec::new();
        for (formal, actual) in func.args.iter().zip(args) {
            let (Some(formal), Some(actual)) = (asr.var_symbol(*formal), *actual) else {
                return Ok(None);
            };
            let Some(copy) = dup.symbol_map.get(&formal).copied() else {
                return Ok(None);
            };
            let intent = asr.symbol(formal).as_variable().map(|v| v.intent);
            let copy_ref = asr.var(copy);
            stmts.push(asr.assign(copy_ref, actual));
            if matches!(intent, Some(Intent::Out | Intent::InOut)) {
                if asr.var_symbol(actual).is_none() {
                    return Ok(None);
                }
                let copy_ref = asr.var(copy);
                write_back.push(asr.assign(actual, copy_ref));
            }
        }

        let mut body = dup.duplicate_body(asr, &func.body)?;
        if contains_return(asr, &body) {
            let label = self.fresh_label(asr, ctx);
            let block_name = asr.get_unique_name(ctx.scope, "__lasr_empty_block");
            let block = builder::add_block(asr, ctx.scope, &block_name)?;
            replace_returns(asr, &mut body, label);
            stmts.extend(body);
            let loc = asr.expr(return_var).loc;
            stmts.push(asr.add_stmt(loc, StmtKind::BlockCall { label, m: block }));
        } else {
            stmts.extend(body);
        }
        stmts.extend(write_back);

        let Some(result) = asr.var_symbol(return_var).and_then(|r| dup.symbol_map.get(&r).copied())
        else {
            return Ok(None);
        };
        Ok(Some((stmts, asr.var(result))))
    }

    fn fresh_label(&mut self, asr: &Asr, ctx: BodyCtx) -> i64 {
        let next = self.next_label.entry(ctx.owner).or_insert_with(|| {
            let body = asr.symbol(ctx.owner).body().cloned().unwrap_or_default();
            max_label(asr, &body) + 1
        });
        let label = *next;
        *next += 1;
        label
    }
}

/// Whether `body` calls `func`, directly or through an external symbol.
fn calls(asr: &Asr, body: &[StmtId], func: SymbolId) -> bool {
    struct Calls {
        func: SymbolId,
        found: bool,
    }

    impl Visitor for Calls {
        fn visit_stmt(&mut self, asr: &Asr, stmt: StmtId) {
            if let StmtKind::SubroutineCall { name, .. } = asr.stmt(stmt).kind {
                self.found |= asr.past_external(name) == self.func;
            }
            walk_stmt(self, asr, stmt)
        }

        fn visit_expr(&mut self, asr: &Asr, expr: ExprId) {
            if let ExprKind::FunctionCall { name, .. } = asr.expr(expr).kind {
                self.found |= asr.past_external(name) == self.func;
            }
            walk_expr(self, asr, expr)
        }
    }

    let mut visitor = Calls { func, found: false };
    body.iter().for_each(|stmt| visitor.visit_stmt(asr, *stmt));
    visitor.found
}

fn erase_locals(asr: &mut Asr, ctx: BodyCtx, created: &[(String, Variable, SymbolId)]) {
    for (name, _, _) in created {
        asr.symtab_mut(ctx.scope).erase(name);
    }
}

fn contains_return(asr: &Asr, body: &[StmtId]) -> bool {
    body.iter().any(|stmt| {
        let kind = &asr.stmt(*stmt).kind;
        matches!(kind, StmtKind::Return) || kind.bodies().into_iter().any(|inner| contains_return(asr, inner))
    })
}

fn replace_returns(asr: &mut Asr, body: &mut [StmtId], label: i64) {
    for stmt in body.iter_mut() {
        if matches!(asr.stmt(*stmt).kind, StmtKind::Return) {
            let loc = asr.stmt(*stmt).loc;
            *stmt = asr.add_stmt(loc, StmtKind::GoTo { target_id: label, name: format!("__{label}") });
            continue;
        }
        let mut kind = asr.stmt(*stmt).kind.clone();
        for inner in kind.bodies_mut() {
            replace_returns(asr, inner, label);
        }
        asr.stmt_mut(*stmt).kind = kind;
    }
}

fn max_label(asr: &Asr, body: &[StmtId]) -> i64 {
    body.iter()
        .map(|stmt| {
            let kind = &asr.stmt(*stmt).kind;
            let own = match kind {
                StmtKind::GoTo { target_id, .. } => *target_id,
                StmtKind::BlockCall { label, .. } => *label,
                _ => 0,
            };
            kind.bodies().into_iter().map(|inner| max_label(asr, inner)).fold(own, i64::max)
        })
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use lasr_lang_asr::builder::FunctionBuilder;
    use lasr_lang_asr::{BinOp, CmpOp, SymtabId, Ttype};
    use lasr_lang_verify::verify;

    use super::*;

    struct Fixture {
        asr: Asr,
        main: SymbolId,
        scope: SymtabId,
        y: ExprId,
    }

    /// `function twice(x) result(twice); twice = 2 * x` marked inlinable, and a program
    /// with an integer `y`.
    fn fixture(inline: bool) -> (Fixture, SymbolId) {
        let mut asr = Asr::new();
        let global = asr.global_scope();
        let mut fb = FunctionBuilder::new(&mut asr, global, "twice")
            .arg("x", Ttype::int(), Intent::In)
            .returns(Ttype::int());
        if inline {
            fb = fb.inline();
        }
        let twice = fb.finish().unwrap();
        let fscope = asr.symbol(twice).symtab().unwrap();
        let (x, ret) = (asr.symtab(fscope).get("x").unwrap(), asr.symtab(fscope).get("twice").unwrap());
        let (x, ret, two) = (asr.var(x), asr.var(ret), asr.int(2));
        let product = asr.binop(two, BinOp::Mul, x);
        let body = asr.assign(ret, product);
        builder::push_stmt(&mut asr, twice, body);

        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let y = builder::add_variable(&mut asr, scope, "y", Ttype::int()).unwrap();
        let y = asr.var(y);
        (Fixture { asr, main, scope, y }, twice)
    }

    fn assign_call(f: &mut Fixture, func: SymbolId) -> StmtId {
        let three = f.asr.int(3);
        let call = f.asr.call(func, vec![three]);
        let stmt = f.asr.assign(f.y, call);
        builder::push_stmt(&mut f.asr, f.main, stmt);
        stmt
    }

    fn run(f: &mut Fixture, fast: bool) {
        let options = PassOptions { fast, ..PassOptions::default() };
        inline_function_calls(&mut f.asr, &options).unwrap();
        verify(&f.asr, true).unwrap();
    }

    #[test]
    fn marked_function_is_inlined() {
        let (mut f, twice) = fixture(true);
        let stmt = assign_call(&mut f, twice);
        run(&mut f, false);

        let body = f.asr.symbol(f.main).body().unwrap().clone();
        // x_twice = 3; twice_twice = 2 * x_twice; y = twice_twice
        assert_eq!(body.len(), 3);
        assert_eq!(body[2], stmt);
        let x_copy = f.asr.symtab(f.scope).get("x_twice").unwrap();
        let ret_copy = f.asr.symtab(f.scope).get("twice_twice").unwrap();
        let StmtKind::Assignment { target, .. } = f.asr.stmt(body[0]).kind else { panic!() };
        assert_eq!(f.asr.var_symbol(target), Some(x_copy));
        let StmtKind::Assignment { value, .. } = f.asr.stmt(stmt).kind else { panic!() };
        assert_eq!(f.asr.var_symbol(value), Some(ret_copy));
    }

    #[test]
    fn unmarked_function_needs_fast_mode() {
        let (mut f, twice) = fixture(false);
        let stmt = assign_call(&mut f, twice);
        run(&mut f, false);
        assert_eq!(f.asr.symbol(f.main).body().unwrap(), &vec![stmt]);

        run(&mut f, true);
        assert_eq!(f.asr.symbol(f.main).body().unwrap().len(), 3);
    }

    #[test]
    fn early_return_jumps_to_an_empty_block() {
        let (mut f, twice) = fixture(true);
        // if (x < 0) return
        let fscope = f.asr.symbol(twice).symtab().unwrap();
        let x = f.asr.symtab(fscope).get("x").unwrap();
        let (x, zero) = (f.asr.var(x), f.asr.int(0));
        let negative = f.asr.compare(x, CmpOp::Lt, zero);
        let ret = f.asr.return_stmt();
        let guard = f.asr.if_stmt(negative, vec![ret], vec![]);
        if let Some(body) = f.asr.symbol_mut(twice).body_mut() {
            body.insert(0, guard);
        }
        assign_call(&mut f, twice);
        run(&mut f, false);

        let body = f.asr.symbol(f.main).body().unwrap().clone();
        let block = f.asr.symtab(f.scope).get("__lasr_empty_block").unwrap();
        let StmtKind::If { body: then, .. } = &f.asr.stmt(body[1]).kind else { panic!() };
        let StmtKind::GoTo { target_id, .. } = f.asr.stmt(then[0]).kind else {
            panic!("expected the return to become a jump");
        };
        let StmtKind::BlockCall { label, m } = f.asr.stmt(body[3]).kind else { panic!() };
        assert_eq!((label, m), (target_id, block));
    }

    #[test]
    fn recursive_function_is_not_inlined() {
        let (mut f, twice) = fixture(true);
        // twice = twice(x) inside the body
        let fscope = f.asr.symbol(twice).symtab().unwrap();
        let (x, ret) = (f.asr.symtab(fscope).get("x").unwrap(), f.asr.symtab(fscope).get("twice").unwrap());
        let (x, ret) = (f.asr.var(x), f.asr.var(ret));
        let call = f.asr.call(twice, vec![x]);
        let recurse = f.asr.assign(ret, call);
        builder::push_stmt(&mut f.asr, twice, recurse);
        let stmt = assign_call(&mut f, twice);
        run(&mut f, true);

        assert_eq!(f.asr.symbol(f.main).body().unwrap(), &vec![stmt]);
        assert!(!f.asr.symtab(f.scope).contains("x_twice"));
    }
    #[test]
    fn locals_of_types_invisible_to_the_caller_prevent_inlining() {
        let mut asr = Asr::new();
        let m = builder::add_module(&mut asr, "m", &[]).unwrap();
        let m_scope = asr.symbol(m).symtab().unwrap();
        let pair = builder::add_struct_type(&mut asr, m_scope, "pair", &[("a", Ttype::int())], None).unwrap();
        let first = FunctionBuilder::new(&mut asr, m_scope, "first")
            .arg("x", Ttype::int(), Intent::In)
            .local("p", Ttype::Struct { derived_type: pair })
            .returns(Ttype::int())
            .inline()
            .finish()
            .unwrap();
        let fscope = asr.symbol(first).symtab().unwrap();
        let (x, ret) = (asr.symtab(fscope).get("x").unwrap(), asr.symtab(fscope).get("first").unwrap());
        let (x, ret) = (asr.var(x), asr.var(ret));
        let body = asr.assign(ret, x);
        builder::push_stmt(&mut asr, first, body);

        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let first_ext = builder::add_external(&mut asr, scope, "first", first).unwrap();
        let y = builder::add_variable(&mut asr, scope, "y", Ttype::int()).unwrap();
        let (y, three) = (asr.var(y), asr.int(3));
        let call = asr.call(first_ext, vec![three]);
        let stmt = asr.assign(y, call);
        builder::push_stmt(&mut asr, main, stmt);

        let options = PassOptions { inline_external_symbol_calls: true, ..PassOptions::default() };
        inline_function_calls(&mut asr, &options).unwrap();
        verify(&asr, true).unwrap();

        assert_eq!(asr.symbol(main).body().unwrap(), &vec![stmt]);
        assert_eq!(asr.symtab(scope).len(), 2);
    }
}
