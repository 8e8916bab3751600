//! Lowers derived type constructors `T(a, b)` into member assignments.

use lasr_lang_asr::{Asr, ExprId, ExprKind, StmtId, StmtKind, SymtabId, Ttype};

use crate::options::PassOptions;
use crate::result::PassResult;
use crate::utils::{
    BodyCtx, BodyRewriter, Rewrite, fresh_variable, map_expr_children, map_stmt_exprs,
    rewrite_bodies, rewrite_nested, set_loc,
};

pub fn class_constructor(asr: &mut Asr, _options: &PassOptions) -> PassResult {
    rewrite_bodies(&mut ClassConstructor, asr)
}

struct ClassConstructor;

impl BodyRewriter for ClassConstructor {
    fn rewrite_stmt(&mut self, asr: &mut Asr, ctx: BodyCtx, stmt: StmtId) -> PassResult<Rewrite> {
        let loc = asr.stmt(stmt).loc;
        let mut out = Vec::new();

        if let StmtKind::Assignment { target, value } = asr.stmt(stmt).kind {
            if is_constructor(asr, value) {
                decompose(asr, ctx.scope, target, value, &mut out)?;
                set_loc(asr, &out, loc);
                return Ok(Rewrite::Replace(out));
            }
        }

        map_stmt_exprs(asr, stmt, |asr, expr| lift(asr, ctx.scope, expr, &mut out))?;
        if out.is_empty() {
            return Ok(Rewrite::Keep);
        }
        set_loc(asr, &out, loc);
        rewrite_nested(self, asr, ctx, stmt)?;
        out.push(stmt);
        Ok(Rewrite::Replace(out))
    }
}

fn is_constructor(asr: &Asr, expr: ExprId) -> bool {
    matches!(asr.expr(expr).kind, ExprKind::StructConstructor { .. })
}

/// Assign the supplied arguments of the constructor `ctor` to the members of `target`.
fn decompose(
    asr: &mut Asr,
    scope: SymtabId,
    target: ExprId,
    ctor: ExprId,
    out: &mut Vec<StmtId>,
) -> PassResult {
    let ExprKind::StructConstructor { dt_sym, args, .. } = asr.expr(ctor).kind.clone() else {
        return Ok(());
    };
    let members = asr.struct_members(dt_sym);
    for (member, arg) in members.into_iter().zip(args) {
        let Some(arg) = arg else {
            continue;
        };
        let ty = asr.symbol_type(member).cloned().unwrap_or_else(Ttype::int);
        let loc = asr.expr(arg).loc;
        let member_ref = asr.add_expr(loc, ExprKind::StructInstanceMember { v: target, member, ty });
        if is_constructor(asr, arg) {
            decompose(asr, scope, member_ref, arg, out)?;
        } else {
            let value = lift(asr, scope, arg, out)?;
            out.push(asr.assign(member_ref, value));
        }
    }
    Ok(())
}

/// Replace every constructor inside `expr` by a temporary filled in by statements
/// appended to `before`.
fn lift(
    asr: &mut Asr,
    scope: SymtabId,
    expr: ExprId,
    before: &mut Vec<StmtId>,
) -> PassResult<ExprId> {
    if is_constructor(asr, expr) {
        let ty = asr.expr_type(expr).cloned().unwrap_or_else(Ttype::int);
        let temp = fresh_variable(asr, scope, "temp_struct_var__", ty)?;
        let target = asr.var(temp);
        decompose(asr, scope, target, expr, before)?;
        let loc = asr.expr(expr).loc;
        let temp_ref = asr.var(temp);
        asr.expr_mut(temp_ref).loc = loc;
        return Ok(temp_ref);
    }
    map_expr_children(asr, expr, |asr, child| lift(asr, scope, child, before))?;
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use lasr_lang_asr::builder::{self, FunctionBuilder};
    use lasr_lang_asr::{Intent, Location, SymbolId};
    use lasr_lang_verify::verify;

    use super::*;

    struct Fixture {
        asr: Asr,
        main: SymbolId,
        scope: SymtabId,
        point: SymbolId,
        line: SymbolId,
    }

    /// `point(x, y)` and `line(a: point, b: point)` with a program declaring `p` and `l`.
    fn fixture() -> Fixture {
        let mut asr = Asr::new();
        let global = asr.global_scope();
        let point = builder::add_struct_type(
            &mut asr,
            global,
            "point",
            &[("x", Ttype::real()), ("y", Ttype::real())],
            None,
        )
        .unwrap();
        let point_ty = Ttype::Struct { derived_type: point };
        let line = builder::add_struct_type(
            &mut asr,
            global,
            "line",
            &[("a", point_ty.clone()), ("b", point_ty.clone())],
            None,
        )
        .unwrap();
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        builder::add_variable(&mut asr, scope, "p", point_ty).unwrap();
        builder::add_variable(&mut asr, scope, "l", Ttype::Struct { derived_type: line }).unwrap();
        Fixture { asr, main, scope, point, line }
    }

    fn constructor(asr: &mut Asr, dt_sym: SymbolId, args: Vec<Option<ExprId>>) -> ExprId {
        let ty = Ttype::Struct { derived_type: dt_sym };
        asr.add_expr(Location::initial(), ExprKind::StructConstructor { dt_sym, args, ty })
    }

    fn var(f: &mut Fixture, name: &str) -> ExprId {
        let sym = f.asr.symtab(f.scope).get(name).unwrap();
        f.asr.var(sym)
    }

    fn member_path(asr: &Asr, mut expr: ExprId) -> Vec<String> {
        let mut path = Vec::new();
        while let ExprKind::StructInstanceMember { v, member, .. } = asr.expr(expr).kind {
            path.push(asr.symbol(member).name().to_owned());
            expr = v;
        }
        path.reverse();
        path
    }

    fn assigned_paths(f: &Fixture) -> Vec<Vec<String>> {
        f.asr
            .symbol(f.main)
            .body()
            .unwrap()
            .iter()
            .filter_map(|s| match f.asr.stmt(*s).kind {
                StmtKind::Assignment { target, .. } => Some(member_path(&f.asr, target)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn assignment_becomes_member_assignments() {
        let mut f = fixture();
        let (one, two) = (f.asr.real(1.0), f.asr.real(2.0));
        let ctor = constructor(&mut f.asr, f.point, vec![Some(one), Some(two)]);
        let p = var(&mut f, "p");
        let stmt = f.asr.assign(p, ctor);
        builder::push_stmt(&mut f.asr, f.main, stmt);

        class_constructor(&mut f.asr, &PassOptions::default()).unwrap();
        verify(&f.asr, true).unwrap();
        assert_eq!(assigned_paths(&f), [vec!["x"], vec!["y"]]);
    }

    #[test]
    fn nested_constructors_recurse_and_skip_missing_arguments() {
        let mut f = fixture();
        let (one, two, three) = (f.asr.real(1.0), f.asr.real(2.0), f.asr.real(3.0));
        let a = constructor(&mut f.asr, f.point, vec![Some(one), Some(two)]);
        let b = constructor(&mut f.asr, f.point, vec![None, Some(three)]);
        let ctor = constructor(&mut f.asr, f.line, vec![Some(a), Some(b)]);
        let l = var(&mut f, "l");
        let stmt = f.asr.assign(l, ctor);
        builder::push_stmt(&mut f.asr, f.main, stmt);

        class_constructor(&mut f.asr, &PassOptions::default()).unwrap();
        verify(&f.asr, true).unwrap();
        assert_eq!(assigned_paths(&f), [vec!["a", "x"], vec!["a", "y"], vec!["b", "y"]]);
    }

    #[test]
    fn empty_constructor_drops_the_assignment() {
        let mut f = fixture();
        let ctor = constructor(&mut f.asr, f.point, vec![None, None]);
        let p = var(&mut f, "p");
        let stmt = f.asr.assign(p, ctor);
        builder::push_stmt(&mut f.asr, f.main, stmt);

        class_constructor(&mut f.asr, &PassOptions::default()).unwrap();
        assert!(f.asr.symbol(f.main).body().unwrap().is_empty());
    }

    #[test]
    fn constructor_arguments_go_through_a_temporary() {
        let mut f = fixture();
        let point_ty = Ttype::Struct { derived_type: f.point };
        let global = f.asr.global_scope();
        let show = FunctionBuilder::new(&mut f.asr, global, "show")
            .arg("q", point_ty, Intent::In)
            .finish()
            .unwrap();
        let (one, two) = (f.asr.real(1.0), f.asr.real(2.0));
        let ctor = constructor(&mut f.asr, f.point, vec![Some(one), Some(two)]);
        let call = f.asr.subroutine_call(show, vec![ctor]);
        builder::push_stmt(&mut f.asr, f.main, call);

        class_constructor(&mut f.asr, &PassOptions::default()).unwrap();
        verify(&f.asr, true).unwrap();

        let temp = f.asr.symtab(f.scope).get("temp_struct_var__").unwrap();
        let body = f.asr.symbol(f.main).body().unwrap().clone();
        assert_eq!(body.len(), 3);
        assert_eq!(body[2], call);
        let StmtKind::SubroutineCall { args, .. } = &f.asr.stmt(call).kind else { panic!() };
        assert_eq!(f.asr.var_symbol(args[0].unwrap()), Some(temp));
        let StmtKind::Assignment { target, .. } = f.asr.stmt(body[0]).kind else { panic!() };
        let ExprKind::StructInstanceMember { v, .. } = f.asr.expr(target).kind else { panic!() };
        assert_eq!(f.asr.var_symbol(v), Some(temp));
    }
}
