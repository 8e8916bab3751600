//! Lowers array constructors containing implied do loops, `x = [(f(i), i = a, b, c)]`.

use lasr_lang_asr::{Asr, BinOp, ExprId, ExprKind, StmtId, StmtKind, Ttype};

use crate::options::PassOptions;
use crate::result::PassResult;
use crate::utils::{
    BodyCtx, BodyRewriter, Rewrite, fresh_variable, int_op, is_array, lower_bound, rewrite_bodies,
    set_loc,
};

pub fn implied_do_loops(asr: &mut Asr, _options: &PassOptions) -> PassResult {
    rewrite_bodies(&mut ImpliedDoLoops, asr)
}

struct ImpliedDoLoops;

impl BodyRewriter for ImpliedDoLoops {
    fn rewrite_stmt(&mut self, asr: &mut Asr, ctx: BodyCtx, stmt: StmtId) -> PassResult<Rewrite> {
        let StmtKind::Assignment { target, value } = asr.stmt(stmt).kind else {
            return Ok(Rewrite::Keep);
        };
        let ExprKind::ArrayConstant { args, .. } = &asr.expr(value).kind else {
            return Ok(Rewrite::Keep);
        };
        let args = args.clone();
        if !args.iter().any(|arg| matches!(asr.expr(*arg).kind, ExprKind::ImpliedDoLoop { .. })) {
            return Ok(Rewrite::Keep);
        }
        let target_is_vector = matches!(
            asr.expr(target).kind,
            ExprKind::Var { .. } | ExprKind::StructInstanceMember { .. }
        ) && asr.expr_type(target).is_some_and(|ty| ty.rank() == 1);
        if !target_is_vector || !args.iter().all(|arg| flattenable(asr, *arg)) {
            return Ok(Rewrite::Keep);
        }

        let loc = asr.stmt(stmt).loc;
        let lower = lower_bound(asr, target, 0);
        let stmts = match args.as_slice() {
            [single] if is_flat_group(asr, *single) => indexed_group(asr, target, lower, *single),
            _ => counted_groups(asr, ctx, target, lower, &args)?,
        };
        set_loc(asr, &stmts, loc);
        log::trace!("Lowered implied do loop into {} statements", stmts.len());
        Ok(Rewrite::Replace(stmts))
    }
}

/// Scalars and implied do loops over scalars can be stored element by element.
fn flattenable(asr: &Asr, expr: ExprId) -> bool {
    match &asr.expr(expr).kind {
        ExprKind::ImpliedDoLoop { values, .. } => values.iter().all(|v| flattenable(asr, *v)),
        _ => !is_array(asr, expr),
    }
}

/// An implied do loop whose values are all scalars.
fn is_flat_group(asr: &Asr, expr: ExprId) -> bool {
    match &asr.expr(expr).kind {
        ExprKind::ImpliedDoLoop { values, .. } => values
            .iter()
            .all(|v| !matches!(asr.expr(*v).kind, ExprKind::ImpliedDoLoop { .. })),
        _ => false,
    }
}

/// A single group: element `k` of iteration `v` goes to
/// `lower + ((v - start) / increment) * n + k`.
fn indexed_group(asr: &mut Asr, target: ExprId, lower: ExprId, group: ExprId) -> Vec<StmtId> {
    let ExprKind::ImpliedDoLoop { values, var, start, end, increment, .. } =
        asr.expr(group).kind.clone()
    else {
        return vec![];
    };
    let distance = int_op(asr, var, BinOp::Sub, start);
    let iteration = match increment {
        Some(inc) => int_op(asr, distance, BinOp::Div, inc),
        None => distance,
    };
    let n = asr.int(values.len() as i64);
    let first = int_op(asr, iteration, BinOp::Mul, n);
    let first = int_op(asr, lower, BinOp::Add, first);

    let mut body = Vec::with_capacity(values.len());
    for (k, value) in values.into_iter().enumerate() {
        let k = asr.int(k as i64);
        let index = int_op(asr, first, BinOp::Add, k);
        let item = asr.item(target, &[index]);
        body.push(asr.assign(item, value));
    }
    vec![asr.do_loop(var, start, end, increment, body)]
}

/// Several groups, or nested loops: a counter tracks the next free position.
fn counted_groups(
    asr: &mut Asr,
    ctx: BodyCtx,
    target: ExprId,
    lower: ExprId,
    args: &[ExprId],
) -> PassResult<Vec<StmtId>> {
    let counter = fresh_variable(asr, ctx.scope, "__implied_do_k", Ttype::int())?;
    let counter_ref = asr.var(counter);
    let mut out = vec![asr.assign(counter_ref, lower)];
    for arg in args {
        store(asr, target, counter_ref, *arg, &mut out);
    }
    Ok(out)
}

fn store(asr: &mut Asr, target: ExprId, counter: ExprId, value: ExprId, out: &mut Vec<StmtId>) {
    if let ExprKind::ImpliedDoLoop { values, var, start, end, increment, .. } =
        asr.expr(value).kind.clone()
    {
        let mut body = Vec::new();
        for value in values {
            store(asr, target, counter, value, &mut body);
        }
        out.push(asr.do_loop(var, start, end, increment, body));
        return;
    }
    let item = asr.item(target, &[counter]);
    out.push(asr.assign(item, value));
    let one = asr.int(1);
    let next = asr.binop(counter, BinOp::Add, one);
    out.push(asr.assign(counter, next));
}

#[cfg(test)]
mod tests {
    use lasr_lang_asr::{Location, SymbolId, SymtabId, builder};
    use lasr_lang_verify::verify;

    use super::*;

    struct Fixture {
        asr: Asr,
        main: SymbolId,
        scope: SymtabId,
        x: ExprId,
        i: ExprId,
    }

    fn fixture(len: i64) -> Fixture {
        let mut asr = Asr::new();
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let ty = builder::array_of(&mut asr, Ttype::int(), &[len]);
        let x = builder::add_variable(&mut asr, scope, "x", ty).unwrap();
        let i = builder::add_variable(&mut asr, scope, "i", Ttype::int()).unwrap();
        let (x, i) = (asr.var(x), asr.var(i));
        Fixture { asr, main, scope, x, i }
    }

    fn implied(asr: &mut Asr, values: Vec<ExprId>, var: ExprId, last: i64) -> ExprId {
        let ty = builder::array_of(asr, Ttype::int(), &[last * values.len() as i64]);
        let (start, end) = (asr.int(1), asr.int(last));
        asr.add_expr(
            Location::initial(),
            ExprKind::ImpliedDoLoop { values, var, start, end, increment: None, ty },
        )
    }

    fn assign_constructor(f: &mut Fixture, args: Vec<ExprId>) -> StmtId {
        let ty = f.asr.expr_type(f.x).cloned().unwrap();
        let value = f.asr.add_expr(Location::initial(), ExprKind::ArrayConstant { args, ty });
        let stmt = f.asr.assign(f.x, value);
        builder::push_stmt(&mut f.asr, f.main, stmt);
        stmt
    }

    fn body(f: &Fixture) -> Vec<StmtId> {
        f.asr.symbol(f.main).body().unwrap().clone()
    }

    #[test]
    fn single_group_indexes_by_iteration() {
        let mut f = fixture(5);
        let two = f.asr.int(2);
        let doubled = f.asr.binop(f.i, BinOp::Mul, two);
        let group = implied(&mut f.asr, vec![doubled], f.i, 5);
        assign_constructor(&mut f, vec![group]);

        implied_do_loops(&mut f.asr, &PassOptions::default()).unwrap();
        verify(&f.asr, true).unwrap();

        let body = body(&f);
        assert_eq!(body.len(), 1);
        let StmtKind::DoLoop { head, body: inner } = &f.asr.stmt(body[0]).kind else {
            panic!("expected a do loop");
        };
        assert_eq!(head.v, f.i);
        assert_eq!(f.asr.const_int(head.end), Some(5));
        assert_eq!(inner.len(), 1);
        let StmtKind::Assignment { target, value } = f.asr.stmt(inner[0]).kind else { panic!() };
        assert_eq!(value, doubled);
        assert!(matches!(f.asr.expr(target).kind, ExprKind::ArrayItem { v, .. } if v == f.x));
        assert!(f.asr.symtab(f.scope).get("__implied_do_k").is_none());
    }

    #[test]
    fn mixed_groups_use_a_counter() {
        let mut f = fixture(5);
        let (one, five) = (f.asr.int(1), f.asr.int(5));
        let group = implied(&mut f.asr, vec![f.i], f.i, 3);
        assign_constructor(&mut f, vec![one, group, five]);

        implied_do_loops(&mut f.asr, &PassOptions::default()).unwrap();
        verify(&f.asr, true).unwrap();

        let counter = f.asr.symtab(f.scope).get("__implied_do_k").unwrap();
        let body = body(&f);
        let kinds: Vec<_> = body
            .iter()
            .map(|s| match f.asr.stmt(*s).kind {
                StmtKind::Assignment { .. } => "=",
                StmtKind::DoLoop { .. } => "do",
                _ => "?",
            })
            .collect();
        assert_eq!(kinds, ["=", "=", "=", "do", "=", "="]);
        let StmtKind::Assignment { target, value } = f.asr.stmt(body[0]).kind else { panic!() };
        assert_eq!(f.asr.var_symbol(target), Some(counter));
        assert_eq!(f.asr.const_int(value), Some(1));
        let StmtKind::DoLoop { body: inner, .. } = &f.asr.stmt(body[3]).kind else { panic!() };
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn nested_groups_nest_loops() {
        let mut f = fixture(6);
        let j = builder::add_variable(&mut f.asr, f.scope, "j", Ttype::int()).unwrap();
        let j = f.asr.var(j);
        let inner = implied(&mut f.asr, vec![j], j, 2);
        let outer = implied(&mut f.asr, vec![inner], f.i, 3);
        assign_constructor(&mut f, vec![outer]);

        implied_do_loops(&mut f.asr, &PassOptions::default()).unwrap();
        verify(&f.asr, true).unwrap();

        let body = body(&f);
        assert_eq!(body.len(), 2);
        let StmtKind::DoLoop { head, body: outer_body } = &f.asr.stmt(body[1]).kind else { panic!() };
        assert_eq!(head.v, f.i);
        assert!(matches!(f.asr.stmt(outer_body[0]).kind, StmtKind::DoLoop { .. }));
    }

    #[test]
    fn plain_constructors_stay() {
        let mut f = fixture(2);
        let (one, two) = (f.asr.int(1), f.asr.int(2));
        let stmt = assign_constructor(&mut f, vec![one, two]);
        implied_do_loops(&mut f.asr, &PassOptions::default()).unwrap();
        assert_eq!(body(&f), [stmt]);
    }
}
