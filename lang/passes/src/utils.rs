//! Building blocks shared by the passes: rewriting statement lists, declaring helper
//! variables and taking array values apart element by element.

use lasr_lang_asr::builder;
use lasr_lang_asr::{
    Asr, BinOp, BoundKind, Dimension, ExprId, ExprKind, Location, StmtId, StmtKind, Symbol,
    SymbolId, SymtabId, Ttype,
};

use crate::result::PassResult;

// Statement lists
//
//

/// What becomes of a statement of a body being rewritten.
#[derive(Debug)]
pub enum Rewrite {
    /// Keep the statement and continue with its nested bodies.
    Keep,
    /// Replace the statement by the given ones, which are not visited again.
    Replace(Vec<StmtId>),
}

/// The body a statement belongs to.
#[derive(Debug, Clone, Copy)]
pub struct BodyCtx {
    /// The program, function or block owning the body.
    pub owner: SymbolId,
    /// The table of the owner, where helper variables are declared.
    pub scope: SymtabId,
}

pub trait BodyRewriter {
    fn rewrite_stmt(&mut self, asr: &mut Asr, ctx: BodyCtx, stmt: StmtId) -> PassResult<Rewrite>;
}

/// Rewrite the body of every program, function and block of the translation unit.
///
/// The set of owners is fixed when the walk starts: bodies of symbols created by the
/// rewriter itself are not visited.
pub fn rewrite_bodies<R: BodyRewriter + ?Sized>(rewriter: &mut R, asr: &mut Asr) -> PassResult {
    for owner in asr.symbols_in(asr.global_scope()) {
        rewrite_symbol_body(rewriter, asr, owner)?;
    }
    Ok(())
}

pub fn rewrite_symbol_body<R: BodyRewriter + ?Sized>(
    rewriter: &mut R,
    asr: &mut Asr,
    owner: SymbolId,
) -> PassResult {
    let symbol = asr.symbol(owner);
    let (Some(scope), Some(body)) = (symbol.symtab(), symbol.body()) else {
        return Ok(());
    };
    let body = body.clone();
    let body = rewrite_body(rewriter, asr, BodyCtx { owner, scope }, &body)?;
    if let Some(slot) = asr.symbol_mut(owner).body_mut() {
        *slot = body;
    }
    Ok(())
}

/// Rewrite one statement list, statements before the bodies nested in them.
pub fn rewrite_body<R: BodyRewriter + ?Sized>(
    rewriter: &mut R,
    asr: &mut Asr,
    ctx: BodyCtx,
    body: &[StmtId],
) -> PassResult<Vec<StmtId>> {
    let mut out = Vec::with_capacity(body.len());
    for &stmt in body {
        match rewriter.rewrite_stmt(asr, ctx, stmt)? {
            Rewrite::Keep => {
                rewrite_nested(rewriter, asr, ctx, stmt)?;
                out.push(stmt);
            }
            Rewrite::Replace(stmts) => out.extend(stmts),
        }
    }
    Ok(out)
}

/// Rewrite the bodies nested in `stmt`, e.g. when a rewriter keeps `stmt` as part of a
/// replacement.
pub fn rewrite_nested<R: BodyRewriter + ?Sized>(
    rewriter: &mut R,
    asr: &mut Asr,
    ctx: BodyCtx,
    stmt: StmtId,
) -> PassResult {
    let nested: Vec<Vec<StmtId>> = asr.stmt(stmt).kind.bodies().into_iter().cloned().collect();
    let mut rewritten = Vec::with_capacity(nested.len());
    for inner in &nested {
        rewritten.push(rewrite_body(rewriter, asr, ctx, inner)?);
    }
    for (slot, inner) in asr.stmt_mut(stmt).kind.bodies_mut().into_iter().zip(rewritten) {
        *slot = inner;
    }
    Ok(())
}

/// Apply `f` to every expression slot of a statement and store what it returns.
pub fn map_stmt_exprs<F>(asr: &mut Asr, stmt: StmtId, mut f: F) -> PassResult
where
    F: FnMut(&mut Asr, ExprId) -> PassResult<ExprId>,
{
    let mut kind = asr.stmt(stmt).kind.clone();
    let mut changed = false;
    for slot in kind.exprs_mut() {
        let new = f(asr, *slot)?;
        changed |= new != *slot;
        *slot = new;
    }
    if changed {
        asr.stmt_mut(stmt).kind = kind;
    }
    Ok(())
}

/// Apply `f` to every direct child of an expression and store what it returns.
pub fn map_expr_children<F>(asr: &mut Asr, expr: ExprId, mut f: F) -> PassResult
where
    F: FnMut(&mut Asr, ExprId) -> PassResult<ExprId>,
{
    let mut kind = asr.expr(expr).kind.clone();
    let mut changed = false;
    for slot in kind.children_mut() {
        let new = f(asr, *slot)?;
        changed |= new != *slot;
        *slot = new;
    }
    if changed {
        asr.expr_mut(expr).kind = kind;
    }
    Ok(())
}

pub fn set_loc(asr: &mut Asr, stmts: &[StmtId], loc: Location) {
    for stmt in stmts {
        asr.stmt_mut(*stmt).loc = loc;
    }
}

// Helper variables
//
//

/// A new local variable named after `prefix`, made unique in `scope`.
pub fn fresh_variable(asr: &mut Asr, scope: SymtabId, prefix: &str, ty: Ttype) -> PassResult<SymbolId> {
    let name = asr.get_unique_name(scope, prefix);
    Ok(builder::add_variable(asr, scope, &name, ty)?)
}

/// The integer variable `name` of `scope`, declared on first use.
pub fn index_variable(asr: &mut Asr, scope: SymtabId, name: &str) -> PassResult<SymbolId> {
    if let Some(sym) = asr.symtab(scope).get(name) {
        if matches!(asr.symbol(sym), Symbol::Variable(v) if v.ty == Ttype::int()) {
            return Ok(sym);
        }
    }
    fresh_variable(asr, scope, name, Ttype::int())
}

/// Loop indices `prefix1`, `prefix2`, ... for an array of rank `rank`.
pub fn index_variables(
    asr: &mut Asr,
    scope: SymtabId,
    prefix: &str,
    rank: usize,
) -> PassResult<Vec<SymbolId>> {
    (1..=rank).map(|axis| index_variable(asr, scope, &format!("{prefix}{axis}"))).collect()
}

/// Loops running every index from 1 to the matching extent, the first index outermost.
pub fn loop_nest(
    asr: &mut Asr,
    indices: &[SymbolId],
    extents: &[ExprId],
    body: Vec<StmtId>,
    loc: Location,
) -> Vec<StmtId> {
    let mut body = body;
    for (index, extent) in indices.iter().zip(extents).rev() {
        let v = asr.var(*index);
        let one = asr.int(1);
        let stmt = asr.do_loop(v, one, *extent, None, body);
        asr.stmt_mut(stmt).loc = loc;
        body = vec![stmt];
    }
    body
}

/// `print` with an explicit separator and line terminator.
pub fn print_with(
    asr: &mut Asr,
    values: Vec<ExprId>,
    separator: Option<ExprId>,
    end: Option<ExprId>,
) -> StmtId {
    let stmt = asr.print(values);
    if let StmtKind::Print { separator: sep_slot, end: end_slot, .. } = &mut asr.stmt_mut(stmt).kind {
        *sep_slot = separator;
        *end_slot = end;
    }
    stmt
}

// Integer arithmetic
//
//

/// `left op right` on integers, folded where the result is known at compile time.
pub fn int_op(asr: &mut Asr, left: ExprId, op: BinOp, right: ExprId) -> ExprId {
    let (l, r) = (asr.const_int(left), asr.const_int(right));
    if let (Some(l), Some(r)) = (l, r) {
        let folded = match op {
            BinOp::Add => l.checked_add(r),
            BinOp::Sub => l.checked_sub(r),
            BinOp::Mul => l.checked_mul(r),
            BinOp::Div => l.checked_div(r),
            BinOp::Pow => u32::try_from(r).ok().and_then(|r| l.checked_pow(r)),
        };
        if let Some(n) = folded {
            return asr.int(n);
        }
    }
    match (op, l, r) {
        (BinOp::Add | BinOp::Sub, _, Some(0)) | (BinOp::Mul | BinOp::Div, _, Some(1)) => left,
        (BinOp::Add, Some(0), _) | (BinOp::Mul, Some(1), _) => right,
        _ => asr.binop(left, op, right),
    }
}

/// The index `base + (pos - 1) * step` of the element at 1-based position `pos`.
pub fn shifted(asr: &mut Asr, base: ExprId, pos: ExprId, step: Option<ExprId>) -> ExprId {
    let one = asr.int(1);
    match step.filter(|s| asr.const_int(*s) != Some(1)) {
        None => {
            let base_minus_one = int_op(asr, base, BinOp::Sub, one);
            int_op(asr, pos, BinOp::Add, base_minus_one)
        }
        Some(step) => {
            let offset = int_op(asr, pos, BinOp::Sub, one);
            let offset = int_op(asr, offset, BinOp::Mul, step);
            int_op(asr, base, BinOp::Add, offset)
        }
    }
}

// Arrays
//
//

fn declared_dim(asr: &Asr, array: ExprId, axis: usize) -> (Dimension, bool) {
    match asr.expr_type(array) {
        Some(ty) => {
            let deferred = ty.is_allocatable() || ty.is_pointer();
            (ty.dims().get(axis).copied().unwrap_or_default(), deferred)
        }
        None => (Dimension::default(), false),
    }
}

fn bound(asr: &mut Asr, array: ExprId, axis: usize, bound: BoundKind) -> ExprId {
    let dim = asr.int(axis as i64 + 1);
    let loc = asr.expr(array).loc;
    asr.add_expr(loc, ExprKind::ArrayBound { v: array, dim: Some(dim), bound, ty: Ttype::int(), value: None })
}

/// The lower bound of `array` along `axis`.
pub fn lower_bound(asr: &mut Asr, array: ExprId, axis: usize) -> ExprId {
    match declared_dim(asr, array, axis) {
        (Dimension { start: Some(start), .. }, _) => start,
        (_, false) => asr.int(1),
        (_, true) => bound(asr, array, axis, BoundKind::LBound),
    }
}

/// The upper bound of `array` along `axis`.
pub fn upper_bound(asr: &mut Asr, array: ExprId, axis: usize) -> ExprId {
    match declared_dim(asr, array, axis) {
        (Dimension { length: Some(length), .. }, _) => {
            let start = lower_bound(asr, array, axis);
            let one = asr.int(1);
            let past_end = int_op(asr, start, BinOp::Add, length);
            int_op(asr, past_end, BinOp::Sub, one)
        }
        _ => bound(asr, array, axis, BoundKind::UBound),
    }
}

/// Whether the expression denotes a whole array object rather than a computed value.
fn is_array_object(kind: &ExprKind) -> bool {
    matches!(kind, ExprKind::Var { .. } | ExprKind::StructInstanceMember { .. })
}

pub fn is_array(asr: &Asr, expr: ExprId) -> bool {
    asr.expr_type(expr).is_some_and(|ty| ty.is_array() && !ty.is_pointer())
}

/// Whether an array section occurs in `expr` at a position evaluated element by element.
pub fn contains_section(asr: &Asr, expr: ExprId) -> bool {
    match &asr.expr(expr).kind {
        ExprKind::ArraySection { .. } => true,
        ExprKind::BinOp { left, right, .. }
        | ExprKind::Compare { left, right, .. }
        | ExprKind::LogicalBinOp { left, right, .. } => {
            contains_section(asr, *left) || contains_section(asr, *right)
        }
        ExprKind::LogicalNot { arg, .. } | ExprKind::Cast { arg, .. } => contains_section(asr, *arg),
        _ => false,
    }
}

/// The number of elements along every axis of the value of `expr`.
///
/// Empty for scalars; `None` for array values whose extents cannot be expressed.
pub fn shape(asr: &mut Asr, expr: ExprId) -> Option<Vec<ExprId>> {
    let Some(ty) = asr.expr_type(expr).cloned() else {
        return Some(vec![]);
    };
    if !ty.is_array() {
        return Some(vec![]);
    }
    let kind = asr.expr(expr).kind.clone();
    match kind {
        ExprKind::ArraySection { v, args, .. } => {
            let mut out = Vec::new();
            for (axis, idx) in args.iter().enumerate() {
                if !idx.is_slice() {
                    continue;
                }
                if let Some(length) = ty.dims().get(out.len()).and_then(|d| d.length) {
                    out.push(length);
                    continue;
                }
                let lower = match idx.left {
                    Some(l) => l,
                    None => lower_bound(asr, v, axis),
                };
                let upper = match idx.right {
                    Some(r) => r,
                    None => upper_bound(asr, v, axis),
                };
                let one = asr.int(1);
                let gap = int_op(asr, upper, BinOp::Sub, lower);
                let steps = match idx.step {
                    Some(step) => int_op(asr, gap, BinOp::Div, step),
                    None => gap,
                };
                out.push(int_op(asr, steps, BinOp::Add, one));
            }
            Some(out)
        }
        ExprKind::BinOp { left, right, .. }
        | ExprKind::Compare { left, right, .. }
        | ExprKind::LogicalBinOp { left, right, .. } => {
            let operand = if is_array(asr, left) { left } else { right };
            shape(asr, operand)
        }
        ExprKind::LogicalNot { arg, .. } | ExprKind::Cast { arg, .. } => shape(asr, arg),
        kind if is_array_object(&kind) => {
            let mut out = Vec::new();
            for (axis, dim) in ty.dims().iter().enumerate() {
                let extent = match dim.length {
                    Some(length) => length,
                    None => {
                        let axis_expr = asr.int(axis as i64 + 1);
                        let loc = asr.expr(expr).loc;
                        asr.add_expr(
                            loc,
                            ExprKind::ArraySize { v: expr, dim: Some(axis_expr), ty: Ttype::int(), value: None },
                        )
                    }
                };
                out.push(extent);
            }
            Some(out)
        }
        _ => ty.dims().iter().map(|dim| dim.length).collect(),
    }
}

/// The element of the value of `expr` at the 1-based positions `pos`, one per axis.
///
/// Scalars are their own elements. Returns `None` for array values that cannot be taken
/// apart element by element, such as the results of function calls.
pub fn element(asr: &mut Asr, expr: ExprId, pos: &[ExprId]) -> Option<ExprId> {
    if !is_array(asr, expr) {
        return Some(expr);
    }
    let loc = asr.expr(expr).loc;
    let kind = asr.expr(expr).kind.clone();
    let elementwise = |asr: &mut Asr, kind: ExprKind| asr.add_expr(loc, kind);
    match kind {
        ExprKind::ArraySection { v, args, .. } => {
            let mut indices = Vec::with_capacity(args.len());
            let mut slices = pos.iter();
            for (axis, idx) in args.iter().enumerate() {
                if idx.is_slice() {
                    let p = *slices.next()?;
                    let start = match idx.left {
                        Some(l) => l,
                        None => lower_bound(asr, v, axis),
                    };
                    indices.push(shifted(asr, start, p, idx.step));
                } else {
                    indices.push(idx.right?);
                }
            }
            let item = asr.item(v, &indices);
            asr.expr_mut(item).loc = loc;
            Some(item)
        }
        ExprKind::BinOp { left, op, right, ty, .. } => {
            let (left, right) = (element(asr, left, pos)?, element(asr, right, pos)?);
            let ty = ty.past_array().clone();
            Some(elementwise(asr, ExprKind::BinOp { left, op, right, ty, value: None }))
        }
        ExprKind::Compare { left, op, right, ty, .. } => {
            let (left, right) = (element(asr, left, pos)?, element(asr, right, pos)?);
            let ty = ty.past_array().clone();
            Some(elementwise(asr, ExprKind::Compare { left, op, right, ty, value: None }))
        }
        ExprKind::LogicalBinOp { left, op, right, ty, .. } => {
            let (left, right) = (element(asr, left, pos)?, element(asr, right, pos)?);
            let ty = ty.past_array().clone();
            Some(elementwise(asr, ExprKind::LogicalBinOp { left, op, right, ty, value: None }))
        }
        ExprKind::LogicalNot { arg, ty, .. } => {
            let arg = element(asr, arg, pos)?;
            let ty = ty.past_array().clone();
            Some(elementwise(asr, ExprKind::LogicalNot { arg, ty, value: None }))
        }
        ExprKind::Cast { arg, kind, ty, .. } => {
            let arg = element(asr, arg, pos)?;
            let ty = ty.past_array().clone();
            Some(elementwise(asr, ExprKind::Cast { arg, kind, ty, value: None }))
        }
        kind if is_array_object(&kind) => {
            let rank = asr.expr_type(expr).map_or(0, Ttype::rank);
            if pos.len() < rank {
                return None;
            }
            let mut indices = Vec::with_capacity(rank);
            for (axis, p) in pos.iter().take(rank).enumerate() {
                let start = lower_bound(asr, expr, axis);
                indices.push(shifted(asr, start, *p, None));
            }
            let item = asr.item(expr, &indices);
            asr.expr_mut(item).loc = loc;
            Some(item)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use lasr_lang_asr::ArrayIndex;

    use super::*;

    fn program_with_array(shape: &[i64]) -> (Asr, SymtabId, ExprId) {
        let mut asr = Asr::new();
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let ty = builder::array_of(&mut asr, Ttype::real(), shape);
        let y = builder::add_variable(&mut asr, scope, "y", ty).unwrap();
        let y = asr.var(y);
        (asr, scope, y)
    }

    #[test]
    fn int_op_folds_constants_and_identities() {
        let mut asr = Asr::new();
        let global = asr.global_scope();
        let i = builder::add_variable(&mut asr, global, "i", Ttype::int()).unwrap();
        let i = asr.var(i);
        let (two, three, zero) = (asr.int(2), asr.int(3), asr.int(0));

        let five = int_op(&mut asr, two, BinOp::Add, three);
        assert_eq!(asr.const_int(five), Some(5));
        assert_eq!(int_op(&mut asr, i, BinOp::Add, zero), i);
        assert_eq!(int_op(&mut asr, zero, BinOp::Add, i), i);
        let sum = int_op(&mut asr, i, BinOp::Add, two);
        assert!(matches!(asr.expr(sum).kind, ExprKind::BinOp { .. }));
    }

    #[test]
    fn section_shape_and_elements() {
        let (mut asr, scope, y) = program_with_array(&[10]);
        let (two, five) = (asr.int(2), asr.int(5));
        let section =
            asr.section(y, vec![ArrayIndex { left: Some(two), right: Some(five), step: None }]);

        let shape = shape(&mut asr, section).unwrap();
        assert_eq!(shape.iter().map(|e| asr.const_int(*e)).collect::<Vec<_>>(), [Some(4)]);

        let i = index_variable(&mut asr, scope, "i").unwrap();
        let i = asr.var(i);
        let elem = element(&mut asr, section, &[i]).unwrap();
        // y(2:5) at position i is y(i + 1)
        let ExprKind::ArrayItem { v, args, .. } = &asr.expr(elem).kind else {
            panic!("expected an array item");
        };
        assert_eq!(*v, y);
        let ExprKind::BinOp { left, op: BinOp::Add, right, .. } = asr.expr(args[0].right.unwrap()).kind
        else {
            panic!("expected an offset index");
        };
        assert_eq!(left, i);
        assert_eq!(asr.const_int(right), Some(1));
    }

    #[test]
    fn strided_section_with_default_bounds() {
        let (mut asr, _, y) = program_with_array(&[9]);
        let three = asr.int(3);
        let section = asr.section(y, vec![ArrayIndex { left: None, right: None, step: Some(three) }]);
        let shape = shape(&mut asr, section).unwrap();
        assert_eq!(asr.const_int(shape[0]), Some(3));

        let two = asr.int(2);
        let elem = element(&mut asr, section, &[two]).unwrap();
        let ExprKind::ArrayItem { args, .. } = &asr.expr(elem).kind else { panic!() };
        // 1 + (2 - 1) * 3
        assert_eq!(asr.const_int(args[0].right.unwrap()), Some(4));
    }

    #[test]
    fn elementwise_operations_distribute() {
        let (mut asr, scope, y) = program_with_array(&[3]);
        let one = asr.real(1.0);
        let sum = asr.binop(y, BinOp::Add, one);
        assert!(is_array(&asr, sum));

        let i = index_variable(&mut asr, scope, "i").unwrap();
        let i = asr.var(i);
        let elem = element(&mut asr, sum, &[i]).unwrap();
        assert!(!is_array(&asr, elem));
        let ExprKind::BinOp { left, right, ref ty, .. } = asr.expr(elem).kind else {
            panic!("expected a sum");
        };
        assert_eq!(*ty, Ttype::real());
        assert_eq!(right, one);
        let ExprKind::ArrayItem { v, ref args, .. } = asr.expr(left).kind else {
            panic!("expected an array item");
        };
        assert_eq!((v, args[0].right), (y, Some(i)));
    }

    #[test]
    fn function_results_have_no_elements() {
        let (mut asr, scope, y) = program_with_array(&[3]);
        let ty = asr.expr_type(y).cloned().unwrap();
        let f = builder::FunctionBuilder::new(&mut asr, scope, "f").returns(ty).finish().unwrap();
        let call = asr.call(f, vec![]);
        let one = asr.int(1);
        assert_eq!(element(&mut asr, call, &[one]), None);
    }

    #[test]
    fn index_variables_are_reused() {
        let (mut asr, scope, _) = program_with_array(&[3]);
        let first = index_variables(&mut asr, scope, "__i", 2).unwrap();
        let again = index_variables(&mut asr, scope, "__i", 2).unwrap();
        assert_eq!(first, again);
        assert_eq!(asr.symbol(first[1]).name(), "__i2");
    }
}
