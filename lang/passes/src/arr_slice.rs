//! Lowers array sections.
//!
//! Assignments involving sections become loops assigning one element per iteration.
//! When the value reads the array being assigned, it is first copied into a fresh
//! temporary so that no element is read after it has been overwritten. Sections passed to `intent(in)` dummy arguments are first copied into a fresh
//! contiguous temporary.

use lasr_lang_asr::{
    Allocation, Asr, Dimension, ExprId, ExprKind, Intent, StmtId, StmtKind, SymbolId, SymtabId,
    Ttype,
};

use crate::options::PassOptions;
use crate::result::PassResult;
use crate::utils::{
    BodyCtx, BodyRewriter, Rewrite, contains_section, element, fresh_variable, index_variables,
    is_array, loop_nest, map_expr_children, map_stmt_exprs, rewrite_bodies, rewrite_nested,
    set_loc, shape,
};

const INDEX_PREFIX: &str = "__slice_i";

pub fn arr_slice(asr: &mut Asr, _options: &PassOptions) -> PassResult {
    rewrite_bodies(&mut ArrSlice, asr)
}

struct ArrSlice;

impl BodyRewriter for ArrSlice {
    fn rewrite_stmt(&mut self, asr: &mut Asr, ctx: BodyCtx, stmt: StmtId) -> PassResult<Rewrite> {
        let loc = asr.stmt(stmt).loc;
        let mut before = Vec::new();
        map_stmt_exprs(asr, stmt, |asr, expr| lift_call_args(asr, ctx.scope, expr, &mut before))?;
        if let StmtKind::SubroutineCall { name, mut args, original_name, dt } = asr.stmt(stmt).kind.clone() {
            if materialize_args(asr, ctx.scope, name, &mut args, &mut before)? {
                asr.stmt_mut(stmt).kind = StmtKind::SubroutineCall { name, original_name, args, dt };
            }
        }

        if let Some(loops) = lower_assignment(asr, ctx.scope, stmt, &mut before)? {
            before.extend(loops);
            set_loc(asr, &before, loc);
            return Ok(Rewrite::Replace(before));
        }
        if before.is_empty() {
            return Ok(Rewrite::Keep);
        }
        set_loc(asr, &before, loc);
        rewrite_nested(self, asr, ctx, stmt)?;
        before.push(stmt);
        Ok(Rewrite::Replace(before))
    }
}

/// `x(...) = y(...)` as loops over the extents of the section.
fn lower_assignment(
    asr: &mut Asr,
    scope: SymtabId,
    stmt: StmtId,
    before: &mut Vec<StmtId>,
) -> PassResult<Option<Vec<StmtId>>> {
    let StmtKind::Assignment { target, mut value } = asr.stmt(stmt).kind else {
        return Ok(None);
    };
    if !is_array(asr, target) || !(contains_section(asr, target) || contains_section(asr, value)) {
        return Ok(None);
    }
    let shape_source = if contains_section(asr, target) { target } else { value };
    let Some(extents) = shape(asr, shape_source).filter(|extents| !extents.is_empty()) else {
        return Ok(None);
    };
    if contains_section(asr, value)
        && written_symbol(asr, target).is_none_or(|sym| mentions(asr, value, sym))
    {
        match materialize(asr, scope, value, before)? {
            Some(temp) => value = temp,
            None => return Ok(None),
        }
    }
    let indices = index_variables(asr, scope, INDEX_PREFIX, extents.len())?;
    let pos: Vec<ExprId> = indices.iter().map(|index| asr.var(*index)).collect();
    let (Some(target), Some(value)) = (element(asr, target, &pos), element(asr, value, &pos)) else {
        log::debug!("Cannot lower array section assignment element by element");
        return Ok(None);
    };
    let assign = asr.assign(target, value);
    let loc = asr.stmt(stmt).loc;
    Ok(Some(loop_nest(asr, &indices, &extents, vec![assign], loc)))
}

/// The variable written by an assignment to `target`.
fn written_symbol(asr: &Asr, target: ExprId) -> Option<SymbolId> {
    match asr.expr(target).kind {
        ExprKind::Var { sym } => Some(sym),
        ExprKind::ArraySection { v, .. }
        | ExprKind::ArrayItem { v, .. }
        | ExprKind::StructInstanceMember { v, .. } => written_symbol(asr, v),
        _ => None,
    }
}

fn mentions(asr: &Asr, expr: ExprId, sym: SymbolId) -> bool {
    asr.var_symbol(expr) == Some(sym)
        || asr.expr(expr).kind.children().into_iter().any(|child| mentions(asr, child, sym))
}

/// Copy sections passed to function calls inside `expr` into temporaries.
fn lift_call_args(
    asr: &mut Asr,
    scope: SymtabId,
    expr: ExprId,
    before: &mut Vec<StmtId>,
) -> PassResult<ExprId> {
    map_expr_children(asr, expr, |asr, child| lift_call_args(asr, scope, child, before))?;
    if let ExprKind::FunctionCall { name, args, .. } = &asr.expr(expr).kind {
        let (name, mut args) = (*name, args.clone());
        if materialize_args(asr, scope, name, &mut args, before)? {
            if let ExprKind::FunctionCall { args: slot, .. } = &mut asr.expr_mut(expr).kind {
                *slot = args;
            }
        }
    }
    Ok(expr)
}

/// Replace section arguments bound to `intent(in)` dummies; whether anything changed.
fn materialize_args(
    asr: &mut Asr,
    scope: SymtabId,
    callee: SymbolId,
    args: &mut [Option<ExprId>],
    before: &mut Vec<StmtId>,
) -> PassResult<bool> {
    let mut changed = false;
    for (k, slot) in args.iter_mut().enumerate() {
        let Some(arg) = *slot else {
            continue;
        };
        if !matches!(asr.expr(arg).kind, ExprKind::ArraySection { .. })
            || formal_intent(asr, callee, k) != Some(Intent::In)
        {
            continue;
        }
        if let Some(temp) = materialize(asr, scope, arg, before)? {
            *slot = Some(temp);
            changed = true;
        }
    }
    Ok(changed)
}

fn formal_intent(asr: &Asr, callee: SymbolId, k: usize) -> Option<Intent> {
    let func = asr.symbol(asr.past_external(callee)).as_function()?;
    let formal = asr.var_symbol(*func.args.get(k)?)?;
    Some(asr.symbol(formal).as_variable()?.intent)
}

/// A `__lasr_slice` temporary holding the elements of `section`.
fn materialize(
    asr: &mut Asr,
    scope: SymtabId,
    section: ExprId,
    before: &mut Vec<StmtId>,
) -> PassResult<Option<ExprId>> {
    let Some(extents) = shape(asr, section).filter(|extents| !extents.is_empty()) else {
        return Ok(None);
    };
    let indices = index_variables(asr, scope, INDEX_PREFIX, extents.len())?;
    let pos: Vec<ExprId> = indices.iter().map(|index| asr.var(*index)).collect();
    let Some(value) = element(asr, section, &pos) else {
        return Ok(None);
    };

    let elem = asr.expr_type(section).map_or_else(Ttype::int, |ty| ty.past_array().clone());
    let constant = extents.iter().all(|extent| asr.const_int(*extent).is_some());
    let ty = if constant {
        let dims = extents
            .iter()
            .map(|extent| Dimension { start: Some(asr.int(1)), length: Some(*extent) })
            .collect();
        Ttype::array(elem, dims)
    } else {
        Ttype::Allocatable(Box::new(Ttype::array(elem, vec![Dimension::default(); extents.len()])))
    };
    let temp = fresh_variable(asr, scope, "__lasr_slice", ty)?;
    log::trace!("Copying an array section into `{}`", asr.symbol(temp).name());

    if !constant {
        let a = asr.var(temp);
        let dims = extents
            .iter()
            .map(|extent| Dimension { start: Some(asr.int(1)), length: Some(*extent) })
            .collect();
        let loc = asr.expr(section).loc;
        before.push(asr.add_stmt(loc, StmtKind::Allocate { args: vec![Allocation { a, dims }] }));
    }
    let temp_ref = asr.var(temp);
    let Some(target) = element(asr, temp_ref, &pos) else {
        return Ok(None);
    };
    let assign = asr.assign(target, value);
    let loc = asr.expr(section).loc;
    before.extend(loop_nest(asr, &indices, &extents, vec![assign], loc));

    let arg = asr.var(temp);
    asr.expr_mut(arg).loc = loc;
    Ok(Some(arg))
}
