//! Turns local allocatable arrays that are always allocated with the same constant shape
//! into fixed-size arrays.

use lasr_lang_asr::visit::{Visitor, walk_expr, walk_stmt};
use lasr_lang_asr::{
    Asr, Dimension, ExprId, ExprKind, HashMap, HashSet, Intent, StmtId, StmtKind, Storage, Symbol,
    SymbolId, Ttype,
};

use crate::options::PassOptions;
use crate::result::PassResult;
use crate::utils::{BodyCtx, BodyRewriter, Rewrite, rewrite_symbol_body};

pub fn promote_allocatable_to_nonallocatable(asr: &mut Asr, _options: &PassOptions) -> PassResult {
    for owner in asr.symbols_in(asr.global_scope()) {
        promote_in(asr, owner)?;
    }
    Ok(())
}

/// Constant `(start, length)` of every axis.
type Shape = Vec<(i64, i64)>;

/// How the allocatable locals of one body are used; `None` once a variable cannot be
/// promoted.
struct Usage {
    shapes: HashMap<SymbolId, Option<Shape>>,
}

impl Usage {
    fn disqualify(&mut self, asr: &Asr, expr: ExprId) {
        if let Some(sym) = asr.var_symbol(expr) {
            if let Some(slot) = self.shapes.get_mut(&sym) {
                *slot = None;
            }
        }
    }
}

impl Visitor for Usage {
    fn visit_stmt(&mut self, asr: &Asr, stmt: StmtId) {
        match &asr.stmt(stmt).kind {
            StmtKind::Allocate { args } => {
                for alloc in args {
                    let Some(sym) = asr.var_symbol(alloc.a) else {
                        continue;
                    };
                    let Some(slot) = self.shapes.get_mut(&sym) else {
                        continue;
                    };
                    let shape = constant_shape(asr, &alloc.dims);
                    *slot = match (slot.take(), shape) {
                        (Some(seen), Some(shape)) if seen.is_empty() || seen == shape => Some(shape),
                        _ => None,
                    };
                }
            }
            StmtKind::SubroutineCall { args, .. } => {
                args.iter().flatten().for_each(|arg| self.disqualify(asr, *arg));
            }
            _ => {}
        }
        walk_stmt(self, asr, stmt)
    }

    fn visit_expr(&mut self, asr: &Asr, expr: ExprId) {
        match &asr.expr(expr).kind {
            ExprKind::FunctionCall { args, .. } => {
                args.iter().flatten().for_each(|arg| self.disqualify(asr, *arg));
            }
            ExprKind::Allocated { v, .. } => self.disqualify(asr, *v),
            _ => {}
        }
        walk_expr(self, asr, expr)
    }
}

fn constant_shape(asr: &Asr, dims: &[Dimension]) -> Option<Shape> {
    dims.iter()
        .map(|dim| {
            let start = match dim.start {
                Some(start) => asr.const_int(start)?,
                None => 1,
            };
            Some((start, asr.const_int(dim.length?)?))
        })
        .collect()
}

fn promote_in(asr: &mut Asr, owner: SymbolId) -> PassResult {
    let (Some(scope), Some(body)) = (asr.symbol(owner).symtab(), asr.symbol(owner).body()) else {
        return Ok(());
    };
    let body = body.clone();
    let candidates = asr.symtab(scope).symbols().into_iter().filter(|sym| {
        matches!(
            asr.symbol(*sym),
            Symbol::Variable(v) if v.ty.is_allocatable()
                && v.ty.is_array()
                && v.intent == Intent::Local
                && v.storage == Storage::Default
        )
    });
    // an empty shape marks "declared, no allocation seen yet"
    let mut usage = Usage { shapes: candidates.map(|sym| (sym, Some(vec![]))).collect() };
    if usage.shapes.is_empty() {
        return Ok(());
    }
    body.iter().for_each(|stmt| usage.visit_stmt(asr, *stmt));

    let mut promoted = HashSet::default();
    for (sym, shape) in usage.shapes {
        let Some(shape) = shape.filter(|shape| !shape.is_empty()) else {
            continue;
        };
        let dims = shape
            .iter()
            .map(|(start, length)| Dimension { start: Some(asr.int(*start)), length: Some(asr.int(*length)) })
            .collect();
        if let Some(var) = asr.symbol_mut(sym).as_variable_mut() {
            let elem = var.ty.past_array().clone();
            var.ty = Ttype::array(elem, dims);
            log::debug!("Promoted allocatable array `{}` to a fixed-size array", var.name);
        }
        promoted.insert(sym);
    }
    if promoted.is_empty() {
        return Ok(());
    }
    rewrite_symbol_body(&mut DropAllocations { promoted }, asr, owner)
}

/// Removes the promoted variables from `allocate` and `deallocate` statements.
struct DropAllocations {
    promoted: HashSet<SymbolId>,
}

impl DropAllocations {
    fn is_promoted(&self, asr: &Asr, expr: ExprId) -> bool {
        asr.var_symbol(expr).is_some_and(|sym| self.promoted.contains(&sym))
    }
}

impl BodyRewriter for DropAllocations {
    fn rewrite_stmt(&mut self, asr: &mut Asr, _ctx: BodyCtx, stmt: StmtId) -> PassResult<Rewrite> {
        let kind = match &asr.stmt(stmt).kind {
            StmtKind::Allocate { args } => {
                let args: Vec<_> = args.iter().filter(|a| !self.is_promoted(asr, a.a)).cloned().collect();
                (!args.is_empty()).then_some(StmtKind::Allocate { args })
            }
            StmtKind::ExplicitDeallocate { vars } => {
                let vars: Vec<_> = vars.iter().copied().filter(|v| !self.is_promoted(asr, *v)).collect();
                (!vars.is_empty()).then_some(StmtKind::ExplicitDeallocate { vars })
            }
            _ => return Ok(Rewrite::Keep),
        };
        match kind {
            Some(kind) => {
                asr.stmt_mut(stmt).kind = kind;
                Ok(Rewrite::Keep)
            }
            None => Ok(Rewrite::Replace(vec![])),
        }
    }
}

#[cfg(test)]
mod tests {
    use lasr_lang_asr::builder::{self, FunctionBuilder};
    use lasr_lang_asr::{Allocation, Location, SymtabId};
    use lasr_lang_verify::verify;

    use super::*;

    struct Fixture {
        asr: Asr,
        main: SymbolId,
        scope: SymtabId,
        a: SymbolId,
    }

    fn fixture() -> Fixture {
        let mut asr = Asr::new();
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let ty = Ttype::Allocatable(Box::new(Ttype::array(Ttype::real(), vec![Dimension::default()])));
        let a = builder::add_variable(&mut asr, scope, "a", ty).unwrap();
        Fixture { asr, main, scope, a }
    }

    fn allocate(f: &mut Fixture, length: ExprId) -> StmtId {
        let a = f.asr.var(f.a);
        let start = f.asr.int(1);
        let dims = vec![Dimension { start: Some(start), length: Some(length) }];
        let stmt = f.asr.add_stmt(
            Location::initial(),
            StmtKind::Allocate { args: vec![Allocation { a, dims }] },
        );
        builder::push_stmt(&mut f.asr, f.main, stmt);
        stmt
    }

    fn use_and_free(f: &mut Fixture) -> StmtId {
        let a = f.asr.var(f.a);
        let (one, x) = (f.asr.int(1), f.asr.real(1.0));
        let item = f.asr.item(a, &[one]);
        let assign = f.asr.assign(item, x);
        builder::push_stmt(&mut f.asr, f.main, assign);
        let a = f.asr.var(f.a);
        let free = f.asr.add_stmt(
            Location::initial(),
            StmtKind::ExplicitDeallocate { vars: vec![a] },
        );
        builder::push_stmt(&mut f.asr, f.main, free);
        assign
    }

    fn run(f: &mut Fixture) {
        promote_allocatable_to_nonallocatable(&mut f.asr, &PassOptions::default()).unwrap();
        verify(&f.asr, true).unwrap();
    }

    #[test]
    fn constant_allocation_is_promoted() {
        let mut f = fixture();
        let five = f.asr.int(5);
        allocate(&mut f, five);
        let assign = use_and_free(&mut f);
        run(&mut f);

        let ty = f.asr.symbol_type(f.a).unwrap().clone();
        assert!(!ty.is_allocatable());
        assert_eq!(f.asr.const_shape(&ty), Some(vec![5]));
        assert_eq!(f.asr.symbol(f.main).body().unwrap(), &vec![assign]);
    }

    #[test]
    fn runtime_shape_stays_allocatable() {
        let mut f = fixture();
        let n = builder::add_variable(&mut f.asr, f.scope, "n", Ttype::int()).unwrap();
        let n = f.asr.var(n);
        allocate(&mut f, n);
        use_and_free(&mut f);
        run(&mut f);

        assert!(f.asr.symbol_type(f.a).unwrap().is_allocatable());
        assert_eq!(f.asr.symbol(f.main).body().unwrap().len(), 3);
    }

    #[test]
    fn arrays_passed_to_procedures_stay_allocatable() {
        let mut f = fixture();
        let five = f.asr.int(5);
        allocate(&mut f, five);
        let global = f.asr.global_scope();
        let ty = f.asr.symbol_type(f.a).unwrap().clone();
        let consume = FunctionBuilder::new(&mut f.asr, global, "consume")
            .arg("b", ty, Intent::InOut)
            .finish()
            .unwrap();
        let a = f.asr.var(f.a);
        let call = f.asr.subroutine_call(consume, vec![a]);
        builder::push_stmt(&mut f.asr, f.main, call);
        run(&mut f);

        assert!(f.asr.symbol_type(f.a).unwrap().is_allocatable());
    }
}
