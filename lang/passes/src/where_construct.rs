//! Lowers `where (mask) ... elsewhere ... end where` into loops over the mask.

use lasr_lang_asr::{Asr, ExprId, StmtId, StmtKind};

use crate::options::PassOptions;
use crate::result::PassResult;
use crate::utils::{BodyCtx, BodyRewriter, Rewrite, element, index_variables, loop_nest, rewrite_bodies, shape};

pub fn where_construct(asr: &mut Asr, _options: &PassOptions) -> PassResult {
    rewrite_bodies(&mut Where, asr)
}

struct Where;

impl BodyRewriter for Where {
    fn rewrite_stmt(&mut self, asr: &mut Asr, ctx: BodyCtx, stmt: StmtId) -> PassResult<Rewrite> {
        let StmtKind::Where { test, .. } = asr.stmt(stmt).kind else {
            return Ok(Rewrite::Keep);
        };
        let Some(extents) = shape(asr, test).filter(|extents| !extents.is_empty()) else {
            return Ok(Rewrite::Keep);
        };
        let indices = index_variables(asr, ctx.scope, "__where_i", extents.len())?;
        let pos: Vec<ExprId> = indices.iter().map(|index| asr.var(*index)).collect();
        let Some(chain) = lower_where(asr, stmt, &pos) else {
            log::debug!("Leaving a where construct with unsupported contents in place");
            return Ok(Rewrite::Keep);
        };
        let loc = asr.stmt(stmt).loc;
        Ok(Rewrite::Replace(loop_nest(asr, &indices, &extents, vec![chain], loc)))
    }
}

/// The `If` testing one element of the mask of the where statement `stmt`.
fn lower_where(asr: &mut Asr, stmt: StmtId, pos: &[ExprId]) -> Option<StmtId> {
    let StmtKind::Where { test, body, orelse } = asr.stmt(stmt).kind.clone() else {
        return None;
    };
    let test = element(asr, test, pos)?;
    let body = lower_block(asr, &body, pos)?;
    let orelse = match orelse.as_slice() {
        // `elsewhere (mask)` continues the chain
        [nested] if matches!(asr.stmt(*nested).kind, StmtKind::Where { .. }) => {
            vec![lower_where(asr, *nested, pos)?]
        }
        _ => lower_block(asr, &orelse, pos)?,
    };
    let lowered = asr.if_stmt(test, body, orelse);
    asr.stmt_mut(lowered).loc = asr.stmt(stmt).loc;
    Some(lowered)
}

fn lower_block(asr: &mut Asr, stmts: &[StmtId], pos: &[ExprId]) -> Option<Vec<StmtId>> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        let lowered = match asr.stmt(*stmt).kind {
            StmtKind::Assignment { target, value } => {
                let target = element(asr, target, pos)?;
                let value = element(asr, value, pos)?;
                let assign = asr.assign(target, value);
                asr.stmt_mut(assign).loc = asr.stmt(*stmt).loc;
                assign
            }
            StmtKind::Where { .. } => lower_where(asr, *stmt, pos)?,
            _ => return None,
        };
        out.push(lowered);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use lasr_lang_asr::builder;
    use lasr_lang_asr::{CmpOp, ExprKind, Location, SymbolId, Ttype};
    use lasr_lang_verify::verify;

    use super::*;

    struct Fixture {
        asr: Asr,
        main: SymbolId,
        a: ExprId,
        b: ExprId,
    }

    fn fixture() -> Fixture {
        let mut asr = Asr::new();
        let main = builder::add_program(&mut asr, "main").unwrap();
        let scope = asr.symbol(main).symtab().unwrap();
        let ty = builder::array_of(&mut asr, Ttype::real(), &[3]);
        let a = builder::add_variable(&mut asr, scope, "a", ty.clone()).unwrap();
        let b = builder::add_variable(&mut asr, scope, "b", ty).unwrap();
        let (a, b) = (asr.var(a), asr.var(b));
        Fixture { asr, main, a, b }
    }

    /// `array op 0.0` as a logical array.
    fn mask(f: &mut Fixture, array: ExprId, op: CmpOp) -> ExprId {
        let zero = f.asr.real(0.0);
        let ty = builder::array_of(&mut f.asr, Ttype::logical(), &[3]);
        f.asr.add_expr(
            Location::initial(),
            ExprKind::Compare { left: array, op, right: zero, ty, value: None },
        )
    }

    fn where_stmt(f: &mut Fixture, test: ExprId, body: Vec<StmtId>, orelse: Vec<StmtId>) -> StmtId {
        f.asr.add_stmt(Location::initial(), StmtKind::Where { test, body, orelse })
    }

    fn lowered_if(f: &Fixture) -> StmtKind {
        let body = f.asr.symbol(f.main).body().unwrap();
        assert_eq!(body.len(), 1);
        let StmtKind::DoLoop { body: inner, .. } = &f.asr.stmt(body[0]).kind else {
            panic!("expected a do loop");
        };
        f.asr.stmt(inner[0]).kind.clone()
    }

    #[test]
    fn where_with_elsewhere() {
        let mut f = fixture();
        let a = f.a;
        let test = mask(&mut f, a, CmpOp::Gt);
        let copy = f.asr.assign(f.a, f.b);
        let zero = f.asr.real(0.0);
        let clear = f.asr.assign(f.a, zero);
        let stmt = where_stmt(&mut f, test, vec![copy], vec![clear]);
        builder::push_stmt(&mut f.asr, f.main, stmt);

        where_construct(&mut f.asr, &PassOptions::default()).unwrap();
        verify(&f.asr, true).unwrap();

        let StmtKind::If { test, body, orelse } = lowered_if(&f) else { panic!("expected an if") };
        assert_eq!(f.asr.expr_type(test), Some(&Ttype::logical()));
        let StmtKind::Assignment { target, value } = f.asr.stmt(body[0]).kind else { panic!() };
        assert!(matches!(f.asr.expr(target).kind, ExprKind::ArrayItem { v, .. } if v == f.a));
        assert!(matches!(f.asr.expr(value).kind, ExprKind::ArrayItem { v, .. } if v == f.b));
        let StmtKind::Assignment { value, .. } = f.asr.stmt(orelse[0]).kind else { panic!() };
        assert_eq!(value, zero);
    }

    #[test]
    fn masked_elsewhere_becomes_else_if() {
        let mut f = fixture();
        let a = f.a;
        let positive = mask(&mut f, a, CmpOp::Gt);
        let negative = mask(&mut f, a, CmpOp::Lt);
        let copy = f.asr.assign(f.a, f.b);
        let copy_back = f.asr.assign(f.b, f.a);
        let inner = where_stmt(&mut f, negative, vec![copy_back], vec![]);
        let stmt = where_stmt(&mut f, positive, vec![copy], vec![inner]);
        builder::push_stmt(&mut f.asr, f.main, stmt);

        where_construct(&mut f.asr, &PassOptions::default()).unwrap();
        verify(&f.asr, true).unwrap();

        let StmtKind::If { orelse, .. } = lowered_if(&f) else { panic!("expected an if") };
        assert_eq!(orelse.len(), 1);
        assert!(matches!(f.asr.stmt(orelse[0]).kind, StmtKind::If { .. }));
    }

    #[test]
    fn unsupported_body_stays() {
        let mut f = fixture();
        let a = f.a;
        let test = mask(&mut f, a, CmpOp::Gt);
        let show = f.asr.print(vec![f.a]);
        let stmt = where_stmt(&mut f, test, vec![show], vec![]);
        builder::push_stmt(&mut f.asr, f.main, stmt);

        where_construct(&mut f.asr, &PassOptions::default()).unwrap();
        assert_eq!(f.asr.symbol(f.main).body().unwrap(), &vec![stmt]);
    }
}
