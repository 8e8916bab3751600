//! Deep copies of expressions, statements and types.

use lasr_lang_miette_util::ToMiette;

use crate::{
    Allocation, Asr, AsrError, AsrResult, Dimension, DoLoopHead, ExprId, ExprKind, HashMap,
    Location, StmtId, StmtKind, SymbolId, SymtabId, Ttype,
};

/// Copies expression and statement trees into fresh arena nodes.
///
/// Symbol references are copied unchanged unless they appear in `symbol_map`. With a
/// `target_scope`, every unmapped reference must be visible from that scope, otherwise
/// duplication fails; callers treat that as "this tree cannot be moved there".
#[derive(Debug, Default)]
pub struct ExprStmtDuplicator {
    pub allow_procedure_calls: bool,
    pub symbol_map: HashMap<SymbolId, SymbolId>,
    pub target_scope: Option<SymtabId>,
}

impl ExprStmtDuplicator {
    pub fn new(allow_procedure_calls: bool) -> ExprStmtDuplicator {
        ExprStmtDuplicator { allow_procedure_calls, ..Default::default() }
    }

    fn map_symbol(&self, asr: &Asr, sym: SymbolId, loc: Location) -> AsrResult<SymbolId> {
        if let Some(mapped) = self.symbol_map.get(&sym) {
            return Ok(*mapped);
        }
        match (self.target_scope, asr.parent_symtab(sym)) {
            (Some(target), Some(owner)) if !asr.symtab_encloses(owner, target) => {
                Err(AsrError::CannotDuplicate {
                    what: format!("reference to `{}` outside of the target scope", asr.symbol(sym).name()),
                    span: Some(loc.to_miette()),
                })
            }
            _ => Ok(sym),
        }
    }

    fn procedure_call(&self, loc: Location) -> AsrResult {
        if self.allow_procedure_calls {
            Ok(())
        } else {
            Err(AsrError::CannotDuplicate {
                what: "procedure call".to_owned(),
                span: Some(loc.to_miette()),
            })
        }
    }

    pub fn duplicate_expr(&mut self, asr: &mut Asr, expr: ExprId) -> AsrResult<ExprId> {
        let loc = asr.expr(expr).loc;
        let mut kind = asr.expr(expr).kind.clone();
        match &mut kind {
            ExprKind::Var { sym } => *sym = self.map_symbol(asr, *sym, loc)?,
            ExprKind::FunctionCall { name, original_name, .. } => {
                self.procedure_call(loc)?;
                *name = self.map_symbol(asr, *name, loc)?;
                if let Some(orig) = original_name {
                    *orig = self.map_symbol(asr, *orig, loc)?;
                }
            }
            ExprKind::StructConstructor { dt_sym, .. } => {
                *dt_sym = self.map_symbol(asr, *dt_sym, loc)?
            }
            _ => {}
        }
        for slot in kind.children_mut() {
            *slot = self.duplicate_expr(asr, *slot)?;
        }
        if let Some(ty) = kind.ty_mut() {
            *ty = self.duplicate_ttype(asr, ty)?;
        }
        Ok(asr.add_expr(loc, kind))
    }

    fn duplicate_opt(&mut self, asr: &mut Asr, expr: Option<ExprId>) -> AsrResult<Option<ExprId>> {
        expr.map(|e| self.duplicate_expr(asr, e)).transpose()
    }

    fn duplicate_all(&mut self, asr: &mut Asr, exprs: &[ExprId]) -> AsrResult<Vec<ExprId>> {
        exprs.iter().map(|e| self.duplicate_expr(asr, *e)).collect()
    }

    fn duplicate_args(
        &mut self,
        asr: &mut Asr,
        args: &[Option<ExprId>],
    ) -> AsrResult<Vec<Option<ExprId>>> {
        args.iter().map(|a| self.duplicate_opt(asr, *a)).collect()
    }

    fn duplicate_dims(&mut self, asr: &mut Asr, dims: &[Dimension]) -> AsrResult<Vec<Dimension>> {
        let mut out = Vec::with_capacity(dims.len());
        for dim in dims {
            out.push(Dimension {
                start: self.duplicate_opt(asr, dim.start)?,
                length: self.duplicate_opt(asr, dim.length)?,
            });
        }
        Ok(out)
    }

    pub fn duplicate_ttype(&mut self, asr: &mut Asr, ty: &Ttype) -> AsrResult<Ttype> {
        Ok(match ty {
            Ttype::Struct { derived_type } => Ttype::Struct {
                derived_type: self.map_symbol(asr, *derived_type, Location::initial())?,
            },
            Ttype::Array { elem, dims } => Ttype::Array {
                elem: Box::new(self.duplicate_ttype(asr, elem)?),
                dims: self.duplicate_dims(asr, dims)?,
            },
            Ttype::Pointer(inner) => Ttype::Pointer(Box::new(self.duplicate_ttype(asr, inner)?)),
            Ttype::Allocatable(inner) => {
                Ttype::Allocatable(Box::new(self.duplicate_ttype(asr, inner)?))
            }
            Ttype::List(inner) => Ttype::List(Box::new(self.duplicate_ttype(asr, inner)?)),
            Ttype::Tuple(elems) => Ttype::Tuple(
                elems.iter().map(|t| self.duplicate_ttype(asr, t)).collect::<AsrResult<_>>()?,
            ),
            other => other.clone(),
        })
    }

    pub fn duplicate_body(&mut self, asr: &mut Asr, body: &[StmtId]) -> AsrResult<Vec<StmtId>> {
        body.iter().map(|s| self.duplicate_stmt(asr, *s)).collect()
    }

    pub fn duplicate_stmt(&mut self, asr: &mut Asr, stmt: StmtId) -> AsrResult<StmtId> {
        let loc = asr.stmt(stmt).loc;
        let kind = match asr.stmt(stmt).kind.clone() {
            StmtKind::Assignment { target, value } => StmtKind::Assignment {
                target: self.duplicate_expr(asr, target)?,
                value: self.duplicate_expr(asr, value)?,
            },
            StmtKind::DoLoop { head, body } => StmtKind::DoLoop {
                head: DoLoopHead {
                    v: self.duplicate_expr(asr, head.v)?,
                    start: self.duplicate_expr(asr, head.start)?,
                    end: self.duplicate_expr(asr, head.end)?,
                    increment: self.duplicate_opt(asr, head.increment)?,
                },
                body: self.duplicate_body(asr, &body)?,
            },
            StmtKind::If { test, body, orelse } => StmtKind::If {
                test: self.duplicate_expr(asr, test)?,
                body: self.duplicate_body(asr, &body)?,
                orelse: self.duplicate_body(asr, &orelse)?,
            },
            StmtKind::Where { test, body, orelse } => StmtKind::Where {
                test: self.duplicate_expr(asr, test)?,
                body: self.duplicate_body(asr, &body)?,
                orelse: self.duplicate_body(asr, &orelse)?,
            },
            StmtKind::Print { values, separator, end } => StmtKind::Print {
                values: self.duplicate_all(asr, &values)?,
                separator: self.duplicate_opt(asr, separator)?,
                end: self.duplicate_opt(asr, end)?,
            },
            StmtKind::SubroutineCall { name, original_name, args, dt } => {
                self.procedure_call(loc)?;
                StmtKind::SubroutineCall {
                    name: self.map_symbol(asr, name, loc)?,
                    original_name: original_name
                        .map(|orig| self.map_symbol(asr, orig, loc))
                        .transpose()?,
                    args: self.duplicate_args(asr, &args)?,
                    dt: self.duplicate_opt(asr, dt)?,
                }
            }
            StmtKind::BlockCall { label, m } => {
                StmtKind::BlockCall { label, m: self.map_symbol(asr, m, loc)? }
            }
            StmtKind::Allocate { args } => {
                let mut out = Vec::with_capacity(args.len());
                for alloc in args {
                    out.push(Allocation {
                        a: self.duplicate_expr(asr, alloc.a)?,
                        dims: self.duplicate_dims(asr, &alloc.dims)?,
                    });
                }
                StmtKind::Allocate { args: out }
            }
            StmtKind::ExplicitDeallocate { vars } => {
                StmtKind::ExplicitDeallocate { vars: self.duplicate_all(asr, &vars)? }
            }
            kind @ (StmtKind::Return | StmtKind::Exit | StmtKind::Cycle | StmtKind::GoTo { .. }) => {
                kind
            }
        };
        Ok(asr.add_stmt(loc, kind))
    }
}

#[cfg(test)]
mod tests {
    use lasr_lang_printer::PrintToStringInCtx;

    use crate::builder::{self, FunctionBuilder};
    use crate::{BinOp, Intent};

    use super::*;

    #[test]
    fn copies_are_fresh_and_equal() {
        let mut asr = Asr::new();
        let global = asr.global_scope();
        let x = builder::add_variable(&mut asr, global, "x", Ttype::int()).unwrap();
        let xv = asr.var(x);
        let one = asr.int(1);
        let sum = asr.binop(xv, BinOp::Add, one);

        let copy = ExprStmtDuplicator::new(false).duplicate_expr(&mut asr, sum).unwrap();
        assert_ne!(copy, sum);
        assert_eq!(
            copy.print_to_string_in_ctx(&asr, None),
            sum.print_to_string_in_ctx(&asr, None)
        );
    }

    #[test]
    fn calls_need_permission() {
        let mut asr = Asr::new();
        let global = asr.global_scope();
        let f = FunctionBuilder::new(&mut asr, global, "f").returns(Ttype::int()).finish().unwrap();
        let call = asr.call(f, vec![]);

        let denied = ExprStmtDuplicator::new(false).duplicate_expr(&mut asr, call);
        assert!(matches!(denied, Err(AsrError::CannotDuplicate { .. })));
        assert!(ExprStmtDuplicator::new(true).duplicate_expr(&mut asr, call).is_ok());
    }

    #[test]
    fn symbol_map_and_target_scope() {
        let mut asr = Asr::new();
        let global = asr.global_scope();
        let callee = FunctionBuilder::new(&mut asr, global, "g")
            .arg("a", Ttype::int(), Intent::In)
            .local("t", Ttype::int())
            .finish()
            .unwrap();
        let callee_scope = asr.symbol(callee).symtab().unwrap();
        let a = asr.symtab(callee_scope).get("a").unwrap();
        let t = asr.symtab(callee_scope).get("t").unwrap();
        let caller = builder::add_program(&mut asr, "main").unwrap();
        let caller_scope = asr.symbol(caller).symtab().unwrap();
        let a_copy = builder::add_variable(&mut asr, caller_scope, "a_g", Ttype::int()).unwrap();

        let av = asr.var(a);
        let tv = asr.var(t);
        let stmt = asr.assign(tv, av);

        let mut dup = ExprStmtDuplicator {
            target_scope: Some(caller_scope),
            ..ExprStmtDuplicator::new(false)
        };
        dup.symbol_map.insert(a, a_copy);
        // `t` is neither mapped nor visible from the program
        assert!(dup.duplicate_stmt(&mut asr, stmt).is_err());

        let t_copy = builder::add_variable(&mut asr, caller_scope, "t_g", Ttype::int()).unwrap();
        dup.symbol_map.insert(t, t_copy);
        let copy = dup.duplicate_stmt(&mut asr, stmt).unwrap();
        let StmtKind::Assignment { target, value } = asr.stmt(copy).kind else { panic!() };
        assert_eq!(asr.var_symbol(target), Some(t_copy));
        assert_eq!(asr.var_symbol(value), Some(a_copy));
    }
}
