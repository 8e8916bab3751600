use lasr_lang_asr::builder;
use lasr_lang_asr::{Asr, Item, Symbol, Ttype};

use crate::options::PassOptions;
use crate::result::PassResult;

/// Name of the program collecting the loose statements of a translation unit.
pub const GLOBAL_STMTS_PROGRAM: &str = "_lasr_global_stmts";

/// Move the top-level statements of the translation unit into a program.
///
/// Top-level expressions are evaluated into fresh global variables `_lasr_expr_N` so that
/// their values stay observable after the move.
pub fn global_stmts(asr: &mut Asr, _options: &PassOptions) -> PassResult {
    if asr.unit.items.is_empty() {
        return Ok(());
    }
    let global = asr.global_scope();
    let program = match asr.symtab(global).get(GLOBAL_STMTS_PROGRAM) {
        Some(sym) if matches!(asr.symbol(sym), Symbol::Program(_)) => sym,
        Some(_) => {
            let name = asr.get_unique_name(global, GLOBAL_STMTS_PROGRAM);
            builder::add_program(asr, &name)?
        }
        None => builder::add_program(asr, GLOBAL_STMTS_PROGRAM)?,
    };

    let items = std::mem::take(&mut asr.unit.items);
    log::trace!("Moving {} top-level items into `{}`", items.len(), asr.symbol(program).name());
    let mut n = 0;
    for item in items {
        let stmt = match item {
            Item::Stmt(stmt) => stmt,
            Item::Expr(expr) => {
                let name = loop {
                    n += 1;
                    let candidate = format!("_lasr_expr_{n}");
                    if !asr.symtab(global).contains(&candidate) {
                        break candidate;
                    }
                };
                let ty = asr.expr_type(expr).cloned().unwrap_or_else(Ttype::int);
                let var = builder::add_variable(asr, global, &name, ty)?;
                let target = asr.var(var);
                let loc = asr.expr(expr).loc;
                asr.expr_mut(target).loc = loc;
                asr.assign(target, expr)
            }
        };
        builder::push_stmt(asr, program, stmt);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use lasr_lang_asr::{BinOp, ExprKind, StmtKind};
    use lasr_lang_verify::verify;

    use super::*;

    #[test]
    fn statements_and_expressions_move_into_program() {
        let mut asr = Asr::new();
        let global = asr.global_scope();
        let x = builder::add_variable(&mut asr, global, "x", Ttype::int()).unwrap();
        let (target, one) = (asr.var(x), asr.int(1));
        let assign = asr.assign(target, one);
        let (x_ref, two) = (asr.var(x), asr.int(2));
        let sum = asr.binop(x_ref, BinOp::Add, two);
        let flag = asr.logical(true);
        asr.unit.items = vec![Item::Stmt(assign), Item::Expr(sum), Item::Expr(flag)];

        global_stmts(&mut asr, &PassOptions::default()).unwrap();
        verify(&asr, true).unwrap();
        assert!(asr.unit.items.is_empty());

        let program = asr.symtab(global).get(GLOBAL_STMTS_PROGRAM).unwrap();
        let body = asr.symbol(program).body().unwrap().clone();
        assert_eq!(body.len(), 3);
        assert_eq!(body[0], assign);

        let StmtKind::Assignment { target, value } = asr.stmt(body[1]).kind else {
            panic!("expected an assignment");
        };
        assert_eq!(value, sum);
        let expr_1 = asr.symtab(global).get("_lasr_expr_1").unwrap();
        assert_eq!(asr.var_symbol(target), Some(expr_1));
        assert_eq!(asr.symbol_type(expr_1), Some(&Ttype::int()));

        let expr_2 = asr.symtab(global).get("_lasr_expr_2").unwrap();
        assert_eq!(asr.symbol_type(expr_2), Some(&Ttype::logical()));
    }

    #[test]
    fn existing_program_is_extended() {
        let mut asr = Asr::new();
        let global = asr.global_scope();
        builder::add_variable(&mut asr, global, "_lasr_expr_1", Ttype::real()).unwrap();
        let program = builder::add_program(&mut asr, GLOBAL_STMTS_PROGRAM).unwrap();
        let first = asr.return_stmt();
        builder::push_stmt(&mut asr, program, first);

        let value = asr.int(7);
        asr.unit.items.push(Item::Expr(value));
        global_stmts(&mut asr, &PassOptions::default()).unwrap();
        verify(&asr, true).unwrap();

        let body = asr.symbol(program).body().unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0], first);
        let StmtKind::Assignment { target, .. } = asr.stmt(body[1]).kind else { panic!() };
        let sym = asr.var_symbol(target).unwrap();
        assert_eq!(asr.symbol(sym).name(), "_lasr_expr_2");
        assert!(matches!(asr.expr(value).kind, ExprKind::IntegerConstant { n: 7, .. }));
    }

    #[test]
    fn nothing_to_do_without_items() {
        let mut asr = Asr::new();
        global_stmts(&mut asr, &PassOptions::default()).unwrap();
        assert!(asr.symtab(asr.global_scope()).is_empty());
    }
}
