//! Read-only traversal of a translation unit.
//!
//! Implementors override the `visit_*` methods they care about and call the matching
//! `walk_*` function to continue into the children.

use crate::{Asr, ExprId, Item, StmtId, Symbol, SymbolId, SymtabId, Ttype};

pub trait Visitor {
    fn visit_symtab(&mut self, asr: &Asr, symtab: SymtabId) {
        walk_symtab(self, asr, symtab)
    }

    fn visit_symbol(&mut self, asr: &Asr, sym: SymbolId) {
        walk_symbol(self, asr, sym)
    }

    fn visit_stmt(&mut self, asr: &Asr, stmt: StmtId) {
        walk_stmt(self, asr, stmt)
    }

    fn visit_expr(&mut self, asr: &Asr, expr: ExprId) {
        walk_expr(self, asr, expr)
    }

    fn visit_ttype(&mut self, asr: &Asr, ty: &Ttype) {
        walk_ttype(self, asr, ty)
    }
}

pub fn walk_unit<V: Visitor + ?Sized>(v: &mut V, asr: &Asr) {
    v.visit_symtab(asr, asr.global_scope());
    for item in &asr.unit.items {
        match item {
            Item::Stmt(stmt) => v.visit_stmt(asr, *stmt),
            Item::Expr(expr) => v.visit_expr(asr, *expr),
        }
    }
}

pub fn walk_symtab<V: Visitor + ?Sized>(v: &mut V, asr: &Asr, symtab: SymtabId) {
    for (_, sym) in asr.symtab(symtab).scope() {
        // Symbols registered under a second name (e.g. after a rename) are visited
        // only from the table that owns them.
        if asr.parent_symtab(sym) == Some(symtab) {
            v.visit_symbol(asr, sym);
        }
    }
}

pub fn walk_symbol<V: Visitor + ?Sized>(v: &mut V, asr: &Asr, sym: SymbolId) {
    match asr.symbol(sym) {
        Symbol::Program(x) => {
            v.visit_symtab(asr, x.symtab);
            x.body.iter().for_each(|s| v.visit_stmt(asr, *s));
        }
        Symbol::Module(x) => v.visit_symtab(asr, x.symtab),
        Symbol::Function(x) => {
            v.visit_symtab(asr, x.symtab);
            x.args.iter().for_each(|a| v.visit_expr(asr, *a));
            x.body.iter().for_each(|s| v.visit_stmt(asr, *s));
            if let Some(ret) = x.return_var {
                v.visit_expr(asr, ret);
            }
        }
        Symbol::StructType(x) => v.visit_symtab(asr, x.symtab),
        Symbol::Block(x) => {
            v.visit_symtab(asr, x.symtab);
            x.body.iter().for_each(|s| v.visit_stmt(asr, *s));
        }
        Symbol::Variable(x) => {
            v.visit_ttype(asr, &x.ty);
            if let Some(e) = x.symbolic_value {
                v.visit_expr(asr, e);
            }
            if let Some(e) = x.value {
                v.visit_expr(asr, e);
            }
        }
        Symbol::GenericProcedure(_) | Symbol::ExternalSymbol(_) | Symbol::ClassProcedure(_) => {}
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, asr: &Asr, stmt: StmtId) {
    let kind = &asr.stmt(stmt).kind;
    for expr in kind.exprs() {
        v.visit_expr(asr, expr);
    }
    for body in kind.bodies() {
        body.iter().for_each(|s| v.visit_stmt(asr, *s));
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, asr: &Asr, expr: ExprId) {
    let kind = &asr.expr(expr).kind;
    for child in kind.children() {
        v.visit_expr(asr, child);
    }
    if let Some(ty) = kind.ty() {
        v.visit_ttype(asr, ty);
    }
}

pub fn walk_ttype<V: Visitor + ?Sized>(v: &mut V, asr: &Asr, ty: &Ttype) {
    for expr in ty.dim_exprs() {
        v.visit_expr(asr, expr);
    }
}

/// Every expression reachable from the translation unit, in visiting order.
pub fn reachable_exprs(asr: &Asr) -> Vec<ExprId> {
    struct Collect(Vec<ExprId>);

    impl Visitor for Collect {
        fn visit_expr(&mut self, asr: &Asr, expr: ExprId) {
            self.0.push(expr);
            walk_expr(self, asr, expr)
        }
    }

    let mut collect = Collect(Vec::new());
    walk_unit(&mut collect, asr);
    collect.0
}
