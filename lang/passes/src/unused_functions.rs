//! Removes functions that cannot be reached from a program, from the public interface of
//! a module or from a module-level initializer.

use lasr_lang_asr::visit::{Visitor, walk_expr, walk_stmt, walk_ttype};
use lasr_lang_asr::{
    Access, Asr, ExprId, ExprKind, HashSet, Item, StmtId, StmtKind, Symbol, SymbolId, SymtabId,
    Ttype,
};

use crate::options::PassOptions;
use crate::result::PassResult;

pub fn unused_functions(asr: &mut Asr, _options: &PassOptions) -> PassResult {
    loop {
        let removed = sweep(asr);
        if removed == 0 {
            return Ok(());
        }
        log::debug!("Removed {removed} unused procedures");
    }
}

/// Symbols referenced from expressions, statements and types.
#[derive(Default)]
struct Refs(Vec<SymbolId>);

impl Visitor for Refs {
    fn visit_stmt(&mut self, asr: &Asr, stmt: StmtId) {
        match asr.stmt(stmt).kind {
            StmtKind::SubroutineCall { name, original_name, .. } => {
                self.0.push(name);
                self.0.extend(original_name);
            }
            StmtKind::BlockCall { m, .. } => self.0.push(m),
            _ => {}
        }
        walk_stmt(self, asr, stmt)
    }

    fn visit_expr(&mut self, asr: &Asr, expr: ExprId) {
        match asr.expr(expr).kind {
            ExprKind::Var { sym } => self.0.push(sym),
            ExprKind::FunctionCall { name, original_name, .. } => {
                self.0.push(name);
                self.0.extend(original_name);
            }
            ExprKind::StructConstructor { dt_sym, .. } => self.0.push(dt_sym),
            ExprKind::StructInstanceMember { member, .. } => self.0.push(member),
            _ => {}
        }
        walk_expr(self, asr, expr)
    }

    fn visit_ttype(&mut self, asr: &Asr, ty: &Ttype) {
        if let Ttype::Struct { derived_type } = ty.past_array() {
            self.0.push(*derived_type);
        }
        walk_ttype(self, asr, ty)
    }
}

/// The symbols `sym` needs to be kept alive. Nested procedures are not included: they
/// are kept only if something calls them.
fn direct_refs(asr: &Asr, sym: SymbolId) -> Vec<SymbolId> {
    let mut refs = Refs::default();
    let variables_of = |symtab: SymtabId| {
        asr.symtab(symtab)
            .symbols()
            .into_iter()
            .filter(move |s| matches!(asr.symbol(*s), Symbol::Variable(_)))
    };
    match asr.symbol(sym) {
        Symbol::Program(p) => {
            refs.0.extend(variables_of(p.symtab));
            p.body.iter().for_each(|s| refs.visit_stmt(asr, *s));
        }
        Symbol::Function(f) => {
            refs.0.extend(variables_of(f.symtab));
            f.args.iter().chain(&f.return_var).for_each(|e| refs.visit_expr(asr, *e));
            f.body.iter().for_each(|s| refs.visit_stmt(asr, *s));
        }
        Symbol::Block(b) => {
            refs.0.extend(variables_of(b.symtab));
            b.body.iter().for_each(|s| refs.visit_stmt(asr, *s));
        }
        Symbol::Variable(v) => {
            refs.visit_ttype(asr, &v.ty);
            v.symbolic_value.iter().chain(&v.value).for_each(|e| refs.visit_expr(asr, *e));
        }
        Symbol::ExternalSymbol(e) => refs.0.extend(e.external),
        Symbol::GenericProcedure(g) => refs.0.extend(&g.procs),
        Symbol::ClassProcedure(c) => refs.0.push(c.proc),
        Symbol::StructType(st) => {
            refs.0.extend(asr.symtab(st.symtab).symbols());
            refs.0.extend(st.parent);
        }
        Symbol::Module(_) => {}
    }
    refs.0
}

fn is_private(symbol: &Symbol) -> bool {
    let access = match symbol {
        Symbol::Function(f) => f.access,
        Symbol::Variable(v) => v.access,
        Symbol::GenericProcedure(g) => g.access,
        Symbol::StructType(st) => st.access,
        Symbol::ExternalSymbol(e) => e.access,
        _ => Access::Public,
    };
    access == Access::Private
}

fn roots(asr: &Asr) -> Vec<SymbolId> {
    let global = asr.symtab(asr.global_scope()).symbols();
    let has_program = global.iter().any(|s| matches!(asr.symbol(*s), Symbol::Program(_)));
    let mut roots = Vec::new();
    for sym in global {
        match asr.symbol(sym) {
            Symbol::Module(m) => {
                roots.extend(asr.symtab(m.symtab).symbols().into_iter().filter(|s| {
                    let symbol = asr.symbol(*s);
                    !is_private(symbol) || matches!(symbol, Symbol::Variable(_))
                }));
            }
            // a unit without a program is a library of external procedures
            Symbol::Function(_) if !has_program => roots.push(sym),
            Symbol::Function(_) => {}
            _ => roots.push(sym),
        }
    }

    let mut refs = Refs::default();
    for item in &asr.unit.items {
        match item {
            Item::Stmt(stmt) => refs.visit_stmt(asr, *stmt),
            Item::Expr(expr) => refs.visit_expr(asr, *expr),
        }
    }
    roots.extend(refs.0);
    roots
}

fn reachable(asr: &Asr) -> HashSet<SymbolId> {
    let mut seen = HashSet::default();
    let mut work = roots(asr);
    while let Some(sym) = work.pop() {
        if seen.insert(sym) {
            work.extend(direct_refs(asr, sym));
        }
    }
    seen
}

/// Remove every unreachable function and the unreachable symbols referring to one.
fn sweep(asr: &mut Asr) -> usize {
    let alive = reachable(asr);
    let all = asr.symbols_in(asr.global_scope());
    let dead_functions: HashSet<SymbolId> = all
        .iter()
        .copied()
        .filter(|s| !alive.contains(s) && matches!(asr.symbol(*s), Symbol::Function(_)))
        .collect();
    if dead_functions.is_empty() {
        return 0;
    }

    let dangling = |sym: SymbolId| -> bool {
        match asr.symbol(sym) {
            Symbol::ExternalSymbol(e) => e.external.is_some_and(|t| dead_functions.contains(&t)),
            Symbol::GenericProcedure(g) => g.procs.iter().any(|p| dead_functions.contains(p)),
            Symbol::ClassProcedure(c) => dead_functions.contains(&c.proc),
            _ => false,
        }
    };
    let doomed: Vec<SymbolId> = all
        .iter()
        .copied()
        .filter(|s| dead_functions.contains(s) || (!alive.contains(s) && dangling(*s)))
        .collect();

    let mut removed = 0;
    for sym in doomed {
        let name = asr.symbol(sym).name().to_owned();
        let Some(parent) = asr.parent_symtab(sym) else {
            continue;
        };
        if asr.symtab(parent).get(&name) == Some(sym) {
            log::trace!("Removing unused `{name}`");
            asr.symtab_mut(parent).erase(&name);
            removed += 1;
        }
    }
    removed
}
